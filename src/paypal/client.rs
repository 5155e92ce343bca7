use base64::Engine;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::Environment;

#[derive(Error, Debug)]
pub enum PayPalError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("PayPal returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Invalid response from PayPal: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

/// OAuth2 client-credentials response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutAmount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutItem {
    pub recipient_type: String,
    pub amount: PayoutAmount,
    pub receiver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub sender_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderBatchHeader {
    pub sender_batch_id: String,
    pub email_subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutBatch {
    pub sender_batch_header: SenderBatchHeader,
    pub items: Vec<PayoutItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchHeader {
    pub payout_batch_id: String,
    pub batch_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_batch_header: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub batch_header: BatchHeader,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionCheck {
    pub success: bool,
    pub message: String,
    pub mode: Environment,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// HTTP client for the PayPal Payouts API
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    mode: Environment,
    token: Arc<RwLock<Option<CachedToken>>>,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PayPalClient {
    pub fn new(base_url: String, client_id: String, client_secret: String, mode: Environment) -> Self {
        Self::with_circuit_breaker(base_url, client_id, client_secret, mode, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        client_id: String,
        client_secret: String,
        mode: Environment,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            mode,
            token: Arc::new(RwLock::new(None)),
            circuit_breaker,
        }
    }

    pub fn mode(&self) -> Environment {
        self.mode
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    /// Cached until 90% of the advertised lifetime has passed.
    pub async fn access_token(&self) -> Result<String, PayPalError> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Authentication(format!("{} - {}", status, body)));
        }

        let auth = response
            .json::<AuthResponse>()
            .await
            .map_err(|e| PayPalError::InvalidResponse(e.to_string()))?;

        let lifetime = Duration::from_millis(auth.expires_in.saturating_mul(900));
        *self.token.write().await = Some(CachedToken {
            access_token: auth.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(mode = %self.mode, expires_in = auth.expires_in, "PayPal access token refreshed");
        Ok(auth.access_token)
    }

    pub async fn test_connection(&self) -> ConnectionCheck {
        match self.access_token().await {
            Ok(_) => ConnectionCheck {
                success: true,
                message: "Successfully connected to PayPal API".to_string(),
                mode: self.mode,
            },
            Err(e) => ConnectionCheck {
                success: false,
                message: e.to_string(),
                mode: self.mode,
            },
        }
    }

    /// Submits a payout batch and returns the upstream acknowledgement.
    pub async fn create_payout(&self, batch: &PayoutBatch) -> Result<PayoutResponse, PayPalError> {
        self.guarded(async {
            let token = self.access_token().await?;
            let response = self
                .client
                .post(format!("{}/v1/payments/payouts", self.base_url))
                .bearer_auth(token)
                .json(batch)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(upstream_error(response).await);
            }

            response
                .json::<PayoutResponse>()
                .await
                .map_err(|e| PayPalError::InvalidResponse(e.to_string()))
        })
        .await
    }

    pub async fn get_payout_status(&self, payout_batch_id: &str) -> Result<serde_json::Value, PayPalError> {
        self.guarded(async {
            let token = self.access_token().await?;
            let response = self
                .client
                .get(format!("{}/v1/payments/payouts/{}", self.base_url, payout_batch_id))
                .bearer_auth(token)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(upstream_error(response).await);
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| PayPalError::InvalidResponse(e.to_string()))
        })
        .await
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, PayPalError>
    where
        F: Future<Output = Result<T, PayPalError>>,
    {
        match self.circuit_breaker.call(call).await {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(PayPalError::CircuitBreakerOpen(
                "PayPal API circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

async fn upstream_error(response: reqwest::Response) -> PayPalError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    PayPalError::Upstream { status, body }
}
