use anyhow::Context;
use dotenvy::dotenv;
use std::env;

use crate::domain::split::{validate_percentage, DEFAULT_SPLIT_PERCENTAGE};
use crate::domain::Environment;

pub const DEFAULT_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
pub const DEFAULT_LIVE_URL: &str = "https://api-m.paypal.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub mode: Environment,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub sandbox_url: String,
    pub live_url: String,
}

impl PayPalConfig {
    pub fn base_url(&self) -> &str {
        match self.mode {
            Environment::Live => &self.live_url,
            Environment::Sandbox => &self.sandbox_url,
        }
    }

    /// `(client_id, client_secret)` when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub ledger_environment: Environment,
    pub split_percentage: u8,
    pub paypal: PayPalConfig,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub ledger_admin_enabled: bool,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server_port = get("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid port number")?;
        if server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }

        let paypal_mode = match get("PAYPAL_MODE") {
            Some(raw) => parse_environment("PAYPAL_MODE", &raw)?,
            None => Environment::Sandbox,
        };

        let ledger_environment = match get("LEDGER_ENVIRONMENT").or_else(|| get("PAYPAL_MODE")) {
            Some(raw) => parse_environment("LEDGER_ENVIRONMENT", &raw)?,
            None => Environment::Live,
        };

        let split_percentage = match get("IMPACT_SPLIT_PERCENTAGE") {
            Some(raw) => {
                let value: u32 = raw
                    .trim()
                    .parse()
                    .context("IMPACT_SPLIT_PERCENTAGE must be an integer between 0 and 100")?;
                validate_percentage(value).context("IMPACT_SPLIT_PERCENTAGE is out of range")?
            }
            None => DEFAULT_SPLIT_PERCENTAGE,
        };

        let sandbox_url = get("PAYPAL_SANDBOX_URL").unwrap_or_else(|| DEFAULT_SANDBOX_URL.to_string());
        let live_url = get("PAYPAL_LIVE_URL").unwrap_or_else(|| DEFAULT_LIVE_URL.to_string());
        url::Url::parse(&sandbox_url).context("PAYPAL_SANDBOX_URL is not a valid URL")?;
        url::Url::parse(&live_url).context("PAYPAL_LIVE_URL is not a valid URL")?;

        let paypal = PayPalConfig {
            mode: paypal_mode,
            client_id: get("PAYPAL_CLIENT_ID_PAYOUT").or_else(|| get("PAYPAL_CLIENT_ID")),
            client_secret: get("PAYPAL_CLIENT_SECRET_PAYOUT").or_else(|| get("PAYPAL_CLIENT_SECRET")),
            sandbox_url,
            live_url,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect()
        });

        let ledger_admin_enabled = get("LEDGER_ADMIN_ENABLED")
            .map(|raw| raw.parse::<bool>())
            .transpose()
            .context("LEDGER_ADMIN_ENABLED must be true or false")?
            .unwrap_or(false);

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Config {
            server_port,
            ledger_environment,
            split_percentage,
            paypal,
            cors_allowed_origins,
            ledger_admin_enabled,
            log_format,
        })
    }
}

fn parse_environment(key: &str, raw: &str) -> anyhow::Result<Environment> {
    raw.parse::<Environment>()
        .map_err(|e| anyhow::anyhow!("{} is invalid: {}", key, e))
}
