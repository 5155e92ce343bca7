pub mod guardian;
pub mod ledger;
pub mod payout;
pub mod split;

use crate::domain::Environment;
use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerHealth {
    pub transactions: usize,
    pub environment: Environment,
    pub split_percentage: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ledger: LedgerHealth,
    pub paypal: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = {
        let ledger = state.ledger.read().await;
        LedgerHealth {
            transactions: ledger.len(),
            environment: ledger.environment(),
            split_percentage: ledger.split_percentage(),
        }
    };

    // circuit state only, no upstream call
    let paypal = match &state.payouts {
        Some(service) => service.client().circuit_state(),
        None => "not_configured".to_string(),
    };

    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        ledger,
        paypal,
    })
}
