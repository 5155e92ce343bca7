pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod guardian;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod paypal;
pub mod services;

use axum::{
    Router,
    routing::{get, patch, post},
};
use std::time::Instant;

use crate::config::Config;
use crate::ledger::{Ledger, SharedLedger};
use crate::paypal::PayPalClient;
use crate::services::PayoutService;

#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub payouts: Option<PayoutService>,
    pub admin_enabled: bool,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(ledger: SharedLedger, payouts: Option<PayoutService>, admin_enabled: bool) -> Self {
        Self {
            ledger,
            payouts,
            admin_enabled,
            start_time: Instant::now(),
        }
    }

    /// Payouts stay disabled when no PayPal credentials are configured.
    pub fn from_config(config: &Config) -> Self {
        let ledger = Ledger::new(config.ledger_environment, config.split_percentage).shared();

        let payouts = config.paypal.credentials().map(|(client_id, client_secret)| {
            let client = PayPalClient::new(
                config.paypal.base_url().to_string(),
                client_id.to_string(),
                client_secret.to_string(),
                config.paypal.mode,
            );
            PayoutService::new(client, ledger.clone())
        });

        Self::new(ledger, payouts, config.ledger_admin_enabled)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/ledger/status",
            get(handlers::ledger::get_status).post(handlers::ledger::post_status),
        )
        .route("/api/ledger/impact", get(handlers::ledger::impact_summary))
        .route(
            "/api/ledger/transactions",
            get(handlers::ledger::list_transactions).delete(handlers::ledger::clear_transactions),
        )
        .route("/api/ledger/transactions/:id", get(handlers::ledger::get_transaction))
        .route(
            "/api/ledger/transactions/:id/status",
            patch(handlers::ledger::update_status),
        )
        .route("/api/ledger/export", get(handlers::ledger::export_transactions))
        .route("/api/ledger/import", post(handlers::ledger::import_transactions))
        .route("/api/split", post(handlers::split::preview_split))
        .route("/api/paypal/payout", post(handlers::payout::create_payout))
        .route("/api/paypal/payout/:batch_id", get(handlers::payout::payout_status))
        .route("/api/test-connection", get(handlers::payout::test_connection))
        .route("/api/guardian/:event", get(handlers::guardian::guardian_message))
        .layer(axum::middleware::from_fn(middleware::request_logger_middleware))
        .with_state(state)
}
