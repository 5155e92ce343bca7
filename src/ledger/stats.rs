use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Environment, Transaction};

/// Aggregates are reported in one currency; no conversion is performed.
pub const REPORTING_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_transactions: usize,
    pub total_original_amount: BigDecimal,
    pub total_impact_amount: BigDecimal,
    pub total_recipient_amount: BigDecimal,
    pub split_percentage: u8,
    pub currency: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatus {
    pub stats: LedgerStats,
    pub recent_transactions: Vec<Transaction>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub total_impact_generated: BigDecimal,
    pub transaction_count: usize,
    pub average_impact_per_transaction: BigDecimal,
    pub environment: Environment,
}
