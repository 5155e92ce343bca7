//! In-memory transaction ledger.
//!
//! Keeps every split transaction for the lifetime of the process and answers
//! filtered, aggregated and recency-ordered queries over them. The ledger never
//! logs; callers decide how to present results and errors.

pub mod error;
pub mod filter;
pub mod stats;

use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    round2, Environment, Metadata, NewTransaction, Transaction, TransactionStatus,
    DEFAULT_SPLIT_PERCENTAGE,
};

pub use error::{LedgerError, LedgerResult};
pub use filter::TransactionFilter;
pub use stats::{ImpactSummary, LedgerStats, LedgerStatus, REPORTING_CURRENCY};

pub const DEFAULT_STATUS_LIMIT: usize = 10;

/// Ledger shared between request handlers.
pub type SharedLedger = Arc<RwLock<Ledger>>;

#[derive(Debug, Clone)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    environment: Environment,
    split_percentage: u8,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Environment::Live, DEFAULT_SPLIT_PERCENTAGE)
    }
}

impl Ledger {
    pub fn new(environment: Environment, split_percentage: u8) -> Self {
        Self {
            transactions: Vec::new(),
            environment,
            split_percentage,
        }
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn split_percentage(&self) -> u8 {
        self.split_percentage
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Appends a pending entry stamped with this ledger's percentage and
    /// environment. Amounts are stored exactly as given.
    pub fn record_transaction(&mut self, input: NewTransaction) -> Transaction {
        let tx = Transaction::new(input, self.split_percentage, self.environment);
        self.transactions.push(tx.clone());
        tx
    }

    /// Returns `None` when no entry has this id.
    pub fn update_transaction_status(
        &mut self,
        id: Uuid,
        status: TransactionStatus,
        metadata_patch: Option<Metadata>,
    ) -> Option<Transaction> {
        let tx = self.transactions.iter_mut().find(|t| t.id == id)?;
        tx.status = status;
        if let Some(patch) = metadata_patch {
            tx.merge_metadata(patch);
        }
        Some(tx.clone())
    }

    pub fn get_transaction(&self, id: Uuid) -> Option<Transaction> {
        self.transactions.iter().find(|t| t.id == id).cloned()
    }

    /// Matching entries in insertion order.
    pub fn get_transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Matching entries, newest first. Entries sharing a timestamp are ordered
    /// by reverse insertion.
    pub fn get_recent_transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let mut recent: Vec<Transaction> = self
            .transactions
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent
    }

    pub fn get_status(
        &self,
        limit: usize,
        environment: Option<Environment>,
    ) -> LedgerResult<LedgerStatus> {
        if limit == 0 {
            return Err(LedgerError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }

        let filter = TransactionFilter {
            environment,
            ..TransactionFilter::default()
        };
        let mut recent = self.get_recent_transactions(&filter);
        let stats = self.compute_stats(&recent);
        recent.truncate(limit);

        Ok(LedgerStatus {
            stats,
            recent_transactions: recent,
            last_updated: Utc::now(),
        })
    }

    /// Sums are rounded once, after accumulation.
    pub fn compute_stats(&self, transactions: &[Transaction]) -> LedgerStats {
        let zero = BigDecimal::from(0);
        let (original, impact, recipient) = transactions.iter().fold(
            (zero.clone(), zero.clone(), zero),
            |(original, impact, recipient), tx| {
                (
                    original + &tx.original_amount,
                    impact + &tx.impact_amount,
                    recipient + &tx.recipient_amount,
                )
            },
        );

        LedgerStats {
            total_transactions: transactions.len(),
            total_original_amount: round2(&original),
            total_impact_amount: round2(&impact),
            total_recipient_amount: round2(&recipient),
            split_percentage: self.split_percentage,
            currency: REPORTING_CURRENCY.to_string(),
            environment: self.environment,
        }
    }

    pub fn get_impact_summary(&self) -> ImpactSummary {
        let stats = self.compute_stats(&self.transactions);
        let average = if stats.total_transactions > 0 {
            round2(
                &(&stats.total_impact_amount / BigDecimal::from(stats.total_transactions as u64)),
            )
        } else {
            round2(&BigDecimal::from(0))
        };

        ImpactSummary {
            total_impact_generated: stats.total_impact_amount,
            transaction_count: stats.total_transactions,
            average_impact_per_transaction: average,
            environment: self.environment,
        }
    }

    /// Destructive: drops every entry, or only those of `environment`.
    /// Returns how many entries were removed.
    pub fn clear_transactions(&mut self, environment: Option<Environment>) -> usize {
        let before = self.transactions.len();
        match environment {
            Some(env) => self.transactions.retain(|t| t.environment != env),
            None => self.transactions.clear(),
        }
        before - self.transactions.len()
    }

    pub fn export_transactions(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string_pretty(&self.transactions)?)
    }

    /// Replaces the ledger contents with the exported entries in `data`.
    /// On any error the current contents are left as they were.
    pub fn import_transactions(&mut self, data: &str) -> LedgerResult<usize> {
        let imported: Vec<Transaction> =
            serde_json::from_str(data).map_err(|e| LedgerError::Import(e.to_string()))?;

        let mut seen = HashSet::with_capacity(imported.len());
        if let Some(duplicate) = imported.iter().find(|t| !seen.insert(t.id)) {
            return Err(LedgerError::Import(format!(
                "duplicate transaction id {}",
                duplicate.id
            )));
        }

        let count = imported.len();
        self.transactions = imported;
        Ok(count)
    }
}
