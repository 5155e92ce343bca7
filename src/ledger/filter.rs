use chrono::{DateTime, Utc};

use crate::domain::{Environment, Transaction, TransactionKind, TransactionStatus};

/// Conjunction of optional predicates over ledger entries.
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub environment: Option<Environment>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Inclusive range bounds on `timestamp`.
    pub fn between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.kind.map_or(true, |kind| tx.kind == kind)
            && self.status.map_or(true, |status| tx.status == status)
            && self.environment.map_or(true, |env| tx.environment == env)
            && self.start.map_or(true, |start| tx.timestamp >= start)
            && self.end.map_or(true, |end| tx.timestamp <= end)
    }
}
