//! Transaction domain entity.
//! Framework-agnostic record of one split-attributed money movement.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Open key-value bag attached to a transaction.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Payout,
    Payment,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

/// Upstream environment that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Live,
}

macro_rules! string_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", $label, other)),
                }
            }
        }
    };
}

string_enum!(TransactionKind, "transaction type", {
    Payout => "payout",
    Payment => "payment",
    Refund => "refund",
});

string_enum!(TransactionStatus, "transaction status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

string_enum!(Environment, "environment", {
    Sandbox => "sandbox",
    Live => "live",
});

/// Caller-supplied fields for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub original_amount: BigDecimal,
    pub impact_amount: BigDecimal,
    pub recipient_amount: BigDecimal,
    pub currency: String,
    pub recipient: Option<String>,
    pub external_batch_id: Option<String>,
    pub metadata: Option<Metadata>,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionKind,
        original_amount: BigDecimal,
        impact_amount: BigDecimal,
        recipient_amount: BigDecimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            original_amount,
            impact_amount,
            recipient_amount,
            currency: currency.into(),
            recipient: None,
            external_batch_id: None,
            metadata: None,
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_external_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.external_batch_id = Some(batch_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub original_amount: BigDecimal,
    pub impact_amount: BigDecimal,
    pub recipient_amount: BigDecimal,
    pub split_percentage: u8,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub environment: Environment,
}

impl Transaction {
    pub fn new(input: NewTransaction, split_percentage: u8, environment: Environment) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: input.kind,
            original_amount: input.original_amount,
            impact_amount: input.impact_amount,
            recipient_amount: input.recipient_amount,
            split_percentage,
            currency: input.currency,
            recipient: input.recipient,
            status: TransactionStatus::Pending,
            external_batch_id: input.external_batch_id,
            metadata: input.metadata,
            environment,
        }
    }

    /// Whether the two split parts add back up to the gross amount.
    pub fn split_is_consistent(&self) -> bool {
        &self.impact_amount + &self.recipient_amount == self.original_amount
    }

    /// Shallow merge; keys in `patch` win.
    pub fn merge_metadata(&mut self, patch: Metadata) {
        match self.metadata.as_mut() {
            Some(existing) => existing.extend(patch),
            None => self.metadata = Some(patch),
        }
    }
}
