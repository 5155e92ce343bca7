use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    calculate_split, ImpactSplit, Metadata, NewTransaction, Transaction, TransactionKind,
    TransactionStatus,
};
use crate::error::AppError;
use crate::ledger::SharedLedger;
use crate::paypal::{PayPalClient, PayoutAmount, PayoutBatch, PayoutItem, PayoutResponse, SenderBatchHeader};

pub const DEFAULT_CURRENCY: &str = "USD";
const EMAIL_SUBJECT: &str = "You have a payout!";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRecipient {
    pub email: String,
    pub amount: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PayoutRequest {
    Single {
        recipient: String,
        amount: BigDecimal,
        #[serde(default)]
        currency: Option<String>,
        #[serde(default)]
        note: Option<String>,
    },
    Batch {
        recipients: Vec<BatchRecipient>,
        #[serde(default)]
        currency: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct PayoutOutcome {
    pub transaction: Transaction,
    pub impact_split: ImpactSplit,
    pub response: PayoutResponse,
}

/// Sends payouts upstream and records the confirmed split in the ledger.
#[derive(Clone)]
pub struct PayoutService {
    client: PayPalClient,
    ledger: SharedLedger,
}

impl PayoutService {
    pub fn new(client: PayPalClient, ledger: SharedLedger) -> Self {
        Self { client, ledger }
    }

    pub fn client(&self) -> &PayPalClient {
        &self.client
    }

    pub async fn execute(&self, request: PayoutRequest) -> Result<PayoutOutcome, AppError> {
        match request {
            PayoutRequest::Single {
                recipient,
                amount,
                currency,
                note,
            } => {
                self.single_payout(recipient, amount, currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()), note)
                    .await
            }
            PayoutRequest::Batch {
                recipients,
                currency,
            } => {
                self.batch_payout(recipients, currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
                    .await
            }
        }
    }

    /// The recipient is paid the recipient share of `amount`.
    pub async fn single_payout(
        &self,
        recipient: String,
        amount: BigDecimal,
        currency: String,
        note: Option<String>,
    ) -> Result<PayoutOutcome, AppError> {
        if recipient.trim().is_empty() {
            return Err(AppError::Validation(
                "recipient and amount are required for single payout".to_string(),
            ));
        }
        ensure_positive(&amount)?;

        let percentage = self.ledger.read().await.split_percentage();
        let split = calculate_split(&amount, percentage)?;
        let stamp = Utc::now().timestamp_millis();

        let batch = PayoutBatch {
            sender_batch_header: SenderBatchHeader {
                sender_batch_id: batch_id("IMPACT"),
                email_subject: EMAIL_SUBJECT.to_string(),
                email_message: Some(
                    note.clone()
                        .unwrap_or_else(|| "You have received a payout.".to_string()),
                ),
            },
            items: vec![PayoutItem {
                recipient_type: "EMAIL".to_string(),
                amount: PayoutAmount {
                    value: split.recipient_amount.with_scale(2).to_string(),
                    currency: currency.clone(),
                },
                receiver: recipient.clone(),
                note: Some(note.clone().unwrap_or_else(|| "Payout".to_string())),
                sender_item_id: format!("ITEM_{}", stamp),
            }],
        };

        let response = self.client.create_payout(&batch).await?;

        let mut metadata = Metadata::new();
        metadata.insert("note".to_string(), json!(note));
        metadata.insert("upstreamResponse".to_string(), to_json(&response)?);

        let transaction = self
            .record_completed(&split, currency, recipient, &response, metadata)
            .await;

        Ok(PayoutOutcome {
            transaction,
            impact_split: split,
            response,
        })
    }

    /// Each item pays its own recipient share; the ledger records one entry
    /// carrying the sum of the item splits that were sent upstream.
    pub async fn batch_payout(
        &self,
        recipients: Vec<BatchRecipient>,
        currency: String,
    ) -> Result<PayoutOutcome, AppError> {
        if recipients.is_empty() {
            return Err(AppError::Validation(
                "recipients array is required for batch payout".to_string(),
            ));
        }

        let percentage = self.ledger.read().await.split_percentage();
        let stamp = Utc::now().timestamp_millis();
        let mut items = Vec::with_capacity(recipients.len());
        let mut total = BigDecimal::from(0);
        let mut impact_total = BigDecimal::from(0);
        let mut recipient_total = BigDecimal::from(0);

        for (index, recipient) in recipients.iter().enumerate() {
            if recipient.email.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "recipients[{}].email must not be empty",
                    index
                )));
            }
            ensure_positive(&recipient.amount)?;

            let split = calculate_split(&recipient.amount, percentage)?;
            total = total + &recipient.amount;
            impact_total = impact_total + &split.impact_amount;
            recipient_total = recipient_total + &split.recipient_amount;
            items.push(PayoutItem {
                recipient_type: "EMAIL".to_string(),
                amount: PayoutAmount {
                    value: split.recipient_amount.with_scale(2).to_string(),
                    currency: currency.clone(),
                },
                receiver: recipient.email.clone(),
                note: Some(
                    recipient
                        .note
                        .clone()
                        .unwrap_or_else(|| "Batch Payout".to_string()),
                ),
                sender_item_id: format!("BATCH_ITEM_{}_{}", stamp, index),
            });
        }

        let batch = PayoutBatch {
            sender_batch_header: SenderBatchHeader {
                sender_batch_id: batch_id("IMPACT_BATCH"),
                email_subject: EMAIL_SUBJECT.to_string(),
                email_message: Some("You have received a batch payout.".to_string()),
            },
            items,
        };

        let response = self.client.create_payout(&batch).await?;
        let split = ImpactSplit {
            original_amount: total,
            impact_amount: impact_total,
            recipient_amount: recipient_total,
            percentage,
        };

        let mut metadata = Metadata::new();
        metadata.insert("recipients".to_string(), to_json(&recipients)?);
        metadata.insert("upstreamResponse".to_string(), to_json(&response)?);

        let transaction = self
            .record_completed(
                &split,
                currency,
                format!("Batch: {} recipients", recipients.len()),
                &response,
                metadata,
            )
            .await;

        Ok(PayoutOutcome {
            transaction,
            impact_split: split,
            response,
        })
    }

    async fn record_completed(
        &self,
        split: &ImpactSplit,
        currency: String,
        recipient: String,
        response: &PayoutResponse,
        metadata: Metadata,
    ) -> Transaction {
        let input = NewTransaction::new(
            TransactionKind::Payout,
            split.original_amount.clone(),
            split.impact_amount.clone(),
            split.recipient_amount.clone(),
            currency,
        )
        .with_recipient(recipient)
        .with_external_batch_id(response.batch_header.payout_batch_id.clone())
        .with_metadata(metadata);

        let mut ledger = self.ledger.write().await;
        let recorded = ledger.record_transaction(input);
        if !recorded.split_is_consistent() {
            tracing::warn!(
                transaction_id = %recorded.id,
                original = %recorded.original_amount,
                impact = %recorded.impact_amount,
                recipient = %recorded.recipient_amount,
                "Recorded split does not add up to the original amount"
            );
        }

        let completed = ledger
            .update_transaction_status(recorded.id, TransactionStatus::Completed, None)
            .unwrap_or(recorded);

        tracing::info!(
            transaction_id = %completed.id,
            payout_batch_id = %response.batch_header.payout_batch_id,
            original = %completed.original_amount,
            impact = %completed.impact_amount,
            "Payout recorded in ledger"
        );

        completed
    }
}

fn ensure_positive(amount: &BigDecimal) -> Result<(), AppError> {
    if *amount <= BigDecimal::from(0) {
        return Err(AppError::Validation(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    Ok(())
}

fn batch_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), &suffix[..9])
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}
