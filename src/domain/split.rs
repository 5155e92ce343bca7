//! Impact split calculation.
//! Divides a gross amount into an impact share and a recipient share.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SPLIT_PERCENTAGE: u8 = 19;
pub const MAX_SPLIT_PERCENTAGE: u8 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(String),

    #[error("amount must not have more than two decimal places, got {0}")]
    SubCentAmount(String),

    #[error("percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(u32),
}

/// Result of splitting one gross amount.
///
/// `impact_amount + recipient_amount == original_amount` always holds: amounts
/// finer than a cent are rejected and the recipient share is derived from the
/// already rounded impact share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSplit {
    pub original_amount: BigDecimal,
    pub impact_amount: BigDecimal,
    pub recipient_amount: BigDecimal,
    pub percentage: u8,
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: &BigDecimal) -> BigDecimal {
    let hundred = BigDecimal::from(100);
    let scaled = value * &hundred;
    let truncated = scaled.with_scale(0);
    let remainder = (&scaled - &truncated).abs();

    let rounded = if remainder * BigDecimal::from(2) >= BigDecimal::from(1) {
        if scaled < BigDecimal::from(0) {
            truncated - BigDecimal::from(1)
        } else {
            truncated + BigDecimal::from(1)
        }
    } else {
        truncated
    };

    (rounded / hundred).with_scale(2)
}

/// Validates a percentage coming from configuration or a request.
pub fn validate_percentage(percentage: u32) -> Result<u8, SplitError> {
    if percentage > MAX_SPLIT_PERCENTAGE as u32 {
        return Err(SplitError::PercentageOutOfRange(percentage));
    }
    Ok(percentage as u8)
}

pub fn calculate_split(amount: &BigDecimal, percentage: u8) -> Result<ImpactSplit, SplitError> {
    if *amount < BigDecimal::from(0) {
        return Err(SplitError::NegativeAmount(amount.to_string()));
    }
    if round2(amount) != *amount {
        return Err(SplitError::SubCentAmount(amount.to_string()));
    }
    let percentage = validate_percentage(percentage as u32)?;

    let impact_amount = round2(&(amount * BigDecimal::from(percentage) / BigDecimal::from(100)));
    let recipient_amount = round2(&(amount - &impact_amount));

    Ok(ImpactSplit {
        original_amount: amount.clone(),
        impact_amount,
        recipient_amount,
        percentage,
    })
}
