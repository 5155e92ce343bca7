use axum::{extract::State, response::IntoResponse, Json};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::calculate_split;
use crate::domain::split::validate_percentage;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub amount: BigDecimal,
    pub percentage: Option<i64>,
}

fn resolve_percentage(percentage: Option<i64>, default: u8) -> Result<u8, AppError> {
    match percentage {
        None => Ok(default),
        Some(value) => {
            let value = u32::try_from(value).map_err(|_| {
                AppError::Validation(format!(
                    "percentage must be between 0 and 100, got {}",
                    value
                ))
            })?;
            Ok(validate_percentage(value)?)
        }
    }
}

/// Previews a split; defaults to the ledger's configured percentage.
pub async fn preview_split(
    State(state): State<AppState>,
    Json(payload): Json<SplitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let default = state.ledger.read().await.split_percentage();
    let percentage = resolve_percentage(payload.percentage, default)?;

    Ok(Json(calculate_split(&payload.amount, percentage)?))
}
