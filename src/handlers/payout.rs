use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::ImpactSplit;
use crate::error::AppError;
use crate::paypal::PayoutResponse;
use crate::services::{PayoutRequest, PayoutService};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutApiResponse {
    pub success: bool,
    pub message: String,
    pub data: PayoutResponse,
    pub transaction_id: Uuid,
    pub impact_split: ImpactSplit,
}

fn payout_service(state: &AppState) -> Result<&PayoutService, AppError> {
    state.payouts.as_ref().ok_or_else(|| {
        AppError::Unavailable("PayPal credentials are not configured".to_string())
    })
}

pub async fn create_payout(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let request: PayoutRequest = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid payout request: {}", e)))?;
    let message = match request {
        PayoutRequest::Single { .. } => "Payout created successfully",
        PayoutRequest::Batch { .. } => "Batch payout created successfully",
    };

    let outcome = payout_service(&state)?.execute(request).await?;

    Ok(Json(PayoutApiResponse {
        success: true,
        message: message.to_string(),
        data: outcome.response,
        transaction_id: outcome.transaction.id,
        impact_split: outcome.impact_split,
    }))
}

pub async fn payout_status(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = payout_service(&state)?
        .client()
        .get_payout_status(&batch_id)
        .await?;
    Ok(Json(status))
}

pub async fn test_connection(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let check = payout_service(&state)?.client().test_connection().await;
    if !check.success {
        tracing::warn!(mode = %check.mode, message = %check.message, "PayPal connection test failed");
    }
    Ok(Json(check))
}
