use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::guardian::{respond, GuardianEvent, MessageContext};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GuardianParams {
    pub variant: Option<usize>,
    pub pid: Option<u32>,
    pub amount: Option<BigDecimal>,
    pub credits: Option<u64>,
}

pub async fn guardian_message(
    State(state): State<AppState>,
    Path(event): Path<String>,
    Query(params): Query<GuardianParams>,
) -> Result<impl IntoResponse, AppError> {
    let event = event.parse::<GuardianEvent>().map_err(AppError::NotFound)?;
    let variant = params
        .variant
        .unwrap_or_else(|| Utc::now().timestamp_subsec_nanos() as usize);
    let context = MessageContext {
        pid: params.pid,
        amount: params.amount,
        credits: params.credits,
        split_percentage: Some(state.ledger.read().await.split_percentage()),
    };

    Ok(Json(respond(event, variant, &context)))
}
