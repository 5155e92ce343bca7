use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{Environment, Metadata, Transaction, TransactionStatus};
use crate::error::AppError;
use crate::ledger::{ImpactSummary, LedgerStatus, TransactionFilter, DEFAULT_STATUS_LIMIT};
use crate::AppState;

pub const CONFIRM_CLEAR_HEADER: &str = "x-confirm-clear";

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub limit: Option<i64>,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatusResponse {
    pub success: bool,
    pub message: String,
    pub status: LedgerStatus,
    pub impact_summary: ImpactSummary,
}

#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub mode: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub total: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TransactionStatus,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct ClearParams {
    pub mode: Option<String>,
}

fn resolve_limit(limit: Option<i64>) -> Result<usize, AppError> {
    match limit {
        None => Ok(DEFAULT_STATUS_LIMIT),
        Some(value) if value > 0 => Ok(value as usize),
        Some(value) => Err(AppError::Validation(format!(
            "limit must be a positive integer, got {}",
            value
        ))),
    }
}

fn parse_param<T>(name: &str, value: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = String>,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::BadRequest(format!("Invalid '{}': {}", name, e)))
        })
        .transpose()
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| AppError::BadRequest(format!("Invalid '{}' date: {}", name, e)))
        })
        .transpose()
}

fn ensure_admin(state: &AppState) -> Result<(), AppError> {
    if !state.admin_enabled {
        return Err(AppError::Forbidden(
            "ledger admin endpoints are disabled".to_string(),
        ));
    }
    Ok(())
}

async fn status_response(state: &AppState, params: StatusParams) -> Result<LedgerStatusResponse, AppError> {
    let limit = resolve_limit(params.limit)?;
    let mode = parse_param::<Environment>("mode", params.mode.as_deref())?;

    let ledger = state.ledger.read().await;
    let status = ledger.get_status(limit, mode)?;
    let impact_summary = ledger.get_impact_summary();

    Ok(LedgerStatusResponse {
        success: true,
        message: "Ledger status retrieved successfully".to_string(),
        status,
        impact_summary,
    })
}

pub async fn get_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(status_response(&state, params).await?))
}

pub async fn post_status(
    State(state): State<AppState>,
    Json(params): Json<StatusParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(status_response(&state, params).await?))
}

pub async fn impact_summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.read().await.get_impact_summary())
}

/// Newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = TransactionFilter {
        kind: parse_param("type", params.kind.as_deref())?,
        status: parse_param("status", params.status.as_deref())?,
        environment: parse_param("mode", params.mode.as_deref())?,
        start: parse_date("start", params.start.as_deref())?,
        end: parse_date("end", params.end.as_deref())?,
    };

    let transactions = state.ledger.read().await.get_recent_transactions(&filter);
    Ok(Json(TransactionListResponse {
        total: transactions.len(),
        transactions,
    }))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tx = state
        .ledger
        .read()
        .await
        .get_transaction(id)
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    Ok(Json(tx))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut ledger = state.ledger.write().await;

    if let Some(current) = ledger.get_transaction(id) {
        if current.status.is_terminal() && current.status != payload.status {
            tracing::warn!(
                transaction_id = %id,
                from = %current.status,
                to = %payload.status,
                "Overwriting terminal transaction status"
            );
        }
    }

    let updated = ledger
        .update_transaction_status(id, payload.status, payload.metadata)
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    tracing::info!(transaction_id = %id, status = %updated.status, "Transaction status updated");
    Ok(Json(updated))
}

/// Destructive. Requires the admin flag and an explicit confirmation header.
pub async fn clear_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ClearParams>,
) -> Result<impl IntoResponse, AppError> {
    ensure_admin(&state)?;

    let confirmed = headers
        .get(CONFIRM_CLEAR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false);
    if !confirmed {
        return Err(AppError::BadRequest(format!(
            "clearing the ledger requires the '{}: yes' header",
            CONFIRM_CLEAR_HEADER
        )));
    }

    let mode = parse_param::<Environment>("mode", params.mode.as_deref())?;
    let removed = state.ledger.write().await.clear_transactions(mode);

    tracing::warn!(removed, mode = ?mode, "Ledger transactions cleared");
    Ok(Json(serde_json::json!({ "success": true, "removed": removed })))
}

pub async fn export_transactions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.ledger.read().await.export_transactions()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    ))
}

pub async fn import_transactions(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    ensure_admin(&state)?;

    let imported = state.ledger.write().await.import_transactions(&body)?;

    tracing::info!(imported, "Ledger transactions imported");
    Ok(Json(serde_json::json!({ "success": true, "imported": imported })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None).unwrap(), DEFAULT_STATUS_LIMIT);
        assert_eq!(resolve_limit(Some(3)).unwrap(), 3);
        assert!(matches!(resolve_limit(Some(0)), Err(AppError::Validation(_))));
        assert!(matches!(resolve_limit(Some(-4)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_param() {
        let mode = parse_param::<Environment>("mode", Some("sandbox")).unwrap();
        assert_eq!(mode, Some(Environment::Sandbox));
        assert!(parse_param::<Environment>("mode", None).unwrap().is_none());
        assert!(matches!(
            parse_param::<Environment>("mode", Some("prod")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_date() {
        let parsed = parse_date("start", Some("2024-01-02T03:04:05Z")).unwrap().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(parse_date("start", Some("yesterday")).is_err());
    }
}
