use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bigdecimal::BigDecimal;
use impact_ledger::domain::{Environment, TransactionStatus};
use impact_ledger::error::AppError;
use impact_ledger::ledger::{Ledger, SharedLedger, TransactionFilter};
use impact_ledger::paypal::PayPalClient;
use impact_ledger::services::{BatchRecipient, PayoutRequest, PayoutService};
use impact_ledger::{create_app, AppState};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

const TOKEN_BODY: &str = r#"{"access_token":"A21AAtoken","token_type":"Bearer","expires_in":32400}"#;
const PAYOUT_BODY: &str = r#"{"batch_header":{"payout_batch_id":"BATCH123","batch_status":"PENDING"},"links":[]}"#;

fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

async fn mock_token(server: &mut ServerGuard) {
    server
        .mock("POST", "/v1/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
}

fn service_for(server: &ServerGuard) -> (PayoutService, SharedLedger) {
    let ledger = Ledger::new(Environment::Sandbox, 19).shared();
    let client = PayPalClient::new(
        server.url(),
        "client-id".to_string(),
        "client-secret".to_string(),
        Environment::Sandbox,
    );
    (PayoutService::new(client, ledger.clone()), ledger)
}

#[tokio::test]
async fn test_single_payout_records_completed_transaction() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    let payout = server
        .mock("POST", "/v1/payments/payouts")
        .match_body(Matcher::Regex(r#""value":"81.00""#.to_string()))
        .with_status(201)
        .with_body(PAYOUT_BODY)
        .create_async()
        .await;

    let (service, ledger) = service_for(&server);
    let outcome = service
        .execute(PayoutRequest::Single {
            recipient: "someone@example.com".to_string(),
            amount: dec("100.00"),
            currency: None,
            note: Some("thanks".to_string()),
        })
        .await
        .unwrap();

    payout.assert_async().await;
    assert_eq!(outcome.impact_split.impact_amount, dec("19.00"));
    assert_eq!(outcome.impact_split.recipient_amount, dec("81.00"));

    let tx = ledger.read().await.get_transaction(outcome.transaction.id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.external_batch_id.as_deref(), Some("BATCH123"));
    assert_eq!(tx.recipient.as_deref(), Some("someone@example.com"));
    assert_eq!(tx.currency, "USD");
    assert_eq!(tx.environment, Environment::Sandbox);
    assert!(tx.split_is_consistent());

    let metadata = tx.metadata.unwrap();
    assert_eq!(metadata["note"], "thanks");
    assert_eq!(metadata["upstreamResponse"]["batch_header"]["payout_batch_id"], "BATCH123");
}

#[tokio::test]
async fn test_batch_payout_records_one_entry() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("POST", "/v1/payments/payouts")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""value":"40.50""#.to_string()),
            Matcher::Regex(r#""value":"8.10""#.to_string()),
        ]))
        .with_status(201)
        .with_body(PAYOUT_BODY)
        .create_async()
        .await;

    let (service, ledger) = service_for(&server);
    let outcome = service
        .execute(PayoutRequest::Batch {
            recipients: vec![
                BatchRecipient {
                    email: "a@example.com".to_string(),
                    amount: dec("50.00"),
                    note: None,
                },
                BatchRecipient {
                    email: "b@example.com".to_string(),
                    amount: dec("10.00"),
                    note: Some("bonus".to_string()),
                },
            ],
            currency: Some("EUR".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.transaction.original_amount, dec("60.00"));
    assert_eq!(outcome.transaction.impact_amount, dec("11.40"));
    assert_eq!(outcome.transaction.recipient_amount, dec("48.60"));
    assert_eq!(outcome.transaction.recipient.as_deref(), Some("Batch: 2 recipients"));
    assert_eq!(outcome.transaction.currency, "EUR");
    assert_eq!(ledger.read().await.len(), 1);
}

#[tokio::test]
async fn test_batch_ledger_entry_matches_paid_items() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    // 0.03 at 19% pays 0.02 per item
    let payout = server
        .mock("POST", "/v1/payments/payouts")
        .match_body(Matcher::Regex(
            r#""value":"0.02".*"value":"0.02""#.to_string(),
        ))
        .with_status(201)
        .with_body(PAYOUT_BODY)
        .create_async()
        .await;

    let (service, ledger) = service_for(&server);
    let recipients = ["a@example.com", "b@example.com"]
        .iter()
        .map(|email| BatchRecipient {
            email: email.to_string(),
            amount: dec("0.03"),
            note: None,
        })
        .collect();
    let outcome = service
        .batch_payout(recipients, "USD".to_string())
        .await
        .unwrap();

    payout.assert_async().await;
    let tx = ledger.read().await.get_transaction(outcome.transaction.id).unwrap();
    assert_eq!(tx.original_amount, dec("0.06"));
    assert_eq!(tx.recipient_amount, dec("0.04"));
    assert_eq!(tx.impact_amount, dec("0.02"));
    assert!(tx.split_is_consistent());
    assert_eq!(outcome.impact_split.recipient_amount, dec("0.04"));
}

#[tokio::test]
async fn test_failed_payout_records_nothing() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("POST", "/v1/payments/payouts")
        .with_status(400)
        .with_body(r#"{"name":"VALIDATION_ERROR"}"#)
        .create_async()
        .await;

    let (service, ledger) = service_for(&server);
    let err = service
        .single_payout(
            "someone@example.com".to_string(),
            dec("25.00"),
            "USD".to_string(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(ledger.read().await.is_empty());
}

#[tokio::test]
async fn test_invalid_payout_input_is_rejected_before_upstream() {
    let server = Server::new_async().await;
    let (service, ledger) = service_for(&server);

    let err = service
        .single_payout(" ".to_string(), dec("10.00"), "USD".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .single_payout("someone@example.com".to_string(), dec("0"), "USD".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .single_payout("someone@example.com".to_string(), dec("10.005"), "USD".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = service
        .batch_payout(Vec::new(), "USD".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(ledger
        .read()
        .await
        .get_transactions(&TransactionFilter::default())
        .is_empty());
}

#[tokio::test]
async fn test_payout_endpoint_end_to_end() {
    let mut server = Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("POST", "/v1/payments/payouts")
        .with_status(201)
        .with_body(PAYOUT_BODY)
        .create_async()
        .await;

    let (service, ledger) = service_for(&server);
    let app = create_app(AppState::new(ledger.clone(), Some(service), false));

    let request = Request::builder()
        .method("POST")
        .uri("/api/paypal/payout")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"type": "single", "recipient": "someone@example.com", "amount": "100.00"})
                .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["batch_header"]["payout_batch_id"], "BATCH123");
    assert_eq!(body["impactSplit"]["percentage"], 19);

    let id = uuid::Uuid::parse_str(body["transactionId"].as_str().unwrap()).unwrap();
    let tx = ledger.read().await.get_transaction(id).unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);

    let bad = Request::builder()
        .method("POST")
        .uri("/api/paypal/payout")
        .header("content-type", "application/json")
        .body(Body::from(json!({"type": "weekly"}).to_string()))
        .unwrap();
    let response = app.oneshot(bad).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
