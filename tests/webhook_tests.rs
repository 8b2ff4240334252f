mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront::payment::{notification_signature, GatewayError, Session};
use storefront::storage::OrderStore;
use uuid::Uuid;

use common::{test_app, MockGateway, TestApp, SERVER_KEY};

fn notification(order_number: &str, transaction_status: &str, transaction_id: &str) -> Value {
    let gross_amount = "215000.00";
    json!({
        "order_id": order_number,
        "status_code": "200",
        "gross_amount": gross_amount,
        "signature_key": notification_signature(order_number, "200", gross_amount, SERVER_KEY),
        "transaction_status": transaction_status,
        "transaction_id": transaction_id,
        "payment_type": "bank_transfer",
        "fraud_status": "accept",
        "currency": "IDR",
    })
}

async fn placed_order(app: &TestApp) -> (Uuid, String, String) {
    let (_, token) = app.customer().await;
    let product = app.seed_product(100000, 5).await;
    let (status, order) = app.place_order(&token, &product, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = order["id"].as_str().unwrap().parse().unwrap();
    (id, order["order_number"].as_str().unwrap().to_string(), token)
}

#[tokio::test]
async fn test_bad_signature_leaves_order_untouched() {
    let app = test_app(MockGateway::new());
    let (id, number, _) = placed_order(&app).await;
    let mut body = notification(&number, "settlement", "trx-1");
    body["signature_key"] = json!("0".repeat(128));

    let (status, err) = app.call("POST", "/payment/webhook", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "invalid signature");
    let order = app.store.find_order(id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, storefront::domain::aggregates::PaymentStatus::Pending);
    assert!(order.payments.is_empty());
}

#[tokio::test]
async fn test_settlement_confirms_and_replay_is_idempotent() {
    let app = test_app(MockGateway::new());
    let (id, number, _) = placed_order(&app).await;

    for _ in 0..2 {
        let (status, body) = app.call("POST", "/payment/webhook", None, Some(notification(&number, "settlement", "trx-1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CONFIRMED");
        assert_eq!(body["payment_status"], "PAID");
    }

    let order = app.store.find_order(id).await.unwrap().unwrap();
    assert_eq!(order.payments.len(), 1);
    assert_eq!(order.payments[0].transaction_id, "trx-1");
    assert_eq!(order.payments[0].method, "bank_transfer");
    assert_eq!(order.payments[0].amount, Decimal::from(215000));
}

#[tokio::test]
async fn test_pending_then_settlement_updates_one_payment() {
    let app = test_app(MockGateway::new());
    let (id, number, _) = placed_order(&app).await;
    let (_, body) = app.call("POST", "/payment/webhook", None, Some(notification(&number, "pending", "trx-7"))).await;
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["payment_status"], "PENDING");
    app.call("POST", "/payment/webhook", None, Some(notification(&number, "capture", "trx-7"))).await;

    let order = app.store.find_order(id).await.unwrap().unwrap();
    assert_eq!(order.payments.len(), 1);
    assert_eq!(order.payments[0].status, storefront::domain::aggregates::PaymentStatus::Paid);
}

#[tokio::test]
async fn test_expired_transaction_cancels_order() {
    let app = test_app(MockGateway::new());
    let (_, number, _) = placed_order(&app).await;
    let (status, body) = app.call("POST", "/payment/webhook", None, Some(notification(&number, "expire", "trx-2"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(body["payment_status"], "FAILED");
}

#[tokio::test]
async fn test_unknown_order_and_status() {
    let app = test_app(MockGateway::new());
    let (status, _) = app
        .call("POST", "/payment/webhook", None, Some(notification("ORD-0-0000", "settlement", "trx-3")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, number, _) = placed_order(&app).await;
    let (status, _) = app.call("POST", "/payment/webhook", None, Some(notification(&number, "refund", "trx-4"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_session_for_owner() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_session()
        .withf(|r| r.gross_amount == Decimal::from(215000) && r.items.iter().any(|i| i.id == "SHIPPING"))
        .times(1)
        .returning(|r| Ok(Session { token: format!("snap-{}", r.order_number), redirect_url: "https://pay.test/v2".into() }));
    let app = test_app(gateway);
    let (id, number, token) = placed_order(&app).await;
    let body = json!({ "order_id": id, "customer": { "first_name": "Budi", "email": "budi@example.com" } });

    let (status, session) = app.call("POST", "/payment/gateway", Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["token"], format!("snap-{number}"));
    assert_eq!(session["redirect_url"], "https://pay.test/v2");

    let (_, stranger) = app.customer().await;
    assert_eq!(app.call("POST", "/payment/gateway", Some(&stranger), Some(body)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_session_failure_is_generic() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_session()
        .returning(|_| Err(GatewayError::Rejected { status: 401, body: "Access denied, server key invalid".into() }));
    let app = test_app(gateway);
    let (id, _, token) = placed_order(&app).await;
    let body = json!({ "order_id": id, "customer": { "first_name": "Budi", "email": "budi@example.com" } });

    let (status, err) = app.call("POST", "/payment/gateway", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err, json!({ "status": 500, "message": "payment session failed" }));
}
