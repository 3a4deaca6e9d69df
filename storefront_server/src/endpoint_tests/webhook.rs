use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use fulfillment_engine::{
    events::EventProducers,
    helpers::{WebhookVerifier, DEFAULT_TOLERANCE},
    traits::{FulfillmentError, InsertOrderResult},
    OrderFinalizer,
    WebhookProcessor,
};
use serde_json::json;
use sf_common::Secret;

use super::{
    helpers::{order, send_request},
    mocks::MockFulfillmentDb,
};
use crate::{data_objects::WebhookSignatureHeader, routes::GatewayWebhookRoute};

const SECRET: &str = "whsec_endpoint_tests";
const HEADER: &str = "Stripe-Signature";
const MUG_ITEMS: &str = r#"[{"productId":"mug","quantity":1}]"#;

fn verifier(secret: &str) -> WebhookVerifier {
    WebhookVerifier::new(Secret::new(secret.to_string()), DEFAULT_TOLERANCE)
}

fn paid_session_event() -> Vec<u8> {
    let event = json!({
        "id": "evt_1",
        "object": "event",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_test_1",
            "object": "checkout.session",
            "customer_email": "bob@example.com",
            "payment_status": "paid",
            "metadata": { "items": MUG_ITEMS, "email": "bob@example.com" }
        }}
    });
    serde_json::to_vec(&event).unwrap()
}

fn webhook_request(body: Vec<u8>, header: &str, secret: &str) -> TestRequest {
    let signature = verifier(secret).sign(&body, Utc::now().timestamp());
    TestRequest::post().uri("/webhook").insert_header((header, signature)).set_payload(body)
}

#[actix_web::test]
async fn paid_session_creates_an_order() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_for_key().returning(|_| Ok(None));
    db.expect_fulfil_order()
        .withf(|o| o.idempotency_key.as_deref() == Some("evt_1") && o.payment_ref.as_deref() == Some("cs_test_1"))
        .times(1)
        .returning(|o| Ok(InsertOrderResult::Inserted(order(7, &o.email, MUG_ITEMS, 1200, "cs_test_1"))));
    let req = webhook_request(paid_session_event(), HEADER, SECRET);
    let (status, body) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order #7 created."}"#);
}

#[actix_web::test]
async fn redelivered_event_is_acknowledged() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_for_key()
        .times(1)
        .returning(|_| Ok(Some(order(7, "bob@example.com", MUG_ITEMS, 1200, "cs_test_1"))));
    let req = webhook_request(paid_session_event(), HEADER, SECRET);
    let (status, body) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order #7 already exists."}"#);
}

#[actix_web::test]
async fn forged_signature_touches_nothing() {
    // The mock has no expectations, so any storage call fails the test
    let db = MockFulfillmentDb::new();
    let req = webhook_request(paid_session_event(), HEADER, "whsec_somebody_else");
    let (status, body) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"success":false"#));
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let db = MockFulfillmentDb::new();
    let req = TestRequest::post().uri("/webhook").set_payload(paid_session_event());
    let (status, _) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signature_header_is_configurable() {
    let db = MockFulfillmentDb::new();
    let req = webhook_request(paid_session_event(), HEADER, SECRET);
    let (status, _) = send_request(req, configure(db, "X-Gateway-Signature")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_for_key().returning(|_| Ok(None));
    db.expect_fulfil_order()
        .times(1)
        .returning(|o| Ok(InsertOrderResult::Inserted(order(8, &o.email, MUG_ITEMS, 1200, "cs_test_1"))));
    let req = webhook_request(paid_session_event(), "X-Gateway-Signature", SECRET);
    let (status, _) = send_request(req, configure(db, "X-Gateway-Signature")).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn storage_failure_asks_for_redelivery() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_order_for_key().returning(|_| Ok(None));
    db.expect_fulfil_order().returning(|_| Err(FulfillmentError::DatabaseError("database is locked".into())));
    let req = webhook_request(paid_session_event(), HEADER, SECRET);
    let (status, body) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is locked"));
}

#[actix_web::test]
async fn other_event_types_are_ignored() {
    let db = MockFulfillmentDb::new();
    let body = serde_json::to_vec(&json!({
        "id": "evt_2",
        "type": "payment_intent.created",
        "data": { "object": { "id": "pi_1" } }
    }))
    .unwrap();
    let req = webhook_request(body, HEADER, SECRET);
    let (status, _) = send_request(req, configure(db, HEADER)).await;
    assert_eq!(status, StatusCode::OK);
}

fn configure(db: MockFulfillmentDb, header: &'static str) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let finalizer = OrderFinalizer::new(db, EventProducers::default());
        let api = WebhookProcessor::new(finalizer, verifier(SECRET));
        cfg.service(GatewayWebhookRoute::<MockFulfillmentDb>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(WebhookSignatureHeader(header.to_string())));
    }
}
