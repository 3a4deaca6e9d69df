use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fulfillment_engine::{
    db_types::{AlertKind, NewReconciliationAlert, OrderId, OrderStatusType},
    events::EventProducers,
    traits::FulfillmentError,
    OrderFinalizer,
};
use serde_json::{json, Value};
use sf_common::Secret;

use super::{
    helpers::{order, send_request, stored_alert},
    mocks::MockFulfillmentDb,
};
use crate::server::configure_operator_routes;

const OPERATOR_KEY: &str = "op-s3cret";
const MUG_ITEMS: &str = r#"[{"productId":"mug","quantity":2}]"#;

fn configure(db: MockFulfillmentDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let finalizer = OrderFinalizer::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(finalizer));
        configure_operator_routes::<MockFulfillmentDb>(cfg, Secret::new(OPERATOR_KEY.to_string()));
    }
}

fn authorized(req: TestRequest) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {OPERATOR_KEY}")))
}

#[actix_web::test]
async fn list_alerts() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_alerts().times(1).returning(|| {
        let gap = NewReconciliationAlert::new(AlertKind::ReconciliationGap, "No items for evt_1")
            .with_email("kim@example.com")
            .with_reference("evt_1");
        Ok(vec![stored_alert(gap)])
    });
    let req = authorized(TestRequest::get().uri("/operator/alerts"));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let alerts: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(alerts[0]["kind"], "ReconciliationGap");
    assert_eq!(alerts[0]["reference"], "evt_1");
}

#[actix_web::test]
async fn operator_routes_need_the_key() {
    // No expectations: the storage must not be reached
    let db = MockFulfillmentDb::new();
    let req = TestRequest::get().uri("/operator/alerts");
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("operator key"));

    let db = MockFulfillmentDb::new();
    let req = TestRequest::post()
        .uri("/operator/orders/3/resolve")
        .insert_header(("Authorization", "Bearer op-s3creT"))
        .set_json(json!({ "accept": true }));
    let (status, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn accept_a_recovered_order() {
    let mut db = MockFulfillmentDb::new();
    db.expect_update_order_status()
        .withf(|id, status| *id == OrderId(3) && *status == OrderStatusType::Paid)
        .times(1)
        .returning(|id, status| {
            let mut order = order(id.value(), "kim@example.com", MUG_ITEMS, 2400, "cs_3");
            order.status = status;
            Ok(order)
        });
    let req = authorized(TestRequest::post().uri("/operator/orders/3/resolve")).set_json(json!({ "accept": true }));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["id"], 3);
    assert_eq!(order["status"], "Paid");
}

#[actix_web::test]
async fn settled_orders_cannot_be_resolved_again() {
    let mut db = MockFulfillmentDb::new();
    db.expect_update_order_status().times(1).returning(|id, to| {
        Err(FulfillmentError::StatusTransitionForbidden { id, from: OrderStatusType::Paid, to })
    });
    let req = authorized(TestRequest::post().uri("/operator/orders/3/resolve")).set_json(json!({ "accept": false }));
    let (status, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("cannot move from Paid to Failed"));
}

#[actix_web::test]
async fn resolving_an_unknown_order() {
    let mut db = MockFulfillmentDb::new();
    db.expect_update_order_status().returning(|id, _| Err(FulfillmentError::OrderNotFound(id)));
    let req = authorized(TestRequest::post().uri("/operator/orders/99/resolve")).set_json(json!({ "accept": true }));
    let (status, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
