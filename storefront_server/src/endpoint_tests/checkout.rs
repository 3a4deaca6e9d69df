use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fulfillment_engine::{
    traits::{GatewayError, HostedSession},
    CheckoutSessionApi,
    CheckoutUrls,
};
use serde_json::{json, Value};

use super::{
    helpers::{product, send_request},
    mocks::{MockFulfillmentDb, MockGateway},
};
use crate::routes::CheckoutSessionRoute;

#[actix_web::test]
async fn create_checkout_session() {
    let mut db = MockFulfillmentDb::new();
    let mut gateway = MockGateway::new();
    db.expect_fetch_product().times(2).returning(|id| Ok(Some(product(id, 1000, 10))));
    gateway
        .expect_create_hosted_session()
        .withf(|s| {
            s.email == "bob@example.com" &&
                s.success_url == "https://shop.example.com/thanks" &&
                s.line_items.len() == 2 &&
                s.line_items.iter().all(|l| l.unit_amount.value() == 1000) &&
                s.metadata.get("items").map(String::as_str) ==
                    Some(r#"[{"productId":"mug","quantity":3},{"productId":"tee","quantity":1}]"#)
        })
        .times(1)
        .returning(|_| {
            Ok(HostedSession { id: "cs_test_1".into(), url: "https://checkout.example.com/cs_test_1".into() })
        });
    let req = TestRequest::post().uri("/checkout-session").set_json(json!({
        "email": "bob@example.com",
        "items": [
            { "productId": "mug", "quantity": 2 },
            { "productId": "tee", "quantity": 1 },
            { "productId": "mug", "quantity": 1 }
        ]
    }));
    let (status, body) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["id"], "cs_test_1");
    assert_eq!(session["url"], "https://checkout.example.com/cs_test_1");
}

#[actix_web::test]
async fn checkout_for_unknown_product() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_product().returning(|_| Ok(None));
    let req = TestRequest::post().uri("/checkout-session").set_json(json!({
        "email": "bob@example.com",
        "items": [{ "productId": "nope", "quantity": 1 }]
    }));
    let (status, _) = send_request(req, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn checkout_gateway_failure() {
    let mut db = MockFulfillmentDb::new();
    let mut gateway = MockGateway::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 1000, 10))));
    gateway.expect_create_hosted_session().returning(|_| Err(GatewayError::Unavailable("connection refused".into())));
    let req = TestRequest::post().uri("/checkout-session").set_json(json!({
        "email": "bob@example.com",
        "items": [{ "productId": "mug", "quantity": 1 }]
    }));
    let (status, _) = send_request(req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

fn configure(db: MockFulfillmentDb, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let urls = CheckoutUrls {
            success_url: "https://shop.example.com/thanks".into(),
            cancel_url: "https://shop.example.com/cart".into(),
        };
        let api = CheckoutSessionApi::new(db, gateway, urls, Duration::from_secs(5));
        cfg.service(CheckoutSessionRoute::<MockFulfillmentDb, MockGateway>::new()).app_data(web::Data::new(api));
    }
}
