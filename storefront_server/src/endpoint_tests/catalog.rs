use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use fulfillment_engine::{traits::InventoryError, CatalogApi};
use serde_json::Value;

use super::{
    helpers::{product, send_request},
    mocks::MockFulfillmentDb,
};
use crate::routes::{ProductByIdRoute, ProductsRoute};

#[actix_web::test]
async fn fetch_products() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_products().times(1).returning(|| Ok(vec![product("mug", 1200, 5), product("tee", 2000, 0)]));
    let (status, body) = send_request(TestRequest::get().uri("/products"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let products: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(products[0]["id"], "mug");
    assert_eq!(products[0]["price"], 1200);
    assert_eq!(products[0]["stock"], 5);
    assert_eq!(products[1]["id"], "tee");
    assert_eq!(products[1]["stock"], 0);
}

#[actix_web::test]
async fn fetch_product_by_id() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_product().times(1).returning(|id| Ok(Some(product(id, 1200, 5))));
    let (status, body) = send_request(TestRequest::get().uri("/products/mug"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let product: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(product["name"], "A mug");
}

#[actix_web::test]
async fn fetch_unknown_product() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_product().returning(|_| Ok(None));
    let (status, body) = send_request(TestRequest::get().uri("/products/nope"), configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product nope does not exist"}"#);
}

#[actix_web::test]
async fn catalog_storage_failure() {
    let mut db = MockFulfillmentDb::new();
    db.expect_fetch_products().returning(|| Err(InventoryError::DatabaseError("database is locked".into())));
    let (status, body) = send_request(TestRequest::get().uri("/products"), configure(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is locked"));
}

fn configure(db: MockFulfillmentDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ProductsRoute::<MockFulfillmentDb>::new())
            .service(ProductByIdRoute::<MockFulfillmentDb>::new())
            .app_data(web::Data::new(CatalogApi::new(db)));
    }
}
