use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use fulfillment_engine::db_types::{
    Money,
    NewReconciliationAlert,
    Order,
    OrderId,
    OrderStatusType,
    Product,
    ReconciliationAlert,
};
use log::debug;

pub async fn send_request(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub fn product(id: &str, price: i64, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("A {id}"),
        price: Money::from(price),
        stock,
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
}

pub fn order(id: i64, email: &str, items: &str, total: i64, payment_ref: &str) -> Order {
    Order {
        id: OrderId(id),
        email: email.to_string(),
        items: items.to_string(),
        total: Money::from(total),
        status: OrderStatusType::Paid,
        payment_ref: Some(payment_ref.to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
    }
}

pub fn stored_alert(alert: NewReconciliationAlert) -> ReconciliationAlert {
    ReconciliationAlert {
        id: 1,
        kind: alert.kind,
        email: alert.email,
        reference: alert.reference,
        details: alert.details,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
    }
}
