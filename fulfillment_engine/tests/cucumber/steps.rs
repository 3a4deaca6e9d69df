use chrono::Utc;
use cucumber::{given, then, when};
use fulfillment_engine::{
    db_types::{AlertKind, LineItem, Money, NewOrder, NewProduct, OrderStatusType},
    helpers::{encode_manifest, WebhookVerifier, DEFAULT_TOLERANCE, MANIFEST_METADATA_KEY},
    traits::InventoryError,
    FinalizeError,
    FulfillmentDatabase,
    InventoryManagement,
    WebhookAck,
};
use serde_json::{json, Value};
use sf_common::Secret;

use crate::{
    cucumber::{storefront_world::FulfillmentSystem, StorefrontWorld},
    support::{
        prepare_env::order_count,
        webhooks::{completed_session, sign},
    },
};

fn manifest_metadata(product: &str, quantity: i64) -> Value {
    let manifest = encode_manifest(&[LineItem::new(product, quantity)]).expect("Invalid manifest");
    json!({ MANIFEST_METADATA_KEY: manifest })
}

#[given("a fresh storefront")]
async fn fresh_storefront(world: &mut StorefrontWorld) {
    world.system = Some(FulfillmentSystem::new().await);
}

#[given(expr = "product {word} costs {int} cents with {int} units in stock")]
async fn seed_product(world: &mut StorefrontWorld, id: String, price: i64, stock: i64) {
    let product = NewProduct::new(id.clone(), id, Money::from(price), stock);
    world.system().db.seed_products(&[product]).await.expect("Error seeding product");
}

#[when(expr = "{word} orders {int} of {word} with key {word}")]
async fn place_order(world: &mut StorefrontWorld, email: String, quantity: i64, product: String, key: String) {
    let order = NewOrder::new(email, vec![LineItem::new(product, quantity)]).with_idempotency_key(key);
    let result = world.system().finalizer.finalize(order).await.map(|o| o.into_order());
    world.last_result = Some(result);
}

#[when(expr = "the gateway reports event {word} paying session {word} for {word} buying {int} {word}")]
async fn paid_with_manifest(
    world: &mut StorefrontWorld,
    event: String,
    session: String,
    email: String,
    quantity: i64,
    product: String,
) {
    let body = completed_session(&event, &session, Some(&email), manifest_metadata(&product, quantity));
    let ack = world.system().webhooks.handle(&body, Some(&sign(&body))).await;
    world.last_ack = Some(ack);
}

#[when(expr = "the gateway reports event {word} paying session {word} for {word} without a manifest")]
async fn paid_without_manifest(world: &mut StorefrontWorld, event: String, session: String, email: String) {
    let body = completed_session(&event, &session, Some(&email), json!({}));
    let ack = world.system().webhooks.handle(&body, Some(&sign(&body))).await;
    world.last_ack = Some(ack);
}

#[when(expr = "a forged event {word} arrives paying session {word} for {word} buying {int} {word}")]
async fn forged_event(
    world: &mut StorefrontWorld,
    event: String,
    session: String,
    email: String,
    quantity: i64,
    product: String,
) {
    let body = completed_session(&event, &session, Some(&email), manifest_metadata(&product, quantity));
    let forger = WebhookVerifier::new(Secret::new("whsec_not_ours".to_string()), DEFAULT_TOLERANCE);
    let header = forger.sign(&body, Utc::now().timestamp());
    let ack = world.system().webhooks.handle(&body, Some(&header)).await;
    world.last_ack = Some(ack);
}

#[when(expr = "an operator {word} the order")]
async fn resolve_order(world: &mut StorefrontWorld, decision: String) {
    let accept = match decision.as_str() {
        "accepts" => true,
        "rejects" => false,
        other => panic!("Unknown decision: {other}"),
    };
    let id = match world.last_ack() {
        WebhookAck::Processed { order, .. } => order.id,
        other => panic!("The last webhook did not produce an order: {other:?}"),
    };
    let result = world.system().finalizer.resolve_reconciliation(id, accept).await;
    world.last_result = Some(result);
}

#[then(expr = "the order is accepted with a total of {int} cents")]
async fn order_accepted(world: &mut StorefrontWorld, total: i64) {
    let order = world.last_result.as_ref().expect("No order was placed").as_ref().expect("The order failed");
    assert_eq!(order.total, Money::from(total));
}

#[then("the order is refused for insufficient stock")]
async fn order_refused(world: &mut StorefrontWorld) {
    let result = world.last_result.as_ref().expect("No order was placed");
    assert!(
        matches!(result, Err(FinalizeError::Inventory(InventoryError::InsufficientStock { .. }))),
        "Expected insufficient stock, got {result:?}"
    );
}

#[then(expr = "the order now has status {word}")]
async fn resolved_status(world: &mut StorefrontWorld, status: String) {
    let order = world.last_result.as_ref().expect("No order was resolved").as_ref().expect("Resolution failed");
    assert_eq!(order.status, status.parse::<OrderStatusType>().expect("Invalid status"));
}

#[then(expr = "product {word} has {int} units in stock")]
async fn stock_level(world: &mut StorefrontWorld, id: String, stock: i64) {
    let product = world.system().db.fetch_product(&id).await.expect("Error fetching product").expect("No product");
    assert_eq!(product.stock, stock);
}

#[then(expr = "the webhook creates a new {word} order")]
async fn webhook_created(world: &mut StorefrontWorld, status: String) {
    match world.last_ack() {
        WebhookAck::Processed { order, duplicate: false } => {
            assert_eq!(order.status, status.parse::<OrderStatusType>().expect("Invalid status"));
        },
        other => panic!("Expected a new order, got {other:?}"),
    }
}

#[then("the webhook is recognised as a duplicate")]
async fn webhook_duplicate(world: &mut StorefrontWorld) {
    assert!(matches!(world.last_ack(), WebhookAck::Processed { duplicate: true, .. }), "{:?}", world.last_ack);
}

#[then("the webhook is acknowledged without an order")]
async fn webhook_acknowledged(world: &mut StorefrontWorld) {
    assert!(matches!(world.last_ack(), WebhookAck::Acknowledged(_)), "{:?}", world.last_ack);
}

#[then("the webhook is rejected")]
async fn webhook_rejected(world: &mut StorefrontWorld) {
    assert!(matches!(world.last_ack(), WebhookAck::Rejected(_)), "{:?}", world.last_ack);
}

#[then(expr = "there are {int} orders")]
async fn orders_exist(world: &mut StorefrontWorld, count: i64) {
    assert_eq!(order_count(&world.system().db).await, count);
}

#[then(expr = "a {word} alert is recorded")]
async fn alert_recorded(world: &mut StorefrontWorld, kind: String) {
    let kind = kind.parse::<AlertKind>().expect("Invalid alert kind");
    let alerts = world.system().db.fetch_alerts().await.expect("Error fetching alerts");
    assert!(alerts.iter().any(|a| a.kind == kind), "No {kind} alert in {alerts:?}");
}

#[then("no alerts are recorded")]
async fn no_alerts(world: &mut StorefrontWorld) {
    let alerts = world.system().db.fetch_alerts().await.expect("Error fetching alerts");
    assert!(alerts.is_empty(), "{alerts:?}");
}
