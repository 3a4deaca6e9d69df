use cucumber::World;
use fulfillment_engine::{
    db_types::Order,
    events::EventProducers,
    FinalizeError,
    OrderFinalizer,
    SqliteDatabase,
    WebhookAck,
    WebhookProcessor,
};
use log::*;

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    webhooks::verifier,
};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<FulfillmentSystem>,
    pub last_result: Option<Result<Order, FinalizeError>>,
    pub last_ack: Option<WebhookAck>,
}

#[derive(Debug)]
pub struct FulfillmentSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub finalizer: OrderFinalizer<SqliteDatabase>,
    pub webhooks: WebhookProcessor<SqliteDatabase>,
}

impl StorefrontWorld {
    pub fn system(&self) -> &FulfillmentSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn last_ack(&self) -> &WebhookAck {
        self.last_ack.as_ref().expect("No webhook has been delivered")
    }
}

impl FulfillmentSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("Created database: {db_path}");
        let finalizer = OrderFinalizer::new(db.clone(), EventProducers::default());
        let webhooks = WebhookProcessor::new(finalizer.clone(), verifier());
        Self { db_path, db, finalizer, webhooks }
    }
}
