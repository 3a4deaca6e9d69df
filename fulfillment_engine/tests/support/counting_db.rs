use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use fulfillment_engine::{
    db_types::{
        DedupRecord,
        LineItem,
        Money,
        NewOrder,
        NewReconciliationAlert,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ReconciliationAlert,
    },
    traits::{
        FulfillmentDatabase,
        FulfillmentError,
        InsertOrderResult,
        InventoryError,
        InventoryManagement,
        OrderManagement,
        OrderStoreError,
        Reservation,
    },
    SqliteDatabase,
};

/// Delegates to a real database, counting every storage call that goes through it.
#[derive(Clone)]
pub struct CountingDb {
    inner: SqliteDatabase,
    calls: Arc<AtomicUsize>,
}

impl CountingDb {
    pub fn new(inner: SqliteDatabase) -> Self {
        Self { inner, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn into_inner(self) -> SqliteDatabase {
        self.inner
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl InventoryManagement for CountingDb {
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, InventoryError> {
        self.tick();
        self.inner.fetch_product(product_id).await
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, InventoryError> {
        self.tick();
        self.inner.fetch_products().await
    }

    async fn quote(&self, items: &[LineItem]) -> Result<Money, InventoryError> {
        self.tick();
        self.inner.quote(items).await
    }

    async fn check_and_reserve(&self, items: &[LineItem]) -> Result<Reservation, InventoryError> {
        self.tick();
        self.inner.check_and_reserve(items).await
    }
}

impl OrderManagement for CountingDb {
    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        self.tick();
        self.inner.fetch_order_by_id(id).await
    }

    async fn fetch_latest_order_for_email(&self, email: &str) -> Result<Option<Order>, OrderStoreError> {
        self.tick();
        self.inner.fetch_latest_order_for_email(email).await
    }

    async fn fetch_order_for_key(&self, idempotency_key: &str) -> Result<Option<Order>, OrderStoreError> {
        self.tick();
        self.inner.fetch_order_for_key(idempotency_key).await
    }

    async fn fetch_dedup_record(&self, idempotency_key: &str) -> Result<Option<DedupRecord>, OrderStoreError> {
        self.tick();
        self.inner.fetch_dedup_record(idempotency_key).await
    }
}

impl FulfillmentDatabase for CountingDb {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn fulfil_order(&self, order: NewOrder) -> Result<InsertOrderResult, FulfillmentError> {
        self.tick();
        self.inner.fulfil_order(order).await
    }

    async fn insert_failed_order(&self, order: NewOrder, total: Money) -> Result<Order, FulfillmentError> {
        self.tick();
        self.inner.insert_failed_order(order, total).await
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, FulfillmentError> {
        self.tick();
        self.inner.update_order_status(id, status).await
    }

    async fn record_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, FulfillmentError> {
        self.tick();
        self.inner.record_alert(alert).await
    }

    async fn fetch_alerts(&self) -> Result<Vec<ReconciliationAlert>, FulfillmentError> {
        self.tick();
        self.inner.fetch_alerts().await
    }
}
