//! `SqliteDatabase` is a concrete implementation of a fulfillment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{alerts, db_url, dedup, new_pool, orders, products};
use crate::{
    db_types::{
        DedupRecord,
        LineItem,
        Money,
        NewOrder,
        NewProduct,
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
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SF_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Loads catalog entries into the ledger. Existing products are overwritten. This is a bootstrap operation, and
    /// is not part of any trait: the engine itself never creates products.
    pub async fn seed_products(&self, catalog: &[NewProduct]) -> Result<Vec<Product>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut result = Vec::with_capacity(catalog.len());
        for product in catalog {
            result.push(products::upsert_product(product.clone(), &mut tx).await?);
        }
        tx.commit().await?;
        info!("🗃️ Seeded {} products", result.len());
        Ok(result)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }

    async fn quote(&self, items: &[LineItem]) -> Result<Money, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        products::quote(items, &mut conn).await
    }

    async fn check_and_reserve(&self, items: &[LineItem]) -> Result<Reservation, InventoryError> {
        let mut tx = self.pool.begin().await?;
        // Dropping the transaction on error rolls back any decrements already made
        let reservation = products::reserve_items(items, &mut tx).await?;
        tx.commit().await?;
        Ok(reservation)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_latest_order_for_email(&self, email: &str) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_latest_order_for_email(email, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_for_key(&self, idempotency_key: &str) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_for_key(idempotency_key, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_dedup_record(&self, idempotency_key: &str) -> Result<Option<DedupRecord>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let record = dedup::fetch_record(idempotency_key, &mut conn).await?;
        Ok(record)
    }
}

impl FulfillmentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fulfil_order(&self, order: NewOrder) -> Result<InsertOrderResult, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let key = order.idempotency_key.clone();
        if let Some(key) = key.as_deref() {
            if !dedup::claim_key(key, &mut tx).await? {
                tx.rollback().await?;
                debug!("🗃️ Idempotency key {key} has already been applied. Fetching the existing order");
                let mut conn = self.pool.acquire().await?;
                let existing = orders::fetch_order_for_key(key, &mut conn).await?.ok_or_else(|| {
                    OrderStoreError::CorruptData(format!("Idempotency key {key} is not bound to an order"))
                })?;
                return Ok(InsertOrderResult::AlreadyExists(existing));
            }
        }
        let reservation = products::reserve_items(&order.items, &mut tx).await?;
        let order = orders::insert_order(order, reservation.total, &mut tx).await?;
        if let Some(key) = key.as_deref() {
            dedup::bind_order(key, order.id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} committed ({}) with total {}", order.id, order.status, order.total);
        Ok(InsertOrderResult::Inserted(order))
    }

    async fn insert_failed_order(&self, order: NewOrder, total: Money) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let key = order.idempotency_key.clone();
        if let Some(key) = key.as_deref() {
            if !dedup::claim_key(key, &mut tx).await? {
                tx.rollback().await?;
                debug!("🗃️ Idempotency key {key} was applied while its failure was being recorded");
                let mut conn = self.pool.acquire().await?;
                let existing = orders::fetch_order_for_key(key, &mut conn).await?.ok_or_else(|| {
                    OrderStoreError::CorruptData(format!("Idempotency key {key} is not bound to an order"))
                })?;
                return Ok(existing);
            }
        }
        let order = orders::insert_order(order.with_status(OrderStatusType::Failed), total, &mut tx).await?;
        if let Some(key) = key.as_deref() {
            dedup::bind_order(key, order.id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn record_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let alert = alerts::insert_alert(alert, &mut conn).await?;
        Ok(alert)
    }

    async fn fetch_alerts(&self) -> Result<Vec<ReconciliationAlert>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let alerts = alerts::fetch_alerts(&mut conn).await?;
        Ok(alerts)
    }

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        self.pool.close().await;
        Ok(())
    }
}
