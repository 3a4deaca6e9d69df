use thiserror::Error;

use crate::db_types::{DedupRecord, Order, OrderId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Stored data is inconsistent: {0}")]
    CorruptData(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// Read access to the order record store and the deduplication log.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Returns the most recent fulfilled (i.e. not `Failed`) order placed with the given email address.
    ///
    /// This is a best-effort heuristic used to recover item lists. It cannot tell apart two in-flight orders for the
    /// same buyer.
    async fn fetch_latest_order_for_email(&self, email: &str) -> Result<Option<Order>, OrderStoreError>;

    /// Returns the order that was produced when `idempotency_key` was applied, if it has been applied.
    async fn fetch_order_for_key(&self, idempotency_key: &str) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_dedup_record(&self, idempotency_key: &str) -> Result<Option<DedupRecord>, OrderStoreError>;
}
