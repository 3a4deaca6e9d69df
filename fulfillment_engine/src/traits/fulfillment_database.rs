use thiserror::Error;

use crate::{
    db_types::{Money, NewOrder, NewReconciliationAlert, Order, OrderId, OrderStatusType, ReconciliationAlert},
    traits::{InsertOrderResult, InventoryError, InventoryManagement, OrderManagement, OrderStoreError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("{0}")]
    Inventory(#[from] InventoryError),
    #[error("{0}")]
    OrderStore(#[from] OrderStoreError),
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} to {to}")]
    StatusTransitionForbidden { id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Invalid order data: {0}")]
    InvalidOrder(String),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfillmentError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the fulfillment engine.
///
/// The mutating methods here are reserved for the [`crate::OrderFinalizer`]. No other component writes order rows or
/// decrements stock.
#[allow(async_fn_in_trait)]
pub trait FulfillmentDatabase: Clone + InventoryManagement + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order, and in a single atomic transaction,
    /// * claims the order's idempotency key, if it has one. If the key has already been claimed, the transaction is
    ///   abandoned and the order that was created for the key is returned as [`InsertOrderResult::AlreadyExists`].
    /// * checks and reserves stock for every line item, computing the total from ledger prices.
    /// * inserts the order row with the computed total.
    /// * binds the idempotency key to the new order.
    ///
    /// If any step fails, nothing is changed.
    async fn fulfil_order(&self, order: NewOrder) -> Result<InsertOrderResult, FulfillmentError>;

    /// Records an order that could not be fulfilled, without touching stock. The status is always `Failed`, and
    /// `total` is the amount that was charged for it.
    ///
    /// The order's idempotency key, if any, is bound to the failed order in the same transaction, so a retry of the
    /// same request finds this order instead of fulfilling it a second time. If the key has already been applied, the
    /// order it is bound to is returned and nothing is written.
    async fn insert_failed_order(&self, order: NewOrder, total: Money) -> Result<Order, FulfillmentError>;

    /// Moves an order to a new status. Only the transitions allowed by [`OrderStatusType::can_transition_to`] are
    /// permitted. Returns the updated order.
    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, FulfillmentError>;

    /// Appends an entry to the reconciliation alert log.
    async fn record_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, FulfillmentError>;

    /// Fetches all reconciliation alerts, oldest first.
    async fn fetch_alerts(&self) -> Result<Vec<ReconciliationAlert>, FulfillmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfillmentError> {
        Ok(())
    }
}
