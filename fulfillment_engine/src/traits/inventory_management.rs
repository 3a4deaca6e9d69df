use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    db_types::{merge_line_items, LineItem, Money, Product},
    traits::Reservation,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("The order does not contain any items")]
    EmptyOrder,
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },
    #[error("Product {0} does not exist")]
    UnknownProduct(String),
    #[error("Insufficient stock for product {product_id}. {requested} requested, but only {available} available")]
    InsufficientStock { product_id: String, requested: i64, available: i64 },
    #[error("The order total is too large")]
    TotalOverflow,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl InventoryError {
    /// Business-rule failures are final for the current attempt. Only database errors are worth retrying.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, InventoryError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}

/// Rejects empty orders and non-positive quantities, and folds repeated product ids into one line each.
pub fn validate_line_items(items: &[LineItem]) -> Result<BTreeMap<String, i64>, InventoryError> {
    if items.is_empty() {
        return Err(InventoryError::EmptyOrder);
    }
    if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
        return Err(InventoryError::InvalidQuantity { product_id: item.product_id.clone(), quantity: item.quantity });
    }
    Ok(merge_line_items(items))
}

/// The inventory ledger. It is the authoritative source of prices and stock counts.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Fetches a single product. Returns `None` if the product does not exist.
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, InventoryError>;

    /// Fetches the whole catalog, ordered by product id.
    async fn fetch_products(&self) -> Result<Vec<Product>, InventoryError>;

    /// Prices the given items against the current ledger without touching stock.
    ///
    /// The same checks as [`Self::check_and_reserve`] apply, but the answer is only advisory: stock can be taken by a
    /// concurrent order at any time after this call returns.
    async fn quote(&self, items: &[LineItem]) -> Result<Money, InventoryError>;

    /// Atomically checks and decrements stock for every item.
    ///
    /// Repeated product ids are merged. Either every item is reserved, or none is; partial decrements are never
    /// visible to concurrent readers. Concurrent reservations of the same product are serialized, so the last unit of
    /// stock goes to exactly one caller.
    async fn check_and_reserve(&self, items: &[LineItem]) -> Result<Reservation, InventoryError>;
}
