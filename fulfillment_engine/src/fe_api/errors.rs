use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    helpers::ManifestError,
    traits::{FulfillmentError, GatewayError, InventoryError, OrderStoreError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("{0}")]
    Inventory(InventoryError),
    #[error("Could not persist the order. {0}")]
    Persistence(String),
    #[error("Invalid order. {0}")]
    Validation(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} cannot move from {from} to {to}")]
    StatusTransitionForbidden { id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl FinalizeError {
    /// Only storage failures can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FinalizeError::Persistence(_))
    }
}

impl From<InventoryError> for FinalizeError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::DatabaseError(s) => FinalizeError::Persistence(s),
            e => FinalizeError::Inventory(e),
        }
    }
}

impl From<OrderStoreError> for FinalizeError {
    fn from(e: OrderStoreError) -> Self {
        FinalizeError::Persistence(e.to_string())
    }
}

impl From<FulfillmentError> for FinalizeError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::Inventory(e) => e.into(),
            FulfillmentError::OrderStore(e) => e.into(),
            FulfillmentError::DatabaseError(s) => FinalizeError::Persistence(s),
            FulfillmentError::OrderNotFound(id) => FinalizeError::OrderNotFound(id),
            FulfillmentError::StatusTransitionForbidden { id, from, to } => {
                FinalizeError::StatusTransitionForbidden { id, from, to }
            },
            FulfillmentError::InvalidOrder(s) => FinalizeError::Validation(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("Invalid order request. {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Inventory(InventoryError),
    #[error("{0}")]
    Gateway(GatewayError),
    #[error("The outcome of the payment is unknown. {0}")]
    PaymentOutcomeUnknown(String),
    #[error("Could not persist the order. {0}")]
    Persistence(String),
    #[error("The request was already processed as order {0}, which could not be fulfilled. The charge awaits review.")]
    AlreadyFailed(OrderId),
}

impl From<InventoryError> for OrderFlowError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::DatabaseError(s) => OrderFlowError::Persistence(s),
            e => OrderFlowError::Inventory(e),
        }
    }
}

impl From<FinalizeError> for OrderFlowError {
    fn from(e: FinalizeError) -> Self {
        match e {
            FinalizeError::Inventory(e) => OrderFlowError::Inventory(e),
            FinalizeError::Validation(s) => OrderFlowError::InvalidRequest(s),
            e => OrderFlowError::Persistence(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout request. {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Inventory(InventoryError),
    #[error("{0}")]
    Manifest(#[from] ManifestError),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("Could not read the catalog. {0}")]
    Persistence(String),
}

impl From<InventoryError> for CheckoutError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::DatabaseError(s) => CheckoutError::Persistence(s),
            e => CheckoutError::Inventory(e),
        }
    }
}
