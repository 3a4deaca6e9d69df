//! # Backend contracts
//!
//! This module defines the interface contracts that storage backends and the payment gateway must satisfy in order
//! to be driven by the fulfillment engine.
//!
//! ## Traits
//! * [`InventoryManagement`] is the inventory ledger: catalog reads, read-only quotes and the atomic
//!   check-and-reserve primitive.
//! * [`OrderManagement`] provides read access to the order record store and the deduplication log.
//! * [`FulfillmentDatabase`] defines the highest level of behaviour: the single atomic fulfilment transaction, status
//!   transitions and the reconciliation alert log. The order finalizer is the only caller of its mutating methods.
//! * [`PaymentGateway`] is the external payment provider: direct charges and hosted checkout sessions.
mod data_objects;
mod fulfillment_database;
mod inventory_management;
mod order_management;
mod payment_gateway;

pub use data_objects::{
    ChargeRequest,
    ChargeResult,
    ChargeStatus,
    HostedLineItem,
    HostedSession,
    InsertOrderResult,
    Reservation,
    SessionRequest,
};
pub use fulfillment_database::{FulfillmentDatabase, FulfillmentError};
pub use inventory_management::{validate_line_items, InventoryError, InventoryManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{GatewayError, PaymentGateway};
