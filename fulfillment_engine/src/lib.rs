//! Storefront Fulfillment Engine
//!
//! The fulfillment engine turns payments into orders. It checks and reserves stock, reconciles the two ways a payment
//! can be confirmed (a direct charge, or an asynchronous gateway event) into a single order record, and records
//! anything it cannot reconcile for an operator to look at.
//!
//! The library is divided into these main sections:
//! 1. Storage. The backend contracts live in [`mod@traits`], and [`SqliteDatabase`] implements all of them. The data
//!    types stored in the database are defined in [`mod@db_types`] and are public.
//! 2. The engine public API ([`mod@fe_api`]). [`OrderFinalizer`] is the single writer of orders and stock
//!    decrements. [`WebhookProcessor`] and [`DirectOrderApi`] are the two entry points that lead to it, and
//!    [`CheckoutSessionApi`] prepares the sessions the webhook later completes.
//!
//! The engine also emits events that can be subscribed to (see [`mod@events`]), for example when an order has been
//! paid for, so that receipts can be sent without holding up the order flow.
pub mod db_types;
pub mod events;
pub mod fe_api;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use fe_api::{
    catalog_api::CatalogApi,
    checkout_api::{CheckoutSessionApi, CheckoutUrls},
    direct_order_api::{DirectOrderApi, DEFAULT_CHARGE_TIMEOUT},
    errors::{CheckoutError, FinalizeError, OrderFlowError},
    order_finalizer::OrderFinalizer,
    order_objects::{FinalizeOutcome, OrderRequest},
    webhook_api::WebhookProcessor,
    webhook_objects::WebhookAck,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{FulfillmentDatabase, InventoryManagement, OrderManagement, PaymentGateway};
