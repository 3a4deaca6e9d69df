//! # Fulfillment engine public API
//!
//! The `fe_api` module exposes the programmatic API of the fulfillment engine.
//!
//! * [`order_finalizer`] is the single gate through which orders are created and stock is taken. Both payment paths
//!   end here.
//! * [`webhook_api`] turns signed gateway events into finalized orders.
//! * [`direct_order_api`] charges a payment instrument and finalizes the order in a single request.
//! * [`checkout_api`] prepares hosted checkout sessions that are paid for off-site and completed via the webhook.
//! * [`catalog_api`] provides read access to the product catalog.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the backend traits the API needs, and, where money moves, a [`crate::traits::PaymentGateway`].
//!
//! ```rust,ignore
//! use fulfillment_engine::{events::EventProducers, OrderFinalizer, DirectOrderApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let finalizer = OrderFinalizer::new(db, EventProducers::default());
//! let api = DirectOrderApi::new(finalizer, my_gateway);
//! let order = api.submit(request).await?;
//! ```
pub mod catalog_api;
pub mod checkout_api;
pub mod direct_order_api;
pub mod errors;
pub mod order_finalizer;
pub mod order_objects;
pub mod webhook_api;
pub mod webhook_objects;
