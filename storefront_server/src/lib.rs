//! # Storefront server
//! This crate hosts the HTTP front end of the fulfillment engine. It is responsible for:
//! * Serving the product catalog.
//! * Accepting direct orders, which are charged and fulfilled in a single request.
//! * Creating hosted checkout sessions on the payment gateway.
//! * Receiving signed webhook events from the gateway and turning paid sessions into orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/products` and `/products/{id}`: The catalog, with current prices and stock levels.
//! * `/orders`: Place and pay for an order in one step.
//! * `/checkout-session`: Start a hosted checkout.
//! * `/webhook`: Gateway event notifications.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
