mod api;
mod config;
mod error;

mod data_objects;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{
    CheckoutSession,
    NewCheckoutSession,
    NewPaymentIntent,
    PaymentIntent,
    PaymentIntentStatus,
    SessionLineItem,
};
pub use error::GatewayApiError;
