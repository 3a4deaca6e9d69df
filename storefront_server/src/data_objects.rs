use std::fmt::Display;

use fulfillment_engine::db_types::LineItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub email: String,
    pub items: Vec<LineItem>,
}

/// An operator's decision on an order that is waiting for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOrderRequest {
    pub accept: bool,
}

/// The name of the request header that carries the webhook signature.
#[derive(Debug, Clone)]
pub struct WebhookSignatureHeader(pub String);
