use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::Order,
    fe_api::order_objects::{is_plausible_email, normalize_email},
    helpers::{SignatureError, EMAIL_METADATA_KEY},
};

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_SESSION_ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

/// The envelope of every gateway event. The payload in `data.object` depends on `event_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEventData {
    pub object: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// The parts of a hosted checkout session that fulfilment needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Value>>,
    /// `paid`, `unpaid` or `no_payment_required`
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Either the payment intent id, or the expanded object.
    #[serde(default)]
    pub payment_intent: Option<Value>,
}

impl CheckoutSessionObject {
    /// The buyer's email: the one entered on the hosted page if there is one, otherwise the one we put in the metadata.
    pub fn email(&self) -> Option<String> {
        let details = self.customer_details.as_ref().and_then(|d| d.email.clone());
        let from_metadata = self.metadata_value(EMAIL_METADATA_KEY).and_then(|v| v.as_str()).map(String::from);
        [self.customer_email.clone(), details, from_metadata]
            .into_iter()
            .flatten()
            .map(|e| normalize_email(&e))
            .find(|e| is_plausible_email(e))
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    pub fn payment_intent_id(&self) -> Option<&str> {
        match self.payment_intent.as_ref()? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(o) => o.get("id").and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

/// What the webhook processor made of a delivery. The HTTP layer turns this into a status code: anything other than
/// `Retry` and `Rejected` tells the gateway to stop redelivering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAck {
    /// The event produced (or had already produced) this order.
    Processed { order: Order, duplicate: bool },
    /// The event was handled, but no order was created. An alert explains why.
    Acknowledged(String),
    /// The event does not concern fulfilment, or can never be processed.
    Ignored(String),
    /// Processing failed for a reason that may go away. The gateway should redeliver.
    Retry(String),
    /// The signature did not check out. Nothing was read or stored.
    Rejected(SignatureError),
}
