use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The gateway takes request bodies as form data, with nested fields flattened into `a[b][c]` keys.
pub type FormParams = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentIntent {
    /// In minor currency units.
    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub receipt_email: Option<String>,
}

impl NewPaymentIntent {
    /// The intent is confirmed on creation, so the charge is attempted straight away. Redirect-based payment methods
    /// are refused, since there is no buyer present to follow the redirect.
    pub fn to_form_params(&self) -> FormParams {
        let mut params = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.to_lowercase()),
            ("payment_method".to_string(), self.payment_method.clone()),
            ("confirm".to_string(), "true".to_string()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
            ("automatic_payment_methods[allow_redirects]".to_string(), "never".to_string()),
        ];
        if let Some(email) = &self.receipt_email {
            params.push(("receipt_email".to_string(), email.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    Processing,
    RequiresPaymentMethod,
    RequiresAction,
    RequiresConfirmation,
    RequiresCapture,
    Canceled,
    #[serde(other)]
    Unrecognised,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub product_id: String,
    pub name: String,
    pub unit_amount: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub customer_email: String,
    pub currency: String,
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

impl NewCheckoutSession {
    pub fn to_form_params(&self) -> FormParams {
        let currency = self.currency.to_lowercase();
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("customer_email".to_string(), self.customer_email.clone()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            params.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
            params.push((format!("{prefix}[price_data][currency]"), currency.clone()));
            params.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.to_string()));
            params.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
            params.push((format!("{prefix}[price_data][product_data][metadata][product_id]"), item.product_id.clone()));
        }
        for (key, value) in &self.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Only present while the session is open.
    pub url: Option<String>,
    pub payment_status: String,
}
