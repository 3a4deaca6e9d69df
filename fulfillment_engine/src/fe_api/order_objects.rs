use serde::{Deserialize, Serialize};

use crate::{
    db_types::{LineItem, Order},
    fe_api::errors::OrderFlowError,
};

/// A buyer's request to place and pay for an order in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub email: String,
    pub items: Vec<LineItem>,
    /// The gateway's reference to the buyer's payment instrument.
    #[serde(default)]
    pub payment_instrument: Option<String>,
    /// A client-chosen key. Resubmitting a request with the same key returns the original order instead of charging
    /// the buyer again.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// A request shape that passed validation. The email is normalized and the payment instrument is known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrderRequest {
    pub email: String,
    pub items: Vec<LineItem>,
    pub payment_instrument: String,
    pub idempotency_key: Option<String>,
}

impl OrderRequest {
    pub fn validate(self) -> Result<ValidOrderRequest, OrderFlowError> {
        let email = normalize_email(&self.email);
        if !is_plausible_email(&email) {
            return Err(OrderFlowError::InvalidRequest(format!("'{}' is not a valid email address", self.email)));
        }
        if self.items.is_empty() {
            return Err(OrderFlowError::InvalidRequest("The order does not contain any items".into()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderFlowError::InvalidRequest(format!(
                "Invalid quantity {} for product {}",
                item.quantity, item.product_id
            )));
        }
        let payment_instrument = self
            .payment_instrument
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OrderFlowError::InvalidRequest("A payment instrument is required".into()))?;
        let idempotency_key = self.idempotency_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        Ok(ValidOrderRequest { email, items: self.items, payment_instrument, idempotency_key })
    }
}

/// The result of a successful call to [`crate::OrderFinalizer::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// A new order was created and its stock taken.
    Created(Order),
    /// The idempotency key had already been applied. This is the order it produced; nothing was changed.
    AlreadyApplied(Order),
}

impl FinalizeOutcome {
    pub fn order(&self) -> &Order {
        match self {
            FinalizeOutcome::Created(o) | FinalizeOutcome::AlreadyApplied(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            FinalizeOutcome::Created(o) | FinalizeOutcome::AlreadyApplied(o) => o,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, FinalizeOutcome::AlreadyApplied(_))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A deliberately loose check. The gateway and the mail relay are the real judges of deliverability.
pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        },
        None => false,
    }
}
