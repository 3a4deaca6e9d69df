use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use sf_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry used to seed the products table at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(id: S, name: S, price: Money, stock: i64) -> Self {
        Self { id: id.into(), name: name.into(), price, stock }
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub quantity: i64,
}

impl LineItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

/// Folds repeated product ids into a single line each, keyed (and therefore ordered) by product id.
///
/// Ordering by id also means that concurrent reservations always lock product rows in the same order.
pub fn merge_line_items(items: &[LineItem]) -> BTreeMap<String, i64> {
    items.iter().fold(BTreeMap::new(), |mut acc, item| {
        let qty = acc.entry(item.product_id.clone()).or_insert(0);
        *qty = qty.saturating_add(item.quantity);
        acc
    })
}

/// A line item with the ledger price that was in effect when stock was reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLineItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLineItem {
    /// `None` if the line total does not fit in a `Money`.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Payment has been initiated, but not yet confirmed.
    Pending,
    /// Stock was reserved and the payment has been confirmed.
    Paid,
    /// The order could not be fulfilled. No stock is held for it.
    Failed,
    /// Stock was reserved, but the item list was recovered from the customer's order history, rather than from the
    /// payment itself. An operator needs to confirm the order.
    ReconciliationPending,
}

impl OrderStatusType {
    /// Orders are only ever moved out of the non-terminal states, and only into `Paid` or `Failed`.
    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, new_status), (Pending | ReconciliationPending, Paid | Failed))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Failed => write!(f, "Failed"),
            OrderStatusType::ReconciliationPending => write!(f, "ReconciliationPending"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Failed");
            OrderStatusType::Failed
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "ReconciliationPending" => Ok(Self::ReconciliationPending),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub email: String,
    /// The line items of the order, serialized as a JSON array of `{productId, quantity}` objects.
    pub items: String,
    pub total: Money,
    #[sqlx(try_from = "String")]
    pub status: OrderStatusType,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Deserializes the stored line items.
    pub fn line_items(&self) -> Result<Vec<LineItem>, ConversionError> {
        serde_json::from_str(&self.items)
            .map_err(|e| ConversionError(format!("Order {} has corrupt line items. {e}", self.id)))
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Order {} ({})", self.id, self.status)?;
        writeln!(f, "email: {}", self.email)?;
        writeln!(f, "items: {}", self.items)?;
        writeln!(f, "total: {}", self.total)?;
        writeln!(f, "payment ref: {}", self.payment_ref.as_deref().unwrap_or("none"))?;
        write!(f, "created at: {}", self.created_at)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// The data needed to persist an order once stock has been reserved. The total is not part of this struct: it is
/// always computed from ledger prices inside the reservation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub email: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatusType,
    /// The charge id (direct path) or checkout session id (webhook path) that paid for this order.
    pub payment_ref: Option<String>,
    /// The key that makes this fulfilment idempotent. If supplied, at most one order will ever be created for it.
    pub idempotency_key: Option<String>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(email: S, items: Vec<LineItem>) -> Self {
        Self {
            email: email.into(),
            items,
            status: OrderStatusType::Paid,
            payment_ref: None,
            idempotency_key: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn with_payment_ref<S: Into<String>>(mut self, payment_ref: S) -> Self {
        self.payment_ref = Some(payment_ref.into());
        self
    }

    pub fn with_idempotency_key<S: Into<String>>(mut self, key: S) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn serialized_items(&self) -> Result<String, ConversionError> {
        serde_json::to_string(&self.items).map_err(|e| ConversionError(format!("Could not serialize line items. {e}")))
    }
}

//--------------------------------------      DedupRecord      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DedupRecord {
    pub idempotency_key: String,
    /// Bound in the same transaction that claims the key, so a committed record always carries an order id.
    pub order_id: Option<OrderId>,
    pub applied_at: DateTime<Utc>,
}

//--------------------------------------  ReconciliationAlert  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AlertKind {
    /// A payment confirmation arrived, but no item list could be found for it. No order was created.
    ReconciliationGap,
    /// The item list was recovered from the customer's most recent order.
    RecoveredFromHistory,
    /// Money was taken, but the order could not be fulfilled. The charge has not been reversed.
    UnreversedCharge,
    /// A charge request timed out. It is unknown whether the customer was charged.
    ChargeOutcomeUnknown,
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::ReconciliationGap => write!(f, "ReconciliationGap"),
            AlertKind::RecoveredFromHistory => write!(f, "RecoveredFromHistory"),
            AlertKind::UnreversedCharge => write!(f, "UnreversedCharge"),
            AlertKind::ChargeOutcomeUnknown => write!(f, "ChargeOutcomeUnknown"),
        }
    }
}

impl FromStr for AlertKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReconciliationGap" => Ok(Self::ReconciliationGap),
            "RecoveredFromHistory" => Ok(Self::RecoveredFromHistory),
            "UnreversedCharge" => Ok(Self::UnreversedCharge),
            "ChargeOutcomeUnknown" => Ok(Self::ChargeOutcomeUnknown),
            s => Err(ConversionError(format!("Invalid alert kind: {s}"))),
        }
    }
}

impl TryFrom<String> for AlertKind {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ReconciliationAlert {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub kind: AlertKind,
    pub email: Option<String>,
    pub reference: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReconciliationAlert {
    pub kind: AlertKind,
    pub email: Option<String>,
    pub reference: Option<String>,
    pub details: String,
}

impl NewReconciliationAlert {
    pub fn new<S: Into<String>>(kind: AlertKind, details: S) -> Self {
        Self { kind, email: None, reference: None, details: details.into() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
