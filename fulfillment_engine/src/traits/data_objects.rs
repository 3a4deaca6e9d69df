use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, PricedLineItem};

/// The result of a successful check-and-reserve: the stock has been taken, and these are the prices it was taken at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub total: Money,
    pub items: Vec<PricedLineItem>,
}

pub enum InsertOrderResult {
    /// Stock was reserved and a new order row was written.
    Inserted(Order),
    /// The idempotency key had already been applied. This is the order it produced. Nothing was changed.
    AlreadyExists(Order),
}

//--------------------------------------     Gateway types     ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// The gateway's reference to the buyer's payment instrument, e.g. a payment method id.
    pub instrument: String,
    pub amount: Money,
    pub currency: String,
    pub email: String,
    /// Forwarded to the gateway so that a retried request cannot charge the buyer twice.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    Succeeded,
    /// The gateway accepted the charge but has not settled it. Money may or may not move.
    Processing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResult {
    pub id: String,
    pub status: ChargeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedLineItem {
    pub product_id: String,
    pub name: String,
    pub unit_amount: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub email: String,
    pub currency: String,
    pub line_items: Vec<HostedLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedSession {
    pub id: String,
    pub url: String,
}
