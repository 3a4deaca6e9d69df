use serde::{Deserialize, Serialize};

use crate::db_types::{Order, ReconciliationAlert};

/// Raised once per order, when it reaches `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Raised whenever an inconsistency that needs an operator is written to the alert log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAlertEvent {
    pub alert: ReconciliationAlert,
}

impl ReconciliationAlertEvent {
    pub fn new(alert: ReconciliationAlert) -> Self {
        Self { alert }
    }
}
