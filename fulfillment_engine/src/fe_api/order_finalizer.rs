use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Money, NewOrder, NewReconciliationAlert, Order, OrderId, OrderStatusType, ReconciliationAlert},
    events::{EventProducers, OrderPaidEvent, ReconciliationAlertEvent},
    fe_api::{errors::FinalizeError, order_objects::FinalizeOutcome},
    traits::{FulfillmentDatabase, InsertOrderResult},
};

/// `OrderFinalizer` is the only component that creates orders and takes stock. Both payment paths end here.
///
/// Finalization is idempotent per key: applying the same key any number of times, concurrently or not, produces
/// exactly one order and one stock decrement.
pub struct OrderFinalizer<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Clone> Clone for OrderFinalizer<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> Debug for OrderFinalizer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFinalizer")
    }
}

impl<B> OrderFinalizer<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFinalizer<B>
where B: FulfillmentDatabase
{
    /// Reserves stock for the order and persists it, all or nothing.
    ///
    /// If the order carries an idempotency key that has already been applied, the original order is returned as
    /// [`FinalizeOutcome::AlreadyApplied`] and inventory is not touched. Business-rule failures (unknown products,
    /// insufficient stock) leave no trace at all: no order, no dedup record and no stock change.
    ///
    /// A `Paid` order raises an [`OrderPaidEvent`]. Hooks run in the background and cannot affect the outcome.
    pub async fn finalize(&self, order: NewOrder) -> Result<FinalizeOutcome, FinalizeError> {
        if order.email.trim().is_empty() {
            return Err(FinalizeError::Validation("An order must have an email address".into()));
        }
        if let Some(existing) = self.already_applied_opt(order.idempotency_key.as_deref()).await? {
            debug!("📦️ Key {:?} was already applied to order {}", order.idempotency_key, existing.id);
            return Ok(FinalizeOutcome::AlreadyApplied(existing));
        }
        let key = order.idempotency_key.clone();
        match self.db.fulfil_order(order).await? {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {} created for {} ({}, {})", order.id, order.email, order.status, order.total);
                if order.status == OrderStatusType::Paid {
                    self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
                }
                Ok(FinalizeOutcome::Created(order))
            },
            InsertOrderResult::AlreadyExists(order) => {
                debug!("📦️ Lost the race for key {key:?}. Order {} already owns it", order.id);
                Ok(FinalizeOutcome::AlreadyApplied(order))
            },
        }
    }

    /// Returns the order produced by `key`, if the key has been applied.
    pub async fn already_applied(&self, key: &str) -> Result<Option<Order>, FinalizeError> {
        let order = self.db.fetch_order_for_key(key).await?;
        Ok(order)
    }

    async fn already_applied_opt(&self, key: Option<&str>) -> Result<Option<Order>, FinalizeError> {
        match key {
            Some(key) => self.already_applied(key).await,
            None => Ok(None),
        }
    }

    /// The newest order for `email` that is still holding stock. Used to recover item lists for payments that
    /// arrive without one.
    pub async fn latest_order_for_email(&self, email: &str) -> Result<Option<Order>, FinalizeError> {
        let order = self.db.fetch_latest_order_for_email(email).await?;
        Ok(order)
    }

    /// Records an order that was paid for but could not be fulfilled. No stock is taken.
    pub async fn record_failed_order(&self, order: NewOrder, total: Money) -> Result<Order, FinalizeError> {
        let order = self.db.insert_failed_order(order, total).await?;
        warn!("📦️ Order {} for {} recorded as Failed ({})", order.id, order.email, order.total);
        Ok(order)
    }

    /// Settles an order that is waiting on an operator. Accepting marks it `Paid` and raises an [`OrderPaidEvent`];
    /// rejecting marks it `Failed`.
    pub async fn resolve_reconciliation(&self, id: OrderId, accept: bool) -> Result<Order, FinalizeError> {
        let status = if accept { OrderStatusType::Paid } else { OrderStatusType::Failed };
        let order = self.db.update_order_status(id, status).await?;
        info!("📦️ Order {id} resolved as {status}");
        if order.status == OrderStatusType::Paid {
            self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// Writes an entry to the reconciliation alert log and raises a [`ReconciliationAlertEvent`].
    pub async fn record_alert(&self, alert: NewReconciliationAlert) -> Result<ReconciliationAlert, FinalizeError> {
        let alert = self.db.record_alert(alert).await?;
        self.producers.publish_alert(ReconciliationAlertEvent::new(alert.clone())).await;
        Ok(alert)
    }

    pub async fn alerts(&self) -> Result<Vec<ReconciliationAlert>, FinalizeError> {
        let alerts = self.db.fetch_alerts().await?;
        Ok(alerts)
    }
}
