use std::{fmt::Debug, time::Duration};

use log::*;
use sf_common::CURRENCY_CODE_LOWER;
use tokio::time::timeout;

use crate::{
    db_types::{AlertKind, Money, NewOrder, NewReconciliationAlert, Order, OrderStatusType},
    fe_api::{
        errors::{FinalizeError, OrderFlowError},
        order_finalizer::OrderFinalizer,
        order_objects::{FinalizeOutcome, OrderRequest, ValidOrderRequest},
    },
    traits::{ChargeRequest, ChargeStatus, FulfillmentDatabase, GatewayError, InventoryError, PaymentGateway},
};

pub const DEFAULT_CHARGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Places an order by charging the buyer's payment instrument directly, then finalizing the order.
///
/// Requests that carry an idempotency key can be retried safely: the key is forwarded to the gateway, so the buyer is
/// charged at most once, and the finalizer returns the original order on a repeat.
pub struct DirectOrderApi<B, G> {
    finalizer: OrderFinalizer<B>,
    gateway: G,
    charge_timeout: Duration,
}

impl<B, G> Debug for DirectOrderApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirectOrderApi")
    }
}

impl<B, G> DirectOrderApi<B, G> {
    pub fn new(finalizer: OrderFinalizer<B>, gateway: G) -> Self {
        Self { finalizer, gateway, charge_timeout: DEFAULT_CHARGE_TIMEOUT }
    }

    pub fn with_charge_timeout(mut self, charge_timeout: Duration) -> Self {
        self.charge_timeout = charge_timeout;
        self
    }
}

impl<B, G> DirectOrderApi<B, G>
where
    B: FulfillmentDatabase,
    G: PaymentGateway,
{
    pub async fn submit(&self, request: OrderRequest) -> Result<Order, OrderFlowError> {
        let request = request.validate()?;
        let dedup_key = request.idempotency_key.as_ref().map(|k| format!("direct:{k}"));
        if let Some(key) = dedup_key.as_deref() {
            if let Some(order) = self.finalizer.already_applied(key).await? {
                info!("🛒️ Request {key} was already processed as order {} ({})", order.id, order.status);
                return settled(order);
            }
        }
        let total = self.finalizer.db().quote(&request.items).await?;
        debug!("🛒️ Charging {} {total} for {} line items", request.email, request.items.len());
        let charge_request = ChargeRequest {
            instrument: request.payment_instrument.clone(),
            amount: total,
            currency: CURRENCY_CODE_LOWER.to_string(),
            email: request.email.clone(),
            idempotency_key: request.idempotency_key.as_ref().map(|k| format!("charge:{k}")),
        };
        let charge = match timeout(self.charge_timeout, self.gateway.charge(charge_request)).await {
            Ok(Ok(charge)) => charge,
            Ok(Err(GatewayError::Timeout)) | Err(_) => {
                return Err(self.outcome_unknown(&request, total, None).await);
            },
            Ok(Err(e)) => {
                info!("🛒️ Charge for {} was not taken. {e}", request.email);
                return Err(OrderFlowError::Gateway(e));
            },
        };
        match charge.status {
            ChargeStatus::Succeeded => debug!("🛒️ Charge {} succeeded", charge.id),
            ChargeStatus::Processing => return Err(self.outcome_unknown(&request, total, Some(&charge.id)).await),
            ChargeStatus::Failed => {
                return Err(OrderFlowError::Gateway(GatewayError::Declined(format!("Charge {} failed", charge.id))));
            },
        }
        let key = dedup_key.unwrap_or_else(|| format!("charge:{}", charge.id));
        let order = NewOrder::new(request.email.clone(), request.items.clone())
            .with_payment_ref(charge.id.clone())
            .with_idempotency_key(key);
        match self.finalizer.finalize(order.clone()).await {
            Ok(FinalizeOutcome::Created(order)) => Ok(order),
            Ok(FinalizeOutcome::AlreadyApplied(order)) => settled(order),
            Err(FinalizeError::Inventory(e)) => {
                self.compensate(order, total, &charge.id, &e).await;
                Err(OrderFlowError::Inventory(e))
            },
            Err(e) => {
                error!("🛒️ Charge {} was taken, but the order could not be stored. {e}", charge.id);
                Err(e.into())
            },
        }
    }

    /// The gateway may or may not have taken the money. Flag it for an operator.
    async fn outcome_unknown(
        &self,
        request: &ValidOrderRequest,
        total: Money,
        charge_id: Option<&str>,
    ) -> OrderFlowError {
        let details = match charge_id {
            Some(id) => format!("Charge {id} of {total} for {} is still processing", request.email),
            None => format!("The gateway did not answer a charge of {total} for {} in time", request.email),
        };
        error!("🛒️ {details}");
        let mut alert = NewReconciliationAlert::new(AlertKind::ChargeOutcomeUnknown, details.clone())
            .with_email(request.email.clone());
        if let Some(reference) = charge_id.map(String::from).or_else(|| request.idempotency_key.clone()) {
            alert = alert.with_reference(reference);
        }
        if let Err(e) = self.finalizer.record_alert(alert).await {
            error!("🛒️ Could not record the charge outcome alert. {e}");
        }
        OrderFlowError::PaymentOutcomeUnknown(details)
    }

    /// The buyer paid, but stock ran out between the quote and the reservation. The charge stands, so leave a `Failed`
    /// order and an alert for an operator to refund. The request's key is bound to the `Failed` order, so a retry of
    /// the same request is refused.
    async fn compensate(&self, order: NewOrder, total: Money, charge_id: &str, error: &InventoryError) {
        error!("🛒️ Charge {charge_id} was taken, but the order cannot be fulfilled. It was NOT refunded. {error}");
        let email = order.email.clone();
        match self.finalizer.record_failed_order(order, total).await {
            Ok(failed) => debug!("🛒️ Failed order {} recorded for charge {charge_id}", failed.id),
            Err(e) => error!("🛒️ Could not record the failed order for charge {charge_id}. {e}"),
        }
        let alert = NewReconciliationAlert::new(
            AlertKind::UnreversedCharge,
            format!("Charge {charge_id} of {total} was taken, but the order could not be fulfilled. {error}"),
        )
        .with_email(email)
        .with_reference(charge_id);
        if let Err(e) = self.finalizer.record_alert(alert).await {
            error!("🛒️ Could not record the unreversed charge alert for {charge_id}. {e}");
        }
    }
}

/// A request whose key is bound to a `Failed` order is not fulfilled again. Its charge is waiting on an operator.
fn settled(order: Order) -> Result<Order, OrderFlowError> {
    match order.status {
        OrderStatusType::Failed => Err(OrderFlowError::AlreadyFailed(order.id)),
        _ => Ok(order),
    }
}
