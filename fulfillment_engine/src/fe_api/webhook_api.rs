use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{AlertKind, LineItem, NewOrder, NewReconciliationAlert, Order, OrderStatusType},
    fe_api::{
        errors::FinalizeError,
        order_finalizer::OrderFinalizer,
        order_objects::FinalizeOutcome,
        webhook_objects::{
            CheckoutSessionObject,
            GatewayEvent,
            WebhookAck,
            CHECKOUT_SESSION_ASYNC_PAYMENT_SUCCEEDED,
            CHECKOUT_SESSION_COMPLETED,
        },
    },
    helpers::{decode_manifest, WebhookVerifier, MANIFEST_METADATA_KEY},
    traits::FulfillmentDatabase,
};

/// Turns signed payment-confirmation events from the gateway into finalized orders.
///
/// The event id is the idempotency key, so redeliveries (which the gateway makes whenever it does not receive a
/// success response in time) never produce a second order.
pub struct WebhookProcessor<B> {
    finalizer: OrderFinalizer<B>,
    verifier: WebhookVerifier,
}

impl<B> Debug for WebhookProcessor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebhookProcessor")
    }
}

/// Where the item list of a paid session came from.
enum ItemSource {
    Manifest(Vec<LineItem>),
    /// Copied from an earlier order of the same buyer.
    History { items: Vec<LineItem>, source: Order },
}

impl<B> WebhookProcessor<B> {
    pub fn new(finalizer: OrderFinalizer<B>, verifier: WebhookVerifier) -> Self {
        Self { finalizer, verifier }
    }
}

impl<B> WebhookProcessor<B>
where B: FulfillmentDatabase
{
    /// Handles one webhook delivery. `raw_body` must be the exact bytes that were received.
    ///
    /// The signature is checked before anything else. A delivery that fails the check is never parsed, and causes no
    /// storage access.
    pub async fn handle(&self, raw_body: &[u8], signature_header: Option<&str>) -> WebhookAck {
        if let Err(e) = self.verifier.verify(raw_body, signature_header) {
            warn!("🪝️ Rejecting webhook delivery. {e}");
            return WebhookAck::Rejected(e);
        }
        let event = match serde_json::from_slice::<GatewayEvent>(raw_body) {
            Ok(event) => event,
            Err(e) => {
                warn!("🪝️ A correctly signed webhook could not be parsed. It will be ignored. {e}");
                return WebhookAck::Ignored(format!("Unreadable event. {e}"));
            },
        };
        trace!("🪝️ Received {} event {}", event.event_type, event.id);
        let event_type = event.event_type.as_str();
        if event_type != CHECKOUT_SESSION_COMPLETED && event_type != CHECKOUT_SESSION_ASYNC_PAYMENT_SUCCEEDED {
            debug!("🪝️ Ignoring {event_type} event {}", event.id);
            return WebhookAck::Ignored(format!("{event_type} events do not trigger fulfilment"));
        }
        let session = match serde_json::from_value::<CheckoutSessionObject>(event.data.object) {
            Ok(session) => session,
            Err(e) => {
                warn!("🪝️ Event {} does not contain a checkout session. {e}", event.id);
                return WebhookAck::Ignored(format!("Unreadable checkout session. {e}"));
            },
        };
        if event_type == CHECKOUT_SESSION_COMPLETED && session.payment_status.as_deref() == Some("unpaid") {
            info!("🪝️ Session {} is complete but not yet paid. Waiting for the async payment event", session.id);
            return WebhookAck::Ignored(format!("Session {} has not been paid yet", session.id));
        }
        self.fulfil_session(&event.id, session).await
    }

    async fn fulfil_session(&self, event_id: &str, session: CheckoutSessionObject) -> WebhookAck {
        match self.finalizer.already_applied(event_id).await {
            Ok(Some(order)) => {
                debug!("🪝️ Event {event_id} was already applied to order {}", order.id);
                return WebhookAck::Processed { order, duplicate: true };
            },
            Ok(None) => {},
            Err(e) => return WebhookAck::Retry(e.to_string()),
        }
        let email = session.email();
        let source = match self.item_source(event_id, &session, email.as_deref()).await {
            Ok(Some(source)) => source,
            Ok(None) => return WebhookAck::Acknowledged(format!("No item list could be found for event {event_id}")),
            Err(e) => return WebhookAck::Retry(e.to_string()),
        };
        let Some(email) = email else {
            return self.gap(event_id, &session, None, "The paid session has no usable email address").await;
        };
        let (items, status) = match &source {
            ItemSource::Manifest(items) => (items.clone(), OrderStatusType::Paid),
            ItemSource::History { items, .. } => (items.clone(), OrderStatusType::ReconciliationPending),
        };
        let order = NewOrder::new(email.clone(), items)
            .with_status(status)
            .with_payment_ref(session.id.clone())
            .with_idempotency_key(event_id);
        match self.finalizer.finalize(order).await {
            Ok(FinalizeOutcome::Created(order)) => {
                if let ItemSource::History { source, .. } = source {
                    self.note_recovery(event_id, &order, &source).await;
                }
                WebhookAck::Processed { order, duplicate: false }
            },
            Ok(FinalizeOutcome::AlreadyApplied(order)) => WebhookAck::Processed { order, duplicate: true },
            Err(e) if e.is_retryable() => {
                warn!("🪝️ Event {event_id} could not be stored and should be redelivered. {e}");
                WebhookAck::Retry(e.to_string())
            },
            Err(e) => self.unfulfillable(event_id, &session, &email, e).await,
        }
    }

    /// Reads the item list from the session metadata, falling back to the buyer's order history.
    ///
    /// `Ok(None)` means that nothing could be found. A `ReconciliationGap` alert has been recorded in that case.
    async fn item_source(
        &self,
        event_id: &str,
        session: &CheckoutSessionObject,
        email: Option<&str>,
    ) -> Result<Option<ItemSource>, FinalizeError> {
        match session.metadata_value(MANIFEST_METADATA_KEY).map(decode_manifest) {
            Some(Ok(items)) => return Ok(Some(ItemSource::Manifest(items))),
            Some(Err(e)) => warn!("🪝️ Session {} has an unusable item manifest. {e}", session.id),
            None => warn!("🪝️ Session {} carries no item manifest", session.id),
        }
        let Some(email) = email else {
            let details = "No item manifest, and no email to look up previous orders";
            self.record_gap(event_id, session, None, details).await?;
            return Ok(None);
        };
        let previous = self.finalizer.latest_order_for_email(email).await?;
        match previous.map(|order| (order.line_items(), order)) {
            Some((Ok(items), source)) if !items.is_empty() => {
                info!("🪝️ Recovered the item list for session {} from order {}", session.id, source.id);
                Ok(Some(ItemSource::History { items, source }))
            },
            Some((Err(e), source)) => {
                let details = format!("No item manifest, and order {} has unreadable items. {e}", source.id);
                self.record_gap(event_id, session, Some(email), &details).await?;
                Ok(None)
            },
            _ => {
                self.record_gap(event_id, session, Some(email), "No item manifest, and no previous order for the buyer")
                    .await?;
                Ok(None)
            },
        }
    }

    async fn record_gap(
        &self,
        event_id: &str,
        session: &CheckoutSessionObject,
        email: Option<&str>,
        details: &str,
    ) -> Result<(), FinalizeError> {
        error!("🪝️ Reconciliation gap for event {event_id} (session {}). {details}", session.id);
        let mut alert = NewReconciliationAlert::new(
            AlertKind::ReconciliationGap,
            format!("Checkout session {} was paid, but no order was created. {details}", session.id),
        )
        .with_reference(event_id);
        if let Some(email) = email {
            alert = alert.with_email(email);
        }
        self.finalizer.record_alert(alert).await?;
        Ok(())
    }

    async fn gap(
        &self,
        event_id: &str,
        session: &CheckoutSessionObject,
        email: Option<&str>,
        details: &str,
    ) -> WebhookAck {
        match self.record_gap(event_id, session, email, details).await {
            Ok(()) => WebhookAck::Acknowledged(details.to_string()),
            Err(e) => WebhookAck::Retry(e.to_string()),
        }
    }

    async fn note_recovery(&self, event_id: &str, order: &Order, source: &Order) {
        let alert = NewReconciliationAlert::new(
            AlertKind::RecoveredFromHistory,
            format!(
                "Order {} was built from the items of order {} because session {} carried no manifest. It is awaiting \
                 confirmation.",
                order.id,
                source.id,
                order.payment_ref.as_deref().unwrap_or("(unknown)")
            ),
        )
        .with_email(order.email.clone())
        .with_reference(event_id);
        if let Err(e) = self.finalizer.record_alert(alert).await {
            error!("🪝️ Could not record the recovery alert for order {}. {e}", order.id);
        }
    }

    async fn unfulfillable(
        &self,
        event_id: &str,
        session: &CheckoutSessionObject,
        email: &str,
        error: FinalizeError,
    ) -> WebhookAck {
        error!(
            "🪝️ Session {} was paid for, but cannot be fulfilled. The charge has NOT been reversed. {error}",
            session.id
        );
        let charge = match session.payment_intent_id() {
            Some(intent) => format!("Checkout session {} (payment {intent})", session.id),
            None => format!("Checkout session {}", session.id),
        };
        let alert = NewReconciliationAlert::new(
            AlertKind::UnreversedCharge,
            format!("{charge} was paid, but could not be fulfilled. {error}"),
        )
        .with_email(email)
        .with_reference(event_id);
        match self.finalizer.record_alert(alert).await {
            Ok(_) => WebhookAck::Acknowledged(format!("Session {} could not be fulfilled. {error}", session.id)),
            Err(e) => WebhookAck::Retry(e.to_string()),
        }
    }
}
