use std::time::Duration;

use fulfillment_engine::{
    db_types::Order,
    events::{EventHandlers, EventHooks, OrderPaidEvent, ReconciliationAlertEvent},
};
use log::*;
use serde::Serialize;
use thiserror::Error;

pub const NOTIFIER_EVENT_BUFFER_SIZE: usize = 25;
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Could not initialize the mail relay client. {0}")]
    Initialization(String),
    #[error("Could not reach the mail relay. {0}")]
    RelayUnreachable(String),
    #[error("The mail relay refused the message. Error {status}. {message}")]
    RelayRefused { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Sends order confirmations to buyers.
///
/// When a mail relay is configured, each receipt is POSTed to it as JSON. Otherwise the receipt is only logged, which
/// is enough for development and for shops that send mail some other way.
#[derive(Clone)]
pub struct ReceiptNotifier {
    relay_url: Option<String>,
    client: reqwest::Client,
}

impl ReceiptNotifier {
    pub fn new(relay_url: Option<String>) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .map_err(|e| NotifierError::Initialization(e.to_string()))?;
        Ok(Self { relay_url, client })
    }

    pub async fn send(&self, email: &str, summary: &str) -> Result<(), NotifierError> {
        let receipt = Receipt {
            to: email.to_string(),
            subject: "Your order confirmation".to_string(),
            body: summary.to_string(),
        };
        let Some(url) = &self.relay_url else {
            info!("📧️ Receipt for {email}:\n{summary}");
            return Ok(());
        };
        let response = self
            .client
            .post(url)
            .json(&receipt)
            .send()
            .await
            .map_err(|e| NotifierError::RelayUnreachable(e.to_string()))?;
        if response.status().is_success() {
            debug!("📧️ Receipt sent to {email}");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(NotifierError::RelayRefused { status, message })
        }
    }
}

/// The plain-text confirmation sent to the buyer.
pub fn receipt_summary(order: &Order) -> String {
    let mut summary = format!("Thank you for your order!\n\nOrder {}\n", order.id);
    match order.line_items() {
        Ok(items) => {
            for item in items {
                summary.push_str(&format!("  {} x {}\n", item.quantity, item.product_id));
            }
        },
        Err(e) => warn!("📧️ Could not list the items of order {} in its receipt. {e}", order.id),
    }
    summary.push_str(&format!("Total: {}\n", order.total));
    summary
}

/// Assigns event handlers for buyer and operator notifications.
///
/// 1. OrderPaidEvent - A receipt is sent to the buyer. If it cannot be sent, the failure is logged. The order stands.
/// 2. ReconciliationAlertEvent - The alert is written to the error log so that it shows up in whatever the operator
///    watches. The alert itself is already stored by the time the event arrives.
pub fn create_notifier_event_handlers(notifier: ReceiptNotifier) -> EventHandlers {
    let mut hooks = EventHooks::default();
    // --- On OrderPaid Handler ---
    hooks.on_order_paid(move |ev: OrderPaidEvent| {
        let notifier = notifier.clone();
        Box::pin(async move {
            let order = ev.order;
            let summary = receipt_summary(&order);
            match notifier.send(&order.email, &summary).await {
                Ok(()) => info!("📧️ Receipt for order {} delivered to {}", order.id, order.email),
                Err(e) => error!("📧️ Could not send the receipt for order {} to {}. {e}", order.id, order.email),
            }
        })
    });
    // --- On ReconciliationAlert Handler ---
    hooks.on_reconciliation_alert(|ev: ReconciliationAlertEvent| {
        Box::pin(async move {
            let alert = ev.alert;
            error!(
                "🚨️ Reconciliation alert #{} ({}). Email: {}. Reference: {}. {}",
                alert.id,
                alert.kind,
                alert.email.as_deref().unwrap_or("none"),
                alert.reference.as_deref().unwrap_or("none"),
                alert.details
            );
        })
    });
    EventHandlers::new(NOTIFIER_EVENT_BUFFER_SIZE, hooks)
}
