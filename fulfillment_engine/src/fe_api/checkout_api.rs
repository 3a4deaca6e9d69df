use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use log::*;
use sf_common::CURRENCY_CODE_LOWER;
use tokio::time::timeout;

use crate::{
    db_types::LineItem,
    fe_api::{
        errors::CheckoutError,
        order_objects::{is_plausible_email, normalize_email},
    },
    helpers::{encode_manifest, EMAIL_METADATA_KEY, MANIFEST_METADATA_KEY},
    traits::{
        validate_line_items,
        GatewayError,
        HostedLineItem,
        HostedSession,
        InventoryError,
        InventoryManagement,
        PaymentGateway,
        SessionRequest,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Prepares hosted checkout sessions. The buyer pays on the gateway's page, and the order is created later, when the
/// completion event reaches the [`crate::WebhookProcessor`].
///
/// Nothing is reserved or stored here. The session carries its own item manifest, and stock is checked again when the
/// order is finalized.
pub struct CheckoutSessionApi<B, G> {
    db: B,
    gateway: G,
    urls: CheckoutUrls,
    timeout: Duration,
}

impl<B, G> Debug for CheckoutSessionApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutSessionApi")
    }
}

impl<B, G> CheckoutSessionApi<B, G> {
    pub fn new(db: B, gateway: G, urls: CheckoutUrls, timeout: Duration) -> Self {
        Self { db, gateway, urls, timeout }
    }
}

impl<B, G> CheckoutSessionApi<B, G>
where
    B: InventoryManagement,
    G: PaymentGateway,
{
    pub async fn create_session(&self, email: &str, items: &[LineItem]) -> Result<HostedSession, CheckoutError> {
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(CheckoutError::InvalidRequest(format!("'{email}' is not a valid email address")));
        }
        let merged = validate_line_items(items)?;
        let mut line_items = Vec::with_capacity(merged.len());
        for (product_id, quantity) in &merged {
            let product = self
                .db
                .fetch_product(product_id)
                .await?
                .ok_or_else(|| InventoryError::UnknownProduct(product_id.clone()))?;
            if product.stock < *quantity {
                return Err(CheckoutError::Inventory(InventoryError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: *quantity,
                    available: product.stock,
                }));
            }
            line_items.push(HostedLineItem {
                product_id: product.id,
                name: product.name,
                unit_amount: product.price,
                quantity: *quantity,
            });
        }
        let manifest_items = merged.into_iter().map(|(id, qty)| LineItem::new(id, qty)).collect::<Vec<_>>();
        let manifest = encode_manifest(&manifest_items)?;
        let metadata = BTreeMap::from([
            (MANIFEST_METADATA_KEY.to_string(), manifest),
            (EMAIL_METADATA_KEY.to_string(), email.clone()),
        ]);
        let request = SessionRequest {
            email: email.clone(),
            currency: CURRENCY_CODE_LOWER.to_string(),
            line_items,
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
            metadata,
        };
        let session = timeout(self.timeout, self.gateway.create_hosted_session(request))
            .await
            .map_err(|_| GatewayError::Timeout)??;
        info!("🧾️ Checkout session {} created for {email}", session.id);
        Ok(session)
    }
}
