use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::GatewayConfig,
    data_objects::{CheckoutSession, FormParams, NewCheckoutSession, NewPaymentIntent, PaymentIntent},
    GatewayApiError,
};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a form-encoded request. When `idempotency_key` is given, the gateway replays the original response for
    /// any repeat of the request instead of acting on it again.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &FormParams,
        idempotency_key: Option<&str>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.form(params);
        }
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_HEADER, key);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await?;
            Err(GatewayApiError::QueryError { status, message: error_message(&body) })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
        idempotency_key: Option<&str>,
    ) -> Result<PaymentIntent, GatewayApiError> {
        debug!("💳️ Charging {} {} to {}", intent.amount, intent.currency, intent.payment_method);
        let params = intent.to_form_params();
        let result =
            self.rest_query::<PaymentIntent>(Method::POST, "/v1/payment_intents", &params, idempotency_key).await?;
        info!("💳️ Payment intent {} is {:?}", result.id, result.status);
        Ok(result)
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
        idempotency_key: Option<&str>,
    ) -> Result<CheckoutSession, GatewayApiError> {
        debug!("💳️ Creating checkout session for {} ({} lines)", session.customer_email, session.line_items.len());
        let params = session.to_form_params();
        let result =
            self.rest_query::<CheckoutSession>(Method::POST, "/v1/checkout/sessions", &params, idempotency_key).await?;
        info!("💳️ Created checkout session {}", result.id);
        Ok(result)
    }
}

/// Error bodies look like `{"error": {"message": "...", ...}}`. Anything else is returned as is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}
