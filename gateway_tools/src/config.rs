use std::time::Duration;

use log::*;
use sf_common::Secret;

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// Applied to every request. A request that exceeds it fails with [`crate::GatewayApiError::Timeout`].
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SF_GATEWAY_API_URL").unwrap_or_else(|_| {
            warn!("SF_GATEWAY_API_URL not set, using https://api.stripe.com as default");
            "https://api.stripe.com".to_string()
        });
        let secret_key = Secret::new(std::env::var("SF_GATEWAY_SECRET_KEY").unwrap_or_else(|_| {
            warn!("SF_GATEWAY_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let timeout = std::env::var("SF_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("Invalid value for SF_GATEWAY_TIMEOUT_MS: {s}. {e}")).ok()
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { api_url, secret_key, timeout }
    }
}
