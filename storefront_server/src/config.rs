use std::{env, time::Duration};

use fulfillment_engine::{helpers::DEFAULT_TOLERANCE, CheckoutUrls};
use gateway_tools::GatewayConfig;
use log::*;
use sf_common::{parse_boolean_flag, Secret};

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8370;
const DEFAULT_SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// A JSON file of products that is upserted into the catalog when the server starts.
    pub catalog_file: Option<String>,
    pub gateway: GatewayConfig,
    pub webhook: WebhookConfig,
    pub checkout_urls: CheckoutUrls,
    /// Receipts are POSTed here. When it is not set, receipts are written to the log instead.
    pub mail_relay_url: Option<String>,
    pub operator: OperatorConfig,
}

/// The operator routes (alert log, reconciliation) are only mounted when they are switched on AND an API key is set.
#[derive(Clone, Debug, Default)]
pub struct OperatorConfig {
    pub enabled: bool,
    /// Operators send this as a bearer token.
    pub api_key: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub secret: Secret<String>,
    /// The request header that carries the signature.
    pub signature_header: String,
    /// Signatures older (or newer) than this are refused.
    pub tolerance: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: Secret::default(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: String::default(),
            catalog_file: None,
            gateway: GatewayConfig::default(),
            webhook: WebhookConfig::default(),
            checkout_urls: CheckoutUrls::default(),
            mail_relay_url: None,
            operator: OperatorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = env::var("SF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SF_PORT. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                    DEFAULT_SF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SF_PORT);
        let database_url = env::var("SF_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SF_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let catalog_file = env::var("SF_CATALOG_FILE").ok().filter(|s| !s.trim().is_empty());
        if catalog_file.is_none() {
            info!("🪛️ SF_CATALOG_FILE is not set. The catalog will not be seeded at start-up.");
        }
        let gateway = GatewayConfig::new_from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default();
        let checkout_urls = checkout_urls_from_env();
        let mail_relay_url = env::var("SF_MAIL_RELAY_URL").ok().filter(|s| !s.trim().is_empty());
        if mail_relay_url.is_none() {
            info!("🪛️ SF_MAIL_RELAY_URL is not set. Receipts will be logged, but not sent.");
        }
        let operator = OperatorConfig::from_env_or_default();
        Self { host, port, database_url, catalog_file, gateway, webhook, checkout_urls, mail_relay_url, operator }
    }
}

impl OperatorConfig {
    pub fn from_env_or_default() -> Self {
        let enabled = env::var("SF_OPERATOR_ROUTES").ok();
        let api_key = env::var("SF_OPERATOR_API_KEY").ok();
        Self::from_values(enabled.as_deref(), api_key)
    }

    pub fn from_values(enabled: Option<&str>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        match (parse_boolean_flag(enabled, false), api_key) {
            (true, Some(key)) => {
                info!("🪛️ Operator routes are enabled under /operator.");
                Self { enabled: true, api_key: Secret::new(key) }
            },
            (true, None) => {
                error!(
                    "🪛️ SF_OPERATOR_ROUTES is switched on, but SF_OPERATOR_API_KEY is not set. The operator \
                     routes will not be available."
                );
                Self::default()
            },
            (false, _) => {
                info!("🪛️ Operator routes are disabled. Set SF_OPERATOR_ROUTES=1 to enable them.");
                Self::default()
            },
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("SF_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SF_WEBHOOK_SECRET is not set. Please set it to the webhook signing secret for your gateway \
                 account. All webhook calls will be refused until it is set."
            );
            String::default()
        });
        let signature_header = env::var("SF_WEBHOOK_SIGNATURE_HEADER").ok().unwrap_or_else(|| {
            info!("🪛️ SF_WEBHOOK_SIGNATURE_HEADER is not set. Using {DEFAULT_SIGNATURE_HEADER}.");
            DEFAULT_SIGNATURE_HEADER.to_string()
        });
        let tolerance = env::var("SF_WEBHOOK_TOLERANCE_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ SF_WEBHOOK_TOLERANCE_SECS is not set. Using the default value of {} s.",
                    DEFAULT_TOLERANCE.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SF_WEBHOOK_TOLERANCE_SECS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_TOLERANCE);
        Self { secret: Secret::new(secret), signature_header, tolerance }
    }
}

fn checkout_urls_from_env() -> CheckoutUrls {
    let success_url = env::var("SF_CHECKOUT_SUCCESS_URL").ok().unwrap_or_else(|| {
        warn!("🪛️ SF_CHECKOUT_SUCCESS_URL is not set. Buyers will be returned to a placeholder page.");
        "https://example.com/checkout/success".to_string()
    });
    let cancel_url = env::var("SF_CHECKOUT_CANCEL_URL").ok().unwrap_or_else(|| {
        warn!("🪛️ SF_CHECKOUT_CANCEL_URL is not set. Buyers will be returned to a placeholder page.");
        "https://example.com/checkout/cancel".to_string()
    });
    CheckoutUrls { success_url, cancel_url }
}
