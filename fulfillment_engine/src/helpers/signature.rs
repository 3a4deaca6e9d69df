//! # Webhook signature format
//!
//! The payment gateway signs every webhook delivery so that nobody else can tell us that an order has been paid for.
//!
//! The signature travels in a single request header:
//!
//! ```text
//!    t=1718000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! where
//!   * `t` is the unix timestamp (seconds) at which the gateway signed the delivery.
//!   * `v1` is the lowercase hex encoding of `HMAC-SHA256(secret, "{t}.{raw_body}")`.
//!
//! During secret rotation the gateway sends one `v1` entry per active secret, so any matching entry is accepted.
//! Entries with other schemes (e.g. `v0`) are ignored. The timestamp must be within the tolerance window of the
//! current time, which limits the usefulness of a replayed delivery.
//!
//! Verification works on the raw body bytes. Parsing and re-serializing the JSON before checking would change the
//! bytes and break the signature.
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::*;
use sf_common::Secret;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The signature header is missing")]
    MissingHeader,
    #[error("The signature header is malformed. {0}")]
    MalformedHeader(String),
    #[error("The signature timestamp is outside the tolerance window")]
    TimestampOutOfTolerance,
    #[error("No signature in the header matches the payload")]
    NoMatchingSignature,
    #[error("No webhook secret has been configured")]
    NoSecretConfigured,
}

#[derive(Clone, Debug)]
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        self.verify_at(payload, header, Utc::now())
    }

    /// Checks the signature header against `payload`, treating `now` as the current time.
    pub fn verify_at(&self, payload: &[u8], header: Option<&str>, now: DateTime<Utc>) -> Result<(), SignatureError> {
        if self.secret.is_empty() {
            error!("🪝️ A webhook arrived, but no webhook secret is configured. It has been rejected.");
            return Err(SignatureError::NoSecretConfigured);
        }
        let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(SignatureError::MissingHeader)?;
        let (timestamp, signatures) = parse_header(header)?;
        let age = now.timestamp().abs_diff(timestamp);
        if age > self.tolerance.as_secs() {
            debug!("🪝️ Signature timestamp {timestamp} is {age}s away from now");
            return Err(SignatureError::TimestampOutOfTolerance);
        }
        let matched = signatures.iter().any(|sig| {
            let mac = self.mac(timestamp, payload);
            // verify_slice compares in constant time
            hex::decode(sig).map(|bytes| mac.verify_slice(&bytes).is_ok()).unwrap_or(false)
        });
        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    /// Produces a header value that [`Self::verify_at`] accepts for `payload` at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let mac = self.mac(timestamp, payload);
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.reveal().as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC can take a key of any size"));
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or_else(|| SignatureError::MalformedHeader(format!("'{part}' is not a key=value pair")))?;
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::MalformedHeader(format!("'{value}' is not a valid timestamp")))?;
                timestamp = Some(t);
            },
            "v1" => signatures.push(value),
            _ => trace!("🪝️ Ignoring signature scheme {key}"),
        }
    }
    let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("No timestamp".into()))?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader("No v1 signature".into()));
    }
    Ok((timestamp, signatures))
}
