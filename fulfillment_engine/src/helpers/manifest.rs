//! The item manifest carried in hosted checkout session metadata.
//!
//! When the buyer pays on the gateway's hosted page, the only data that comes back with the completion event is what
//! we put into the session's metadata. The manifest is the compact `[{"productId":"p1","quantity":2}]` form of the
//! line items. Gateways cap metadata values (500 characters for the usual providers), so oversized manifests are
//! refused at session creation instead of being silently truncated.
use serde_json::Value;
use thiserror::Error;

use crate::db_types::LineItem;

pub const MANIFEST_METADATA_KEY: &str = "items";
pub const EMAIL_METADATA_KEY: &str = "email";
pub const MAX_MANIFEST_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("The item manifest is {0} characters long, which exceeds the gateway metadata limit")]
    TooLong(usize),
    #[error("The item manifest is empty")]
    Empty,
    #[error("The item manifest could not be read. {0}")]
    Invalid(String),
}

pub fn encode_manifest(items: &[LineItem]) -> Result<String, ManifestError> {
    if items.is_empty() {
        return Err(ManifestError::Empty);
    }
    let manifest = serde_json::to_string(items).map_err(|e| ManifestError::Invalid(e.to_string()))?;
    if manifest.len() > MAX_MANIFEST_LEN {
        return Err(ManifestError::TooLong(manifest.len()));
    }
    Ok(manifest)
}

/// Reads a manifest out of a metadata value. Gateways return metadata values as strings, but a manifest that was
/// embedded as a JSON array is accepted too.
pub fn decode_manifest(value: &Value) -> Result<Vec<LineItem>, ManifestError> {
    let items: Vec<LineItem> = match value {
        Value::String(s) => serde_json::from_str(s),
        Value::Array(_) => serde_json::from_value(value.clone()),
        other => return Err(ManifestError::Invalid(format!("Expected a string or an array, got {other}"))),
    }
    .map_err(|e| ManifestError::Invalid(e.to_string()))?;
    if items.is_empty() {
        return Err(ManifestError::Empty);
    }
    Ok(items)
}
