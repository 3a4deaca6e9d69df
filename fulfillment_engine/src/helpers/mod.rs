mod manifest;
mod signature;

pub use manifest::{decode_manifest, encode_manifest, ManifestError, EMAIL_METADATA_KEY, MANIFEST_METADATA_KEY};
pub use signature::{SignatureError, WebhookVerifier, DEFAULT_TOLERANCE};
