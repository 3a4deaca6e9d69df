use chrono::Utc;
use fulfillment_engine::helpers::{WebhookVerifier, DEFAULT_TOLERANCE};
use serde_json::{json, Value};
use sf_common::Secret;

pub const WEBHOOK_SECRET: &str = "whsec_test_5ecret";

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()), DEFAULT_TOLERANCE)
}

/// A signature header for `body`, as the gateway would send it right now.
pub fn sign(body: &[u8]) -> String {
    verifier().sign(body, Utc::now().timestamp())
}

pub fn event(event_id: &str, event_type: &str, object: Value) -> Vec<u8> {
    let event = json!({
        "id": event_id,
        "object": "event",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": { "object": object }
    });
    serde_json::to_vec(&event).expect("Could not serialize event")
}

pub fn completed_session(event_id: &str, session_id: &str, email: Option<&str>, metadata: Value) -> Vec<u8> {
    let object = json!({
        "id": session_id,
        "object": "checkout.session",
        "customer_email": email,
        "payment_status": "paid",
        "payment_intent": "pi_123",
        "metadata": metadata
    });
    event(event_id, "checkout.session.completed", object)
}
