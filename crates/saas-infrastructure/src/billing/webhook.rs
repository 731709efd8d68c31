//! Stripe webhook verification and event decoding
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`.
//! Each `v1` is an HMAC-SHA256 of `"{t}.{raw body}"` keyed by the endpoint
//! secret; one match within the tolerance window accepts the payload.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use saas_core::billing_provider::ProviderSubscription;

use super::wire::SubscriptionWire;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Malformed signature header")]
    MalformedHeader,

    #[error("No signature matches the payload")]
    SignatureMismatch,

    #[error("Signature timestamp outside tolerance")]
    TimestampOutsideTolerance,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `customer.subscription.updated` or `customer.subscription.deleted`.
    SubscriptionChanged(ProviderSubscription),
    /// Any other event type; acknowledged and ignored.
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_seconds: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_seconds,
        }
    }

    /// Verifies `signature_header` against `payload` at `now` (unix seconds).
    pub fn verify(&self, payload: &[u8], signature_header: &str, now: i64) -> Result<(), WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| WebhookError::MalformedHeader)?)
                }
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::MalformedHeader)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            warn!("Webhook signature mismatch");
            return Err(WebhookError::SignatureMismatch);
        }

        if (now - timestamp).abs() > self.tolerance_seconds {
            warn!("Webhook timestamp {} outside tolerance at {}", timestamp, now);
            return Err(WebhookError::TimestampOutsideTolerance);
        }
        Ok(())
    }

    /// Verifies the payload and decodes the event it carries.
    pub fn construct_event(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent, WebhookError> {
        self.verify(payload, signature_header, Utc::now().timestamp())?;
        parse_event(payload)
    }

    /// Signature header for `payload` at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| WebhookError::MalformedHeader)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
    }
}

fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: EventEnvelope =
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

    match envelope.event_type.as_str() {
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            let wire: SubscriptionWire = serde_json::from_value(envelope.data.object)
                .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
            let subscription =
                ProviderSubscription::try_from(wire).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
            Ok(WebhookEvent::SubscriptionChanged(subscription))
        }
        other => {
            debug!("Ignoring webhook event {}", other);
            Ok(WebhookEvent::Ignored(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saas_core::domain::SubscriptionStatus;

    const SECRET: &str = "whsec_test";

    fn payload(event_type: &str) -> Vec<u8> {
        serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "data": {"object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": "canceled",
                "items": {"data": [{"price": {"id": "price_1", "product": "prod_1", "currency": "usd"}}]}
            }}
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_valid_signature_accepted() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.deleted");
        let header = verifier.sign(&body, 1_700_000_000).unwrap();

        assert!(verifier.verify(&body, &header, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.deleted");
        let header = verifier.sign(&body, 1_700_000_000).unwrap();
        let mut tampered = body.clone();
        tampered.push(b' ');

        assert_eq!(
            verifier.verify(&tampered, &header, 1_700_000_000),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_other_secret_rejected() {
        let body = payload("customer.subscription.updated");
        let header = WebhookVerifier::new("whsec_other", 300).sign(&body, 1_700_000_000).unwrap();

        assert_eq!(
            WebhookVerifier::new(SECRET, 300).verify(&body, &header, 1_700_000_000),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.updated");
        let header = verifier.sign(&body, 1_700_000_000).unwrap();

        assert_eq!(
            verifier.verify(&body, &header, 1_700_000_301),
            Err(WebhookError::TimestampOutsideTolerance)
        );
    }

    #[test]
    fn test_malformed_header() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.updated");

        assert_eq!(verifier.verify(&body, "garbage", 0), Err(WebhookError::MalformedHeader));
        assert_eq!(verifier.verify(&body, "t=abc,v1=00", 0), Err(WebhookError::MalformedHeader));
        assert_eq!(verifier.verify(&body, "t=1", 1), Err(WebhookError::MalformedHeader));
    }

    #[test]
    fn test_second_v1_signature_may_match() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.updated");
        let header = verifier.sign(&body, 1_700_000_000).unwrap();
        let valid = header.split("v1=").nth(1).unwrap();
        let rotated = format!("t=1700000000,v1={},v1={}", "ab".repeat(32), valid);

        assert!(verifier.verify(&body, &rotated, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_construct_subscription_event() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = payload("customer.subscription.deleted");
        let header = verifier.sign(&body, Utc::now().timestamp()).unwrap();

        match verifier.construct_event(&body, &header).unwrap() {
            WebhookEvent::SubscriptionChanged(subscription) => {
                assert_eq!(subscription.customer_id, "cus_1");
                assert_eq!(subscription.status, SubscriptionStatus::Canceled);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let verifier = WebhookVerifier::new(SECRET, 300);
        let body = br#"{"id":"evt_2","type":"invoice.paid","data":{"object":{}}}"#;
        let header = verifier.sign(body, Utc::now().timestamp()).unwrap();

        assert_eq!(
            verifier.construct_event(body, &header).unwrap(),
            WebhookEvent::Ignored("invoice.paid".into())
        );
    }
}
