//! Webhook signature generation and verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer for outbound webhook bodies.
///
/// The signature is the lowercase hex digest of the exact body bytes, so a
/// receiver can recompute it from the raw request body and its secret.
#[derive(Clone)]
pub struct WebhookSignature {
    secret: String,
}

impl std::fmt::Debug for WebhookSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSignature").finish_non_exhaustive()
    }
}

impl WebhookSignature {
    /// Create a signer with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Hex HMAC-SHA256 of the body
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take any size key");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a hex signature against the body
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        constant_time_compare(&self.sign(body), &signature.to_ascii_lowercase())
    }
}

/// Constant-time string comparison
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Header names used on outbound webhooks and worker responses
pub mod headers {
    /// Hex HMAC-SHA256 of the body
    pub const SIGNATURE: &str = "X-Webhook-Signature";

    /// RFC 3339 time the envelope was sealed
    pub const TIMESTAMP: &str = "X-Webhook-Timestamp";

    /// Event type of the body
    pub const EVENT_TYPE: &str = "X-Webhook-Event";

    /// Event ID, stable across redeliveries
    pub const WEBHOOK_ID: &str = "X-Webhook-Id";

    /// Set on worker responses the queue must not retry
    pub const NON_RETRYABLE: &str = "X-Queue-NonRetryable";
}
