//! Configuration for outbound delivery and the durable queue

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound webhook settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Timeout for the call to the tenant endpoint, in seconds
    pub timeout_secs: u64,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Maximum serialized event size in bytes
    pub max_payload_size: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("Opsline-Webhooks/{}", env!("CARGO_PKG_VERSION")),
            max_payload_size: 1024 * 1024, // 1MB
        }
    }
}

impl WebhookConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Set the timeout in seconds
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set maximum payload size
    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }
}

/// Durable queue settings.
///
/// The queue publishes with `POST {publish_url}/{destination}` and later
/// calls `destination` (the delivery worker) with a signed JWT in
/// `signature_header`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Base publish endpoint of the queue service
    pub publish_url: String,

    /// Bearer token for publishing
    pub token: Option<String>,

    /// Public URL of the delivery worker
    pub destination: String,

    /// Retry budget handed to the queue with each job
    pub max_retries: u32,

    /// Header carrying the queue's JWT on worker calls
    pub signature_header: String,

    /// Header carrying how many times the queue already retried
    pub retried_header: String,

    /// Header telling the queue how many retries to attempt
    pub retries_header: String,

    /// Key the queue currently signs with
    pub current_signing_key: Option<String>,

    /// Key the queue will sign with after rotation
    pub next_signing_key: Option<String>,

    /// Expected `iss` claim; unchecked when `None`
    pub issuer: Option<String>,

    /// Clock skew allowed on `exp`/`nbf`, in seconds
    pub leeway_secs: u64,
}

impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("QueueConfig")
            .field("publish_url", &self.publish_url)
            .field("token", &redact(&self.token))
            .field("destination", &self.destination)
            .field("max_retries", &self.max_retries)
            .field("signature_header", &self.signature_header)
            .field("retried_header", &self.retried_header)
            .field("retries_header", &self.retries_header)
            .field("current_signing_key", &redact(&self.current_signing_key))
            .field("next_signing_key", &redact(&self.next_signing_key))
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            publish_url: "http://localhost:8080/v2/publish".to_string(),
            token: None,
            destination: "http://localhost:3000/webhooks/deliver".to_string(),
            max_retries: 3,
            signature_header: "Upstash-Signature".to_string(),
            retried_header: "Upstash-Retried".to_string(),
            retries_header: "Upstash-Retries".to_string(),
            current_signing_key: None,
            next_signing_key: None,
            issuer: None,
            leeway_secs: 5,
        }
    }
}

impl QueueConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publish_url(mut self, url: impl Into<String>) -> Self {
        self.publish_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = url.into();
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the current and next signing keys
    pub fn with_signing_keys(
        mut self,
        current: impl Into<String>,
        next: Option<impl Into<String>>,
    ) -> Self {
        self.current_signing_key = Some(current.into());
        self.next_signing_key = next.map(Into::into);
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Whether any signing key is configured
    pub fn has_signing_keys(&self) -> bool {
        [&self.current_signing_key, &self.next_signing_key]
            .into_iter()
            .flatten()
            .any(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.max_payload_size, 1024 * 1024);

        let queue = QueueConfig::default();
        assert_eq!(queue.max_retries, 3);
        assert!(!queue.has_signing_keys());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let queue: QueueConfig =
            serde_json::from_str(r#"{"max_retries": 5, "current_signing_key": "k1"}"#).unwrap();
        assert_eq!(queue.max_retries, 5);
        assert!(queue.has_signing_keys());
        assert_eq!(queue.signature_header, "Upstash-Signature");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let queue = QueueConfig::new()
            .with_token("tok")
            .with_signing_keys("key-a", Some("key-b"));
        let debug = format!("{:?}", queue);
        assert!(!debug.contains("key-a"));
        assert!(!debug.contains("tok\""));
    }
}
