//! Outbound webhook calls

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Result, SignedEnvelope, WebhookConfig};

/// Why an outbound call did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("destination responded with status {0}")]
    Status(u16),

    #[error("payload too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    #[error("invalid destination URL: {0}")]
    InvalidUrl(String),
}

impl DeliveryError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TooLarge { .. } | Self::InvalidUrl(_))
    }
}

/// Sends signed envelopes to tenant endpoints with a bounded timeout
#[derive(Debug, Clone)]
pub struct WebhookSender {
    config: WebhookConfig,
    http_client: Client,
}

impl WebhookSender {
    /// Create a sender; fails if the HTTP client cannot be built
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// POST the envelope to `url`; returns the destination's status on success
    pub async fn send(
        &self,
        url: &str,
        envelope: &SignedEnvelope,
    ) -> std::result::Result<u16, DeliveryError> {
        if envelope.body.len() > self.config.max_payload_size {
            return Err(DeliveryError::TooLarge {
                size: envelope.body.len(),
                max: self.config.max_payload_size,
            });
        }

        let url = url::Url::parse(url).map_err(|e| DeliveryError::InvalidUrl(e.to_string()))?;

        let mut request = self.http_client.post(url.clone());
        for (name, value) in envelope.headers() {
            request = request.header(name, value);
        }

        let response = request.body(envelope.body.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout(self.config.timeout_secs)
            } else {
                DeliveryError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            debug!(url = %url, status, "webhook accepted");
            Ok(status)
        } else {
            warn!(url = %url, status, "webhook rejected by destination");
            Err(DeliveryError::Status(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsline_events::EventBuilder;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn envelope() -> SignedEnvelope {
        let event = EventBuilder::new("order.created", "t-1", "o-1").build();
        SignedEnvelope::seal(&event, Some("secret")).unwrap()
    }

    #[tokio::test]
    async fn test_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let sender = WebhookSender::new(WebhookConfig::default()).unwrap();
        let status = sender
            .send(&format!("{}/hook", server.uri()), &envelope())
            .await
            .unwrap();
        assert_eq!(status, 204);
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let sender = WebhookSender::new(WebhookConfig::default()).unwrap();
        let err = sender.send(&server.uri(), &envelope()).await.unwrap_err();
        assert_eq!(err, DeliveryError::Status(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let sender = WebhookSender::new(WebhookConfig::default().with_timeout_secs(1)).unwrap();
        let err = sender.send(&server.uri(), &envelope()).await.unwrap_err();
        assert_eq!(err, DeliveryError::Timeout(1));
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let sender =
            WebhookSender::new(WebhookConfig::default().with_max_payload_size(10)).unwrap();
        let err = sender
            .send("http://localhost:9999/webhook", &envelope())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::TooLarge { max: 10, .. }));
        assert!(!err.is_retryable());
    }
}
