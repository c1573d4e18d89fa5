//! Error types for webhook operations

use thiserror::Error;

/// Errors that can occur during webhook operations
#[derive(Error, Debug)]
pub enum WebhookError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Queue signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Queue signature missing from request
    #[error("Signature missing from request")]
    SignatureMissing,

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// The durable queue refused the job
    #[error("Queue rejected job with status {status}: {message}")]
    QueueRejected { status: u16, message: String },

    /// Subscription lookup failed
    #[error("Subscription store error: {0}")]
    SubscriptionStore(String),

    /// Dead-letter sink failed
    #[error("Dead-letter sink error: {0}")]
    DeadLetterSink(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::PayloadError(err.to_string())
    }
}

impl From<opsline_events::EventError> for WebhookError {
    fn from(err: opsline_events::EventError) -> Self {
        WebhookError::PayloadError(err.to_string())
    }
}
