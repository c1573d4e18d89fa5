//! Queue-backed webhook delivery for Opsline
//!
//! Webhooks are delivered in two hops. The [`WebhookChannel`] (part of the
//! notification fan-out) only wraps the event in a [`QueuedDeliveryJob`] and
//! hands it to a [`DurableQueue`]. Later, the queue calls the
//! [`DeliveryWorker`], which authenticates the call, re-reads the tenant's
//! [`WebhookSubscription`], signs the body and POSTs it to the tenant. Retry
//! scheduling belongs to the queue alone; the worker only reports whether a
//! retry makes sense.
//!
//! ## Features
//!
//! - **HMAC signing** - `X-Webhook-Signature` is the hex HMAC-SHA256 of the exact body
//! - **Key rotation** - queue signatures verify against a current and a next key
//! - **Fresh subscriptions** - URL and secret are read on every attempt
//! - **Dead letters** - deliveries that exhaust the retry budget are recorded
//!
//! ## Verifying on the receiving side
//!
//! ```rust
//! use opsline_webhooks::WebhookSignature;
//!
//! let body = br#"{"event_type":"order.created"}"#;
//! let signature = WebhookSignature::new("whsec_abc").sign(body);
//!
//! // The receiver recomputes it from the raw body and its copy of the secret
//! assert!(WebhookSignature::new("whsec_abc").verify(body, &signature));
//! ```

mod auth;
mod channel;
mod config;
mod deadletter;
mod envelope;
mod error;
mod queue;
mod sender;
mod signature;
mod subscription;
mod worker;

pub use auth::{QueueAuthenticator, QueueClaims, QueueSigner, body_digest};
pub use channel::WebhookChannel;
pub use config::{QueueConfig, WebhookConfig};
pub use deadletter::{DeadLetter, DeadLetterSink, InMemoryDeadLetterSink, LogDeadLetterSink};
pub use envelope::SignedEnvelope;
pub use error::WebhookError;
pub use queue::{DurableQueue, HttpQueueClient, InMemoryQueue, QueuedDeliveryJob};
pub use sender::{DeliveryError, WebhookSender};
pub use signature::{WebhookSignature, headers};
pub use subscription::{InMemorySubscriptionStore, SubscriptionStore, WebhookSubscription};
pub use worker::{DeliveryWorker, WorkerRequest, WorkerResponse};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
