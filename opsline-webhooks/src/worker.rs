//! Delivery worker
//!
//! The endpoint the durable queue calls for each job. It is framework
//! agnostic: adapt a [`WorkerRequest`] from whatever HTTP server hosts it and
//! write the [`WorkerResponse`] back.
//!
//! | Status | Meaning | Queue retries |
//! |---|---|---|
//! | 200 | delivered, or skipped because the tenant has no URL | no |
//! | 400 | malformed job or undeliverable payload | no |
//! | 401 | bad or missing queue signature | no |
//! | 500 | destination failed or unreachable | yes |
//!
//! The worker keeps no state between calls, so the queue invoking it twice
//! for the same job only means the destination sees the event twice.

use chrono::Utc;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    DeadLetter, DeadLetterSink, DeliveryError, LogDeadLetterSink, QueueAuthenticator, QueueConfig,
    QueuedDeliveryJob, Result, SignedEnvelope, SubscriptionStore, WebhookConfig, WebhookSender,
    headers,
};

/// An incoming call from the queue
#[derive(Debug, Clone, Default)]
pub struct WorkerRequest {
    headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl WorkerRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header; names are case-insensitive
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Build from raw header pairs
    pub fn from_parts<I, K, V>(headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(Self::new(body), |request, (k, v)| request.header(k, v))
    }

    /// Look up a header value
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// The worker's answer to the queue
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl WorkerResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    fn non_retryable(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![(headers::NON_RETRYABLE.to_string(), "true".to_string())],
            body: json!({ "error": error.into() }),
        }
    }

    fn retry(error: impl Into<String>) -> Self {
        Self {
            status: 500,
            headers: Vec::new(),
            body: json!({ "error": error.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the queue should schedule another attempt
    pub fn is_retryable(&self) -> bool {
        !self.is_success()
            && !self
                .headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(headers::NON_RETRYABLE))
    }
}

/// Queue-invoked webhook delivery endpoint
pub struct DeliveryWorker {
    auth: QueueAuthenticator,
    subscriptions: Arc<dyn SubscriptionStore>,
    sender: WebhookSender,
    dead_letters: Arc<dyn DeadLetterSink>,
    signature_header: String,
    retried_header: String,
    max_retries: u32,
}

impl DeliveryWorker {
    /// Create a worker. Dead letters go to the log until a sink is set.
    pub fn new(
        queue: &QueueConfig,
        webhook: WebhookConfig,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Result<Self> {
        Ok(Self {
            auth: QueueAuthenticator::new(queue),
            subscriptions,
            sender: WebhookSender::new(webhook)?,
            dead_letters: Arc::new(LogDeadLetterSink),
            signature_header: queue.signature_header.clone(),
            retried_header: queue.retried_header.clone(),
            max_retries: queue.max_retries,
        })
    }

    pub fn with_dead_letters(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letters = sink;
        self
    }

    /// Handle one queue call. Never fails; every outcome is a response.
    pub async fn handle(&self, request: &WorkerRequest) -> WorkerResponse {
        // 1. Authenticate the queue
        if let Err(e) = self.auth.verify(
            request.header_value(&self.signature_header),
            &request.body,
        ) {
            warn!(error = %e, "rejected unauthenticated queue call");
            return WorkerResponse::non_retryable(401, e.to_string());
        }

        // 2. Parse the job
        let job: QueuedDeliveryJob = match serde_json::from_slice(&request.body) {
            Ok(job) => job,
            Err(e) => {
                warn!(error = %e, "malformed delivery job");
                return WorkerResponse::non_retryable(400, format!("malformed job: {}", e));
            }
        };
        let event = &job.payload;

        // 3. Re-read the subscription
        let subscription = match self.subscriptions.subscription(&job.tenant_id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(tenant_id = %job.tenant_id, error = %e, "subscription lookup failed");
                return WorkerResponse::retry(e.to_string());
            }
        };
        let Some((url, secret)) = subscription
            .as_ref()
            .and_then(|s| s.destination().map(|url| (url, s.signing_secret())))
        else {
            info!(
                tenant_id = %job.tenant_id,
                event_type = %event.event_type,
                "no webhook URL; skipping"
            );
            return WorkerResponse::ok(json!({ "status": "skipped", "reason": "no webhook url" }));
        };

        // 4. Sign
        let envelope = match SignedEnvelope::seal(event, secret) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(tenant_id = %job.tenant_id, error = %e, "could not serialize event");
                return WorkerResponse::non_retryable(400, e.to_string());
            }
        };

        // 5. Deliver
        match self.sender.send(url, &envelope).await {
            Ok(status) => {
                info!(
                    tenant_id = %job.tenant_id,
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    status,
                    signed = envelope.is_signed(),
                    "webhook delivered"
                );
                WorkerResponse::ok(json!({ "status": "delivered", "destination_status": status }))
            }
            Err(e) => self.failed(request, &job, e).await,
        }
    }

    async fn failed(
        &self,
        request: &WorkerRequest,
        job: &QueuedDeliveryJob,
        e: DeliveryError,
    ) -> WorkerResponse {
        let retried = request
            .header_value(&self.retried_header)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let exhausted = !e.is_retryable() || retried >= self.max_retries;

        warn!(
            tenant_id = %job.tenant_id,
            event_type = %job.payload.event_type,
            retried,
            error = %e,
            "webhook delivery failed"
        );

        if exhausted {
            let letter = DeadLetter {
                tenant_id: job.tenant_id.clone(),
                event_id: job.payload.event_id,
                event_type: job.payload.event_type.clone(),
                attempts: retried + 1,
                reason: e.to_string(),
                failed_at: Utc::now(),
            };
            if let Err(sink_error) = self.dead_letters.record(letter).await {
                error!(tenant_id = %job.tenant_id, error = %sink_error, "dead-letter sink failed");
            }
        }

        if e.is_retryable() {
            WorkerResponse::retry(e.to_string())
        } else {
            WorkerResponse::non_retryable(400, e.to_string())
        }
    }
}
