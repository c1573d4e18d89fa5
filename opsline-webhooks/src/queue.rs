//! Durable queue seam
//!
//! The queue owns every job from the moment it is accepted: it persists it,
//! calls the delivery worker, and decides whether and when to retry.

use async_trait::async_trait;
use opsline_events::DomainEvent;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};
use url::Url;

use crate::{QueueConfig, Result, WebhookError};

/// Body of every queue publish and every worker call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedDeliveryJob {
    pub tenant_id: String,
    pub payload: DomainEvent,
}

impl QueuedDeliveryJob {
    /// Wrap an event for its owning tenant
    pub fn for_event(event: DomainEvent) -> Self {
        Self {
            tenant_id: event.tenant_id.clone(),
            payload: event,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// An external durable queue that will invoke the delivery worker
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Hand a job to the queue; returns the queue's message ID when it reports one
    async fn enqueue(&self, job: &QueuedDeliveryJob) -> Result<Option<String>>;
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

/// Publishes jobs to an HTTP queue service
#[derive(Debug, Clone)]
pub struct HttpQueueClient {
    http_client: Client,
    publish_url: Url,
    token: Option<String>,
    retries_header: String,
    max_retries: u32,
}

impl HttpQueueClient {
    /// Create a client from queue settings
    pub fn new(config: &QueueConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Self::with_client(http_client, config)
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_client(http_client: Client, config: &QueueConfig) -> Result<Self> {
        let destination = Url::parse(&config.destination)?;
        let publish_url = Url::parse(&format!(
            "{}/{}",
            config.publish_url.trim_end_matches('/'),
            destination
        ))?;

        Ok(Self {
            http_client,
            publish_url,
            token: config.token.clone(),
            retries_header: config.retries_header.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Full publish URL, destination included
    pub fn publish_url(&self) -> &Url {
        &self.publish_url
    }
}

#[async_trait]
impl DurableQueue for HttpQueueClient {
    async fn enqueue(&self, job: &QueuedDeliveryJob) -> Result<Option<String>> {
        let mut request = self
            .http_client
            .post(self.publish_url.clone())
            .header("Content-Type", "application/json")
            .header(self.retries_header.as_str(), self.max_retries.to_string())
            .body(job.to_bytes()?);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(tenant_id = %job.tenant_id, status = status.as_u16(), "queue rejected job");
            return Err(WebhookError::QueueRejected {
                status: status.as_u16(),
                message,
            });
        }

        let message_id = response
            .json::<PublishResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);
        debug!(tenant_id = %job.tenant_id, message_id = ?message_id, "job enqueued");
        Ok(message_id)
    }
}

/// Queue that keeps jobs in memory for tests and local runs
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    jobs: Mutex<VecDeque<QueuedDeliveryJob>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Take the oldest job
    pub fn pop(&self) -> Option<QueuedDeliveryJob> {
        self.jobs.lock().pop_front()
    }

    /// Take every job, oldest first
    pub fn drain(&self) -> Vec<QueuedDeliveryJob> {
        self.jobs.lock().drain(..).collect()
    }
}

#[async_trait]
impl DurableQueue for InMemoryQueue {
    async fn enqueue(&self, job: &QueuedDeliveryJob) -> Result<Option<String>> {
        let mut jobs = self.jobs.lock();
        jobs.push_back(job.clone());
        Ok(Some(format!("mem-{}", jobs.len())))
    }
}
