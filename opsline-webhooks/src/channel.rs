//! Webhook enqueuer channel

use async_trait::async_trait;
use opsline_events::DomainEvent;
use opsline_notify::{ChannelKind, NotificationChannel, NotifyError};
use std::sync::Arc;
use tracing::debug;

use crate::{DurableQueue, QueuedDeliveryJob, SubscriptionStore};

/// Hands events to the durable queue; never calls the destination itself.
#[derive(Clone)]
pub struct WebhookChannel {
    queue: Arc<dyn DurableQueue>,
    subscriptions: Option<Arc<dyn SubscriptionStore>>,
}

impl WebhookChannel {
    pub fn new(queue: Arc<dyn DurableQueue>) -> Self {
        Self {
            queue,
            subscriptions: None,
        }
    }

    /// Skip enqueueing for tenants with no webhook URL.
    ///
    /// The worker still re-reads the subscription on every attempt.
    pub fn with_precheck(mut self, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        self.subscriptions = Some(subscriptions);
        self
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn deliver(&self, event: &DomainEvent) -> opsline_notify::Result<()> {
        if let Some(subscriptions) = &self.subscriptions {
            let subscription = subscriptions
                .subscription(&event.tenant_id)
                .await
                .map_err(|e| NotifyError::Enqueue(e.to_string()))?;
            if subscription.as_ref().and_then(|s| s.destination()).is_none() {
                debug!(tenant_id = %event.tenant_id, "no webhook URL; not enqueueing");
                return Ok(());
            }
        }

        let job = QueuedDeliveryJob::for_event(event.clone());
        let message_id = self
            .queue
            .enqueue(&job)
            .await
            .map_err(|e| NotifyError::Enqueue(e.to_string()))?;

        debug!(
            tenant_id = %event.tenant_id,
            event_type = %event.event_type,
            message_id = ?message_id,
            "webhook job enqueued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryQueue, InMemorySubscriptionStore, WebhookSubscription};
    use opsline_events::EventBuilder;

    #[tokio::test]
    async fn test_enqueues_job_for_tenant() {
        let queue = Arc::new(InMemoryQueue::new());
        let channel = WebhookChannel::new(queue.clone());
        let event = EventBuilder::new("order.created", "t-1", "o-1").build();

        channel.deliver(&event).await.unwrap();

        let job = queue.pop().unwrap();
        assert_eq!(job.tenant_id, "t-1");
        assert_eq!(job.payload, event);
    }

    #[tokio::test]
    async fn test_precheck_skips_tenants_without_url() {
        let queue = Arc::new(InMemoryQueue::new());
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        subscriptions.upsert(WebhookSubscription::new("t-2", "https://hooks.example"));
        let channel = WebhookChannel::new(queue.clone()).with_precheck(subscriptions);

        channel
            .deliver(&EventBuilder::new("order.created", "t-1", "o-1").build())
            .await
            .unwrap();
        assert!(queue.is_empty());

        channel
            .deliver(&EventBuilder::new("order.created", "t-2", "o-2").build())
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
    }
}
