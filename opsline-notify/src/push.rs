//! Push channel.

use async_trait::async_trait;
use opsline_events::{DomainEvent, Fields};
use std::sync::Arc;

use crate::{ChannelKind, NotificationChannel, NotificationTemplates, RenderedNotification, Result};

/// Sends a rendered notification to a tenant's registered devices.
///
/// Device registration and provider wire formats live behind this trait.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        tenant_id: &str,
        notification: &RenderedNotification,
        data: &Fields,
    ) -> Result<()>;
}

/// Push notification channel.
#[derive(Clone)]
pub struct PushChannel {
    sender: Arc<dyn PushSender>,
    templates: Arc<NotificationTemplates>,
}

impl PushChannel {
    pub fn new(sender: Arc<dyn PushSender>, templates: Arc<NotificationTemplates>) -> Self {
        Self { sender, templates }
    }
}

#[async_trait]
impl NotificationChannel for PushChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Push
    }

    async fn deliver(&self, event: &DomainEvent) -> Result<()> {
        let rendered = self.templates.render(event);
        self.sender
            .send(&event.tenant_id, &rendered, &event.payload)
            .await
    }
}
