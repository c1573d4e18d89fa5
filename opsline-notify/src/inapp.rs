//! In-app channel.

use async_trait::async_trait;
use opsline_events::DomainEvent;
use std::sync::Arc;
use tracing::debug;

use crate::{
    ChannelKind, NotificationChannel, NotificationStore, NotificationTemplates, Result,
    StoredNotification,
};

/// Writes one row per event to the tenant's notification feed.
#[derive(Clone)]
pub struct InAppChannel {
    store: Arc<dyn NotificationStore>,
    templates: Arc<NotificationTemplates>,
}

impl InAppChannel {
    pub fn new(store: Arc<dyn NotificationStore>, templates: Arc<NotificationTemplates>) -> Self {
        Self { store, templates }
    }
}

#[async_trait]
impl NotificationChannel for InAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::InApp
    }

    async fn deliver(&self, event: &DomainEvent) -> Result<()> {
        let rendered = self.templates.render(event);
        let notification = StoredNotification::new(
            event.tenant_id.clone(),
            event.event_type.clone(),
            rendered.title,
            rendered.body,
            event.payload.clone(),
        );
        let id = notification.id;

        self.store.insert(notification).await?;
        debug!(tenant_id = %event.tenant_id, notification_id = %id, "in-app notification stored");
        Ok(())
    }
}
