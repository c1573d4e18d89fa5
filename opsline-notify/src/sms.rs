//! SMS channel.

use async_trait::async_trait;
use opsline_events::DomainEvent;
use std::sync::Arc;

use crate::{ChannelKind, NotificationChannel, NotificationTemplates, Result};

/// Longest message sent in one SMS segment set.
pub const MAX_SMS_LEN: usize = 320;

/// Sends a text message to a tenant's configured number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, tenant_id: &str, text: &str) -> Result<()>;
}

/// SMS notification channel.
#[derive(Clone)]
pub struct SmsChannel {
    sender: Arc<dyn SmsSender>,
    templates: Arc<NotificationTemplates>,
}

impl SmsChannel {
    pub fn new(sender: Arc<dyn SmsSender>, templates: Arc<NotificationTemplates>) -> Self {
        Self { sender, templates }
    }

    /// `title: body`, cut at [`MAX_SMS_LEN`] characters.
    pub fn message_text(&self, event: &DomainEvent) -> String {
        let rendered = self.templates.render(event);
        let text = if rendered.body.is_empty() {
            rendered.title
        } else {
            format!("{}: {}", rendered.title, rendered.body)
        };
        truncate(text, MAX_SMS_LEN)
    }
}

fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(&self, event: &DomainEvent) -> Result<()> {
        let text = self.message_text(event);
        self.sender.send(&event.tenant_id, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short".to_string(), 10), "short");
        assert_eq!(truncate("abcdefghijkl".to_string(), 10), "abcdefg...");
    }
}
