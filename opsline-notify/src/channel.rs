//! Channel trait and channel kinds.

use async_trait::async_trait;
use opsline_events::DomainEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Result;

/// Delivery mechanism a tenant can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    InApp,
    Push,
    Sms,
    Webhook,
}

impl ChannelKind {
    /// All channel kinds.
    pub const ALL: [ChannelKind; 4] = [Self::InApp, Self::Push, Self::Sms, Self::Webhook];

    /// Stable name used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Push => "push",
            Self::Sms => "sms",
            Self::Webhook => "webhook",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in_app" | "inapp" => Ok(Self::InApp),
            "push" => Ok(Self::Push),
            "sms" => Ok(Self::Sms),
            "webhook" => Ok(Self::Webhook),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// One delivery mechanism for domain events.
///
/// Implementations should return quickly; anything slow (third-party
/// endpoints) belongs behind a queue.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Which kind of channel this is.
    fn kind(&self) -> ChannelKind;

    /// Deliver one event.
    async fn deliver(&self, event: &DomainEvent) -> Result<()>;
}
