//! Per-tenant channel preferences.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{ChannelKind, Result};

/// Which events a channel receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSelection {
    /// Every event type
    All,
    /// Only the listed event types
    Only(BTreeSet<String>),
}

impl EventSelection {
    /// Select only the given event types.
    pub fn only<I, S>(event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(event_types.into_iter().map(Into::into).collect())
    }

    /// Whether the selection includes an event type.
    pub fn includes(&self, event_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.contains(event_type),
        }
    }
}

/// Resolves which channels a tenant has enabled for an event type.
#[async_trait]
pub trait ChannelPreferences: Send + Sync {
    /// Enabled channels, in no particular order.
    async fn enabled_channels(&self, tenant_id: &str, event_type: &str) -> Result<Vec<ChannelKind>>;
}

/// In-memory preferences.
///
/// A tenant with any explicit configuration uses only that configuration;
/// other tenants fall back to the default set (in-app for everything unless
/// changed).
#[derive(Debug)]
pub struct InMemoryChannelPreferences {
    tenants: DashMap<String, HashMap<ChannelKind, EventSelection>>,
    default: RwLock<HashMap<ChannelKind, EventSelection>>,
}

impl Default for InMemoryChannelPreferences {
    fn default() -> Self {
        Self {
            tenants: DashMap::new(),
            default: RwLock::new(HashMap::from([(ChannelKind::InApp, EventSelection::All)])),
        }
    }
}

impl InMemoryChannelPreferences {
    /// Create preferences with the in-app default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create preferences where unconfigured tenants get nothing.
    pub fn empty() -> Self {
        Self {
            tenants: DashMap::new(),
            default: RwLock::new(HashMap::new()),
        }
    }

    /// Set the selection for a channel in the default set.
    pub fn with_default(self, kind: ChannelKind, selection: EventSelection) -> Self {
        self.default.write().insert(kind, selection);
        self
    }

    /// Enable a channel for a tenant.
    pub fn enable(
        &self,
        tenant_id: impl Into<String>,
        kind: ChannelKind,
        selection: EventSelection,
    ) {
        self.tenants
            .entry(tenant_id.into())
            .or_default()
            .insert(kind, selection);
    }

    /// Disable a channel for a tenant.
    ///
    /// The tenant keeps its explicit configuration, so the default set no
    /// longer applies even if nothing remains enabled.
    pub fn disable(&self, tenant_id: impl Into<String>, kind: ChannelKind) {
        self.tenants.entry(tenant_id.into()).or_default().remove(&kind);
    }
}

#[async_trait]
impl ChannelPreferences for InMemoryChannelPreferences {
    async fn enabled_channels(
        &self,
        tenant_id: &str,
        event_type: &str,
    ) -> Result<Vec<ChannelKind>> {
        let select = |config: &HashMap<ChannelKind, EventSelection>| {
            let mut kinds: Vec<_> = config
                .iter()
                .filter(|(_, selection)| selection.includes(event_type))
                .map(|(kind, _)| *kind)
                .collect();
            kinds.sort();
            kinds
        };

        Ok(match self.tenants.get(tenant_id) {
            Some(config) => select(config.value()),
            None => select(&*self.default.read()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_applies_to_unconfigured_tenants() {
        let prefs = InMemoryChannelPreferences::new();
        assert_eq!(
            prefs.enabled_channels("t-1", "order.created").await.unwrap(),
            vec![ChannelKind::InApp]
        );
    }

    #[tokio::test]
    async fn test_tenant_configuration_replaces_default() {
        let prefs = InMemoryChannelPreferences::new();
        prefs.enable("t-1", ChannelKind::Webhook, EventSelection::All);
        prefs.enable("t-1", ChannelKind::Sms, EventSelection::only(["appointment.confirmed"]));

        assert_eq!(
            prefs.enabled_channels("t-1", "order.created").await.unwrap(),
            vec![ChannelKind::Webhook]
        );
        assert_eq!(
            prefs
                .enabled_channels("t-1", "appointment.confirmed")
                .await
                .unwrap(),
            vec![ChannelKind::Sms, ChannelKind::Webhook]
        );
    }

    #[tokio::test]
    async fn test_disable_everything() {
        let prefs = InMemoryChannelPreferences::new();
        prefs.disable("t-1", ChannelKind::InApp);
        assert!(prefs.enabled_channels("t-1", "order.created").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_default() {
        let prefs = InMemoryChannelPreferences::empty()
            .with_default(ChannelKind::Push, EventSelection::only(["order.created"]));
        assert_eq!(
            prefs.enabled_channels("t-9", "order.created").await.unwrap(),
            vec![ChannelKind::Push]
        );
        assert!(prefs.enabled_channels("t-9", "invoice.paid").await.unwrap().is_empty());
    }
}
