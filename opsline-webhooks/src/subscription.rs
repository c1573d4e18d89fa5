//! Tenant webhook subscriptions

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A tenant's webhook configuration.
///
/// Tenant-owned and mutable at any time; read it fresh for every delivery
/// attempt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub tenant_id: String,
    pub url: Option<String>,
    pub secret: Option<String>,
}

impl std::fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("tenant_id", &self.tenant_id)
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WebhookSubscription {
    pub fn new(tenant_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            url: Some(url.into()),
            secret: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Destination URL, if one is configured
    pub fn destination(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Signing secret, if one is configured
    pub fn signing_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|secret| !secret.is_empty())
    }
}

/// Read access to tenant webhook subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn subscription(&self, tenant_id: &str) -> Result<Option<WebhookSubscription>>;
}

/// In-memory subscription store
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: DashMap<String, WebhookSubscription>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a subscription
    pub fn upsert(&self, subscription: WebhookSubscription) {
        self.subscriptions
            .insert(subscription.tenant_id.clone(), subscription);
    }

    /// Remove the tenant's URL, keeping the secret
    pub fn clear_url(&self, tenant_id: &str) {
        if let Some(mut subscription) = self.subscriptions.get_mut(tenant_id) {
            subscription.url = None;
        }
    }

    /// Replace the tenant's secret
    pub fn rotate_secret(&self, tenant_id: &str, secret: impl Into<String>) {
        if let Some(mut subscription) = self.subscriptions.get_mut(tenant_id) {
            subscription.secret = Some(secret.into());
        }
    }

    /// Delete the subscription entirely
    pub fn remove(&self, tenant_id: &str) -> Option<WebhookSubscription> {
        self.subscriptions.remove(tenant_id).map(|(_, s)| s)
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn subscription(&self, tenant_id: &str) -> Result<Option<WebhookSubscription>> {
        Ok(self.subscriptions.get(tenant_id).map(|s| s.value().clone()))
    }
}
