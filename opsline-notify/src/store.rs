//! In-app notification storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsline_events::Fields;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use uuid::Uuid;

use crate::Result;

/// A row shown on the tenant's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    pub id: Uuid,
    pub tenant_id: String,
    /// Event type that produced the notification
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Fields,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredNotification {
    /// Create an unread notification stamped now.
    pub fn new(
        tenant_id: impl Into<String>,
        notification_type: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        data: Fields,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            notification_type: notification_type.into(),
            title: title.into(),
            body: body.into(),
            data,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Listing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only return unread notifications
    pub unread_only: bool,
    /// Maximum number of rows
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage for in-app notifications.
///
/// Listing returns unread before read, newest first within each group.
/// Marking is idempotent and scoped to the tenant.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: StoredNotification) -> Result<()>;

    async fn list(&self, tenant_id: &str, query: ListQuery) -> Result<Vec<StoredNotification>>;

    /// Mark the given notifications read; returns how many changed.
    async fn mark_read(&self, tenant_id: &str, ids: &[Uuid]) -> Result<usize>;

    /// Mark every notification of the tenant read; returns how many changed.
    async fn mark_all_read(&self, tenant_id: &str) -> Result<usize>;

    async fn unread_count(&self, tenant_id: &str) -> Result<usize>;
}

/// In-memory notification store.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: Mutex<Vec<(u64, StoredNotification)>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all tenants.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: StoredNotification) -> Result<()> {
        let mut rows = self.rows.lock();
        let seq = rows.len() as u64;
        rows.push((seq, notification));
        Ok(())
    }

    async fn list(&self, tenant_id: &str, query: ListQuery) -> Result<Vec<StoredNotification>> {
        let rows = self.rows.lock();
        let mut matching: Vec<_> = rows
            .iter()
            .filter(|(_, n)| n.tenant_id == tenant_id && !(query.unread_only && n.is_read))
            .collect();

        // Insertion order breaks ties between identical timestamps
        matching.sort_by_key(|(seq, n)| (n.is_read, Reverse(n.created_at), Reverse(*seq)));

        Ok(matching
            .into_iter()
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(_, n)| n.clone())
            .collect())
    }

    async fn mark_read(&self, tenant_id: &str, ids: &[Uuid]) -> Result<usize> {
        let mut rows = self.rows.lock();
        let mut changed = 0;
        for (_, n) in rows.iter_mut() {
            if n.tenant_id == tenant_id && !n.is_read && ids.contains(&n.id) {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn mark_all_read(&self, tenant_id: &str) -> Result<usize> {
        let mut rows = self.rows.lock();
        let mut changed = 0;
        for (_, n) in rows.iter_mut() {
            if n.tenant_id == tenant_id && !n.is_read {
                n.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_count(&self, tenant_id: &str) -> Result<usize> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|(_, n)| n.tenant_id == tenant_id && !n.is_read)
            .count())
    }
}
