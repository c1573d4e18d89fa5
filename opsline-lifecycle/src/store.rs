//! Status storage seam

use crate::{EntityKind, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Read/conditional-write access to the status column of the system of record.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Current status of a record, `None` if the record does not exist
    async fn current_status(&self, kind: &EntityKind, entity_id: &str) -> Result<Option<String>>;

    /// Set the status to `new` only if it still equals `expected`.
    ///
    /// Returns `false` when the stored status no longer matches.
    async fn compare_and_set(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool>;
}

/// In-memory status store for tests and local development
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    statuses: Mutex<HashMap<(EntityKind, String), String>>,
}

impl InMemoryStatusStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a record's status
    pub fn insert(
        &self,
        kind: impl Into<EntityKind>,
        entity_id: impl Into<String>,
        status: impl Into<String>,
    ) {
        self.statuses
            .lock()
            .insert((kind.into(), entity_id.into()), status.into());
    }

    /// Read a status without going through the async trait
    pub fn get(&self, kind: &EntityKind, entity_id: &str) -> Option<String> {
        self.statuses
            .lock()
            .get(&(kind.clone(), entity_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn current_status(&self, kind: &EntityKind, entity_id: &str) -> Result<Option<String>> {
        Ok(self.get(kind, entity_id))
    }

    async fn compare_and_set(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool> {
        let mut statuses = self.statuses.lock();
        match statuses.get_mut(&(kind.clone(), entity_id.to_string())) {
            Some(status) if status == expected => {
                *status = new.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
