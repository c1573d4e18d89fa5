//! Validated, conditionally committed status changes

use crate::{
    EntityKind, LifecycleError, Result, StatusStore, TransitionResult, TransitionTable, validate,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A status change that was validated and committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub kind: EntityKind,
    pub entity_id: String,
    pub from: String,
    pub to: String,
}

/// Result of [`TransitionGuard::apply_idempotent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status changed
    Applied(AppliedTransition),

    /// The record already had the requested status; nothing was written
    Unchanged { state: String },
}

impl TransitionOutcome {
    /// Whether a write happened
    pub fn changed(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Reads the current status, validates the change and commits it with a
/// compare-and-set so two concurrent requests cannot both win.
#[derive(Clone)]
pub struct TransitionGuard {
    table: Arc<TransitionTable>,
    store: Arc<dyn StatusStore>,
}

impl TransitionGuard {
    /// Create a guard over a table and a status store
    pub fn new(table: Arc<TransitionTable>, store: Arc<dyn StatusStore>) -> Self {
        Self { table, store }
    }

    /// The table used for validation
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Move a record to `requested`.
    ///
    /// Requesting the current status is validated like any other change,
    /// so it fails unless the table lists the state as its own successor.
    pub async fn apply(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        requested: &str,
    ) -> Result<AppliedTransition> {
        let current = self.read_current(kind, entity_id).await?;
        self.commit(kind, entity_id, current, requested).await
    }

    /// Move a record to `requested`, treating "already there" as success.
    pub async fn apply_idempotent(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        requested: &str,
    ) -> Result<TransitionOutcome> {
        let current = self.read_current(kind, entity_id).await?;
        if current == requested {
            debug!(kind = %kind, entity_id, state = requested, "status already set");
            return Ok(TransitionOutcome::Unchanged { state: current });
        }

        self.commit(kind, entity_id, current, requested)
            .await
            .map(TransitionOutcome::Applied)
    }

    async fn read_current(&self, kind: &EntityKind, entity_id: &str) -> Result<String> {
        self.store
            .current_status(kind, entity_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                kind: kind.to_string(),
                entity_id: entity_id.to_string(),
            })
    }

    async fn commit(
        &self,
        kind: &EntityKind,
        entity_id: &str,
        current: String,
        requested: &str,
    ) -> Result<AppliedTransition> {
        if let TransitionResult::Rejected(reason) =
            validate(&self.table, kind.as_str(), &current, requested)
        {
            debug!(
                kind = %kind,
                entity_id,
                from = %current,
                to = requested,
                %reason,
                "transition rejected"
            );
            return Err(LifecycleError::Rejected {
                kind: kind.to_string(),
                allowed: self.table.allowed_next(kind.as_str(), &current),
                from: current,
                to: requested.to_string(),
                reason,
            });
        }

        if !self
            .store
            .compare_and_set(kind, entity_id, &current, requested)
            .await?
        {
            warn!(kind = %kind, entity_id, expected = %current, "status changed before commit");
            return Err(LifecycleError::Conflict {
                kind: kind.to_string(),
                entity_id: entity_id.to_string(),
                expected: current,
            });
        }

        info!(kind = %kind, entity_id, from = %current, to = requested, "status changed");
        Ok(AppliedTransition {
            kind: kind.clone(),
            entity_id: entity_id.to_string(),
            from: current,
            to: requested.to_string(),
        })
    }
}
