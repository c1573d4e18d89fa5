//! Error types for lifecycle operations

use crate::RejectReason;
use thiserror::Error;

/// Errors raised while applying a status change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The record does not exist in the status store
    #[error("{kind} {entity_id} not found")]
    NotFound { kind: String, entity_id: String },

    /// The transition table refused the change
    #[error("cannot move {kind} from '{from}' to '{to}': {reason}")]
    Rejected {
        kind: String,
        from: String,
        to: String,
        reason: RejectReason,
        /// States the record may move to instead
        allowed: Vec<String>,
    },

    /// The stored state changed between read and write
    #[error("{kind} {entity_id} was modified concurrently (expected state '{expected}')")]
    Conflict {
        kind: String,
        entity_id: String,
        expected: String,
    },

    /// The status store failed
    #[error("Status store error: {0}")]
    Store(String),

    /// A transition table could not be loaded
    #[error("Invalid transition table: {0}")]
    InvalidTable(String),
}

impl LifecycleError {
    /// Allowed next states carried by a rejection, for rendering valid actions
    pub fn allowed_next(&self) -> &[String] {
        match self {
            Self::Rejected { allowed, .. } => allowed,
            _ => &[],
        }
    }
}
