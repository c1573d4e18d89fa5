//! Transition validation

use crate::TransitionTable;
use std::fmt;

/// Why a transition request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The current state is not a key of the kind's machine
    UnknownState,

    /// The requested state is not a successor of the current state
    IllegalTransition,
}

impl RejectReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownState => "unknown_state",
            Self::IllegalTransition => "illegal_transition",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownState => write!(f, "current state is not recognized"),
            Self::IllegalTransition => write!(f, "transition is not allowed"),
        }
    }
}

/// Outcome of validating one transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionResult {
    Allowed,
    Rejected(RejectReason),
}

impl TransitionResult {
    /// Whether the transition may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Rejection reason, if rejected
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Allowed => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// Check whether `entity_kind` may move from `current_state` to `requested_state`.
///
/// A state moving to itself is only allowed when the table lists it as its
/// own successor. An entity kind missing from the table has no recognized
/// states, so every request for it is `UnknownState`.
pub fn validate(
    table: &TransitionTable,
    entity_kind: &str,
    current_state: &str,
    requested_state: &str,
) -> TransitionResult {
    let Some(allowed) = table
        .machine(entity_kind)
        .and_then(|machine| machine.successors(current_state))
    else {
        return TransitionResult::Rejected(RejectReason::UnknownState);
    };

    if allowed.contains(requested_state) {
        TransitionResult::Allowed
    } else {
        TransitionResult::Rejected(RejectReason::IllegalTransition)
    }
}

impl TransitionTable {
    /// Method form of [`validate`]
    pub fn validate(
        &self,
        entity_kind: &str,
        current_state: &str,
        requested_state: &str,
    ) -> TransitionResult {
        validate(self, entity_kind, current_state, requested_state)
    }
}
