//! Transition table types

use crate::{LifecycleError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

/// Tag selecting which state machine applies to a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    /// Create a new entity kind tag
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Borrow the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKind {
    fn from(kind: &str) -> Self {
        Self(kind.to_string())
    }
}

impl From<String> for EntityKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

/// Finite state machine for one entity kind.
///
/// Maps each state to the set of states it may move to. A state that only
/// ever appears as a successor has no outgoing transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMachine {
    transitions: BTreeMap<String, BTreeSet<String>>,
}

impl StateMachine {
    /// Create an empty state machine
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow moving from `from` to each of `to`.
    ///
    /// Calling this repeatedly for the same `from` state extends its set.
    pub fn allow<I, S>(mut self, from: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transitions
            .entry(from.into())
            .or_default()
            .extend(to.into_iter().map(Into::into));
        self
    }

    /// Successor set for a state, if the state is a recognized key
    pub fn successors(&self, state: &str) -> Option<&BTreeSet<String>> {
        self.transitions.get(state)
    }

    /// Whether the state is a key of this machine
    pub fn has_state(&self, state: &str) -> bool {
        self.transitions.contains_key(state)
    }

    /// Whether the state appears anywhere, as a key or as a successor
    pub fn knows(&self, state: &str) -> bool {
        self.has_state(state) || self.transitions.values().any(|next| next.contains(state))
    }

    /// Every state named by this machine, sorted
    pub fn states(&self) -> BTreeSet<&str> {
        self.transitions
            .iter()
            .flat_map(|(from, to)| {
                std::iter::once(from.as_str()).chain(to.iter().map(String::as_str))
            })
            .collect()
    }

    /// Number of states with outgoing transitions
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the machine has no states at all
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Immutable mapping from entity kind to its state machine.
///
/// Built once at startup and shared (usually behind an `Arc`) by every
/// request handler; tests build their own tables freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTable {
    kinds: HashMap<EntityKind, StateMachine>,
}

impl TransitionTable {
    /// Start building a table
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// Parse a table from TOML.
    ///
    /// ```toml
    /// [order]
    /// pending = ["confirmed", "cancelled"]
    /// confirmed = ["shipped"]
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LifecycleError::InvalidTable(format!("TOML parse error: {}", e)))
    }

    /// Parse a table from JSON (`{"order": {"pending": ["confirmed"]}}`)
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| LifecycleError::InvalidTable(format!("JSON parse error: {}", e)))
    }

    /// Load a table file, choosing the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LifecycleError::InvalidTable(format!("failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&content),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            other => Err(LifecycleError::InvalidTable(format!(
                "unsupported table format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// State machine for an entity kind
    pub fn machine(&self, kind: &str) -> Option<&StateMachine> {
        self.kinds.get(kind)
    }

    /// Whether the table has a machine for the kind
    pub fn contains_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// All entity kinds in the table, sorted
    pub fn kinds(&self) -> Vec<&EntityKind> {
        let mut kinds: Vec<_> = self.kinds.keys().collect();
        kinds.sort();
        kinds
    }

    /// Allowed next states from `state`, sorted.
    ///
    /// Empty for unknown kinds, unknown states and terminal states.
    pub fn allowed_next(&self, kind: &str, state: &str) -> Vec<String> {
        self.machine(kind)
            .and_then(|machine| machine.successors(state))
            .map(|next| next.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `state` only appears as a successor for this kind
    pub fn is_terminal(&self, kind: &str, state: &str) -> bool {
        self.machine(kind)
            .map(|machine| machine.knows(state) && !machine.has_state(state))
            .unwrap_or(false)
    }

    /// Overlay `other` on top of this table.
    ///
    /// Machines in `other` replace whole machines of the same kind.
    pub fn merge(mut self, other: TransitionTable) -> Self {
        self.kinds.extend(other.kinds);
        self
    }
}

/// Builder for [`TransitionTable`]
#[derive(Debug, Default)]
pub struct TransitionTableBuilder {
    kinds: HashMap<EntityKind, StateMachine>,
}

impl TransitionTableBuilder {
    /// Register the machine for an entity kind, replacing any previous one
    pub fn kind(mut self, kind: impl Into<EntityKind>, machine: StateMachine) -> Self {
        self.kinds.insert(kind.into(), machine);
        self
    }

    /// Finish the table
    pub fn build(self) -> TransitionTable {
        TransitionTable { kinds: self.kinds }
    }
}
