//! Domain event type and builder

use crate::{EventError, Result, catalog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// A display-safe scalar carried in an event payload.
///
/// Serialized as the bare JSON value (`"Ada"`, `42`, `true`, `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Borrow the value as text, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

// JSON has no NaN or infinity; serde_json would write them as null
impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Null
        }
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Text(value.to_rfc3339())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Event payload, ordered by field name
pub type Fields = BTreeMap<String, FieldValue>;

/// Immutable record of a completed write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique per event; destinations de-duplicate redeliveries with it
    pub event_id: Uuid,

    /// Dotted event name, e.g. `order.shipped`
    pub event_type: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Record the event is about
    pub entity_id: String,

    /// When the write happened
    pub occurred_at: DateTime<Utc>,

    /// Display-ready fields
    #[serde(default)]
    pub payload: Fields,
}

impl DomainEvent {
    /// Look up a payload field
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.payload.get(name)
    }

    /// Look up a text payload field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    /// Serialize to the JSON body sent to webhook destinations
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse an event from JSON
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Construct an event stamped with the current time.
///
/// Missing catalogue fields are logged, not rejected.
pub fn build(
    event_type: impl Into<String>,
    tenant_id: impl Into<String>,
    entity_id: impl Into<String>,
    fields: Fields,
) -> DomainEvent {
    EventBuilder::new(event_type, tenant_id, entity_id)
        .fields(fields)
        .build()
}

/// Builder for [`DomainEvent`]
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event_type: String,
    tenant_id: String,
    entity_id: String,
    occurred_at: Option<DateTime<Utc>>,
    payload: Fields,
}

impl EventBuilder {
    /// Start an event
    pub fn new(
        event_type: impl Into<String>,
        tenant_id: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            tenant_id: tenant_id.into(),
            entity_id: entity_id.into(),
            occurred_at: None,
            payload: Fields::new(),
        }
    }

    /// Add one payload field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Add several payload fields
    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.payload
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Override the timestamp (defaults to now)
    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Catalogue fields this event lacks
    pub fn missing_fields(&self) -> Vec<&'static str> {
        catalog::required_fields(&self.event_type)
            .iter()
            .copied()
            .filter(|name| self.payload.get(*name).is_none_or(FieldValue::is_null))
            .collect()
    }

    /// Finish the event, warning about missing catalogue fields
    pub fn build(self) -> DomainEvent {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            warn!(
                event_type = %self.event_type,
                tenant_id = %self.tenant_id,
                missing = ?missing,
                "event is missing documented fields"
            );
        }
        self.finish()
    }

    /// Finish the event, failing if catalogue fields are missing
    pub fn build_strict(self) -> Result<DomainEvent> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(EventError::MissingFields {
                event_type: self.event_type,
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(self.finish())
    }

    fn finish(self) -> DomainEvent {
        DomainEvent {
            event_id: Uuid::new_v4(),
            event_type: self.event_type,
            tenant_id: self.tenant_id,
            entity_id: self.entity_id,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            payload: self.payload,
        }
    }
}
