//! Event errors

use thiserror::Error;

/// Event errors
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event '{event_type}' is missing required fields: {}", missing.join(", "))]
    MissingFields {
        event_type: String,
        missing: Vec<String>,
    },
}
