//! Domain events for Opsline
//!
//! A [`DomainEvent`] is the immutable record of one completed write: which
//! tenant, which record, what happened and the display-ready fields a
//! notification needs. Channels render messages from the payload alone and
//! never go back to the system of record.
//!
//! ## Quick Start
//!
//! ```rust
//! use opsline_events::{EventBuilder, FieldValue};
//!
//! let event = EventBuilder::new("appointment.confirmed", "tenant-1", "appt-42")
//!     .field("customer_name", "Ada Lovelace")
//!     .field("staff_name", "Grace Hopper")
//!     .field("starts_at", "2024-05-01T09:00:00Z")
//!     .build();
//!
//! assert_eq!(event.event_type, "appointment.confirmed");
//! assert_eq!(event.field("staff_name"), Some(&FieldValue::from("Grace Hopper")));
//! ```

pub mod catalog;
pub mod error;
pub mod event;

pub use catalog::{EventSpec, required_fields, spec_for};
pub use error::EventError;
pub use event::{DomainEvent, EventBuilder, FieldValue, Fields, build};

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;
