//! Status lifecycle enforcement for Opsline
//!
//! Every status-bearing record type (appointments, orders, reservations,
//! legal cases, repairs, ...) moves through a finite state machine. This
//! crate holds those machines as an immutable [`TransitionTable`] and
//! decides whether a requested status change is legal.
//!
//! # Features
//!
//! - **Pure validation**: [`validate`] is an in-memory lookup with no I/O
//! - **Per-kind tables**: the same state name can have different successors per entity kind
//! - **Explicit configuration**: tables are built or loaded at startup and passed in
//! - **Guarded writes**: [`TransitionGuard`] commits with a compare-and-set
//!
//! # Example
//!
//! ```rust
//! use opsline_lifecycle::{
//!     RejectReason, StateMachine, TransitionResult, TransitionTable, validate,
//! };
//!
//! let table = TransitionTable::builder()
//!     .kind("order", StateMachine::new().allow("pending", ["confirmed", "cancelled"]))
//!     .build();
//!
//! assert_eq!(validate(&table, "order", "pending", "confirmed"), TransitionResult::Allowed);
//! assert_eq!(
//!     validate(&table, "order", "pending", "delivered"),
//!     TransitionResult::Rejected(RejectReason::IllegalTransition)
//! );
//! ```

mod error;
mod guard;
mod standard;
mod store;
mod table;
mod validator;

pub use error::LifecycleError;
pub use guard::{AppliedTransition, TransitionGuard, TransitionOutcome};
pub use store::{InMemoryStatusStore, StatusStore};
pub use table::{EntityKind, StateMachine, TransitionTable, TransitionTableBuilder};
pub use validator::{RejectReason, TransitionResult, validate};

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
