//! Notification fan-out for Opsline
//!
//! After a write commits, request handlers hand the resulting
//! [`DomainEvent`](opsline_events::DomainEvent) to a
//! [`NotificationDispatcher`]. The dispatcher looks up which channels the
//! tenant has enabled for the event type and delivers to each of them
//! independently on detached tasks. Nothing a channel does can fail or slow
//! down the request that triggered it.
//!
//! ## Channels
//!
//! - [`InAppChannel`] - stores a row in the tenant's notification feed
//! - [`PushChannel`] - hands a rendered message to a [`PushSender`]
//! - [`SmsChannel`] - hands a rendered message to an [`SmsSender`]
//! - webhook - see the `opsline-webhooks` crate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opsline_notify::*;
//! use opsline_events::EventBuilder;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryNotificationStore::new());
//! let templates = Arc::new(NotificationTemplates::standard());
//!
//! let dispatcher = NotificationDispatcher::builder(Arc::new(InMemoryChannelPreferences::new()))
//!     .channel(InAppChannel::new(store.clone(), templates))
//!     .build();
//!
//! let event = EventBuilder::new("invoice.paid", "tenant-1", "inv-7")
//!     .field("invoice_number", "INV-7")
//!     .field("amount", "$120.00")
//!     .build();
//!
//! // Fire and forget; keep the handle only if you want the report
//! let report = dispatcher.dispatch(event).wait().await;
//! assert!(report.all_delivered());
//! # }
//! ```

mod channel;
mod dispatcher;
mod error;
mod inapp;
mod preferences;
mod push;
mod sms;
mod store;
mod templates;

pub use channel::{ChannelKind, NotificationChannel};
pub use dispatcher::{
    ChannelOutcome, DispatchHandle, DispatchReport, NotificationDispatcher,
    NotificationDispatcherBuilder,
};
pub use error::NotifyError;
pub use inapp::InAppChannel;
pub use preferences::{ChannelPreferences, EventSelection, InMemoryChannelPreferences};
pub use push::{PushChannel, PushSender};
pub use sms::{MAX_SMS_LEN, SmsChannel, SmsSender};
pub use store::{InMemoryNotificationStore, ListQuery, NotificationStore, StoredNotification};
pub use templates::{NotificationTemplates, RenderedNotification, Template};

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotifyError>;
