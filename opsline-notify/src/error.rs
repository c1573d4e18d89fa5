//! Notification errors.

use crate::ChannelKind;
use thiserror::Error;

/// Notification errors.
///
/// These never reach the caller of [`dispatch`](crate::NotificationDispatcher::dispatch);
/// they are logged and summarized in the [`DispatchReport`](crate::DispatchReport).
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Notification store failure.
    #[error("Notification store error: {0}")]
    Store(String),

    /// Channel preferences could not be resolved.
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// A provider (push, SMS) refused or failed the send.
    #[error("{channel} provider error: {message}")]
    Provider {
        channel: ChannelKind,
        message: String,
    },

    /// The webhook queue could not accept the job.
    #[error("Enqueue failed: {0}")]
    Enqueue(String),

}

impl NotifyError {
    /// Create a provider error.
    pub fn provider(channel: ChannelKind, message: impl Into<String>) -> Self {
        Self::Provider {
            channel,
            message: message.into(),
        }
    }
}
