// Opsline - Status lifecycles, notifications and webhook delivery
//
// This library bundles the Opsline crates behind one dependency: transition
// tables that guard status changes, domain events, per-tenant notification
// fan-out and queue-backed signed webhook delivery.

// Re-export the always-present crates
pub use opsline_events as events;
pub use opsline_lifecycle as lifecycle;
pub use opsline_log as log;

// Re-export optional crates
#[cfg(feature = "notify")]
pub use opsline_notify as notify;

#[cfg(feature = "webhooks")]
pub use opsline_webhooks as webhooks;

#[cfg(feature = "config")]
pub use opsline_config as config;

// Prelude for common imports
pub mod prelude {
    pub use opsline_events::{DomainEvent, EventBuilder, FieldValue, Fields};
    pub use opsline_lifecycle::{
        EntityKind, LifecycleError, RejectReason, StateMachine, StatusStore, TransitionGuard,
        TransitionResult, TransitionTable, validate,
    };

    #[cfg(feature = "notify")]
    pub use opsline_notify::{
        ChannelKind, ChannelPreferences, DispatchReport, NotificationChannel,
        NotificationDispatcher, NotificationStore, NotifyError,
    };

    #[cfg(feature = "webhooks")]
    pub use opsline_webhooks::{
        DeliveryWorker, DurableQueue, QueueConfig, SubscriptionStore, WebhookChannel,
        WebhookConfig, WebhookError, WebhookSignature,
    };

    #[cfg(feature = "config")]
    pub use opsline_config::{ConfigError, OpslineConfig};
}
