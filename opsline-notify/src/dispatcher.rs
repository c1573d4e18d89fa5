//! Notification dispatcher
//!
//! Fans one domain event out to every channel the tenant has enabled. The
//! caller gets a [`DispatchHandle`] back immediately; the fan-out runs on a
//! detached task and each channel runs on its own task, so a failing or
//! panicking channel affects neither its siblings nor the caller.

use opsline_events::{DomainEvent, Fields};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{ChannelKind, ChannelPreferences, NotificationChannel};

/// What happened on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    Failed(String),
    /// Enabled by the tenant but no channel is registered for the kind
    Unavailable,
}

/// Summary of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_id: Uuid,
    pub tenant_id: String,
    pub event_type: String,
    /// Outcome per enabled channel, in channel order
    pub outcomes: Vec<(ChannelKind, ChannelOutcome)>,
    /// Set when the fan-out itself could not run
    pub aborted: Option<String>,
}

impl DispatchReport {
    fn new(event: &DomainEvent) -> Self {
        Self {
            event_id: event.event_id,
            tenant_id: event.tenant_id.clone(),
            event_type: event.event_type.clone(),
            outcomes: Vec::new(),
            aborted: None,
        }
    }

    fn aborted(event: &DomainEvent, reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::new(event)
        }
    }

    /// Outcome for a channel, if it was enabled
    pub fn outcome(&self, kind: ChannelKind) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    /// Channels that delivered
    pub fn delivered(&self) -> Vec<ChannelKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == ChannelOutcome::Delivered)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Channels that failed
    pub fn failed(&self) -> Vec<ChannelKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChannelOutcome::Failed(_)))
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Whether every enabled channel delivered
    pub fn all_delivered(&self) -> bool {
        self.aborted.is_none()
            && self
                .outcomes
                .iter()
                .all(|(_, outcome)| *outcome == ChannelOutcome::Delivered)
    }
}

/// Handle to a detached dispatch.
///
/// Dropping it leaves the dispatch running.
#[derive(Debug)]
pub struct DispatchHandle {
    event: Arc<DomainEvent>,
    task: Option<JoinHandle<DispatchReport>>,
}

impl DispatchHandle {
    /// ID of the event being dispatched
    pub fn event_id(&self) -> Uuid {
        self.event.event_id
    }

    /// Whether the dispatch has finished
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the dispatch and return its report.
    pub async fn wait(self) -> DispatchReport {
        let Some(task) = self.task else {
            return DispatchReport::aborted(&self.event, "no async runtime");
        };

        match task.await {
            Ok(report) => report,
            Err(e) => {
                error!(event_id = %self.event.event_id, error = %e, "dispatch task failed");
                DispatchReport::aborted(&self.event, e.to_string())
            }
        }
    }
}

/// Fans domain events out to notification channels.
#[derive(Clone)]
pub struct NotificationDispatcher {
    preferences: Arc<dyn ChannelPreferences>,
    channels: Arc<HashMap<ChannelKind, Arc<dyn NotificationChannel>>>,
}

impl NotificationDispatcher {
    /// Start building a dispatcher
    pub fn builder(preferences: Arc<dyn ChannelPreferences>) -> NotificationDispatcherBuilder {
        NotificationDispatcherBuilder {
            preferences,
            channels: HashMap::new(),
        }
    }

    /// Registered channel kinds, sorted
    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        let mut kinds: Vec<_> = self.channels.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Dispatch an event on a detached task.
    ///
    /// Never fails and never blocks on channel work. Must be called from
    /// within a Tokio runtime; without one the event is dropped and logged.
    pub fn dispatch(&self, event: DomainEvent) -> DispatchHandle {
        let event = Arc::new(event);

        let task = match Handle::try_current() {
            Ok(runtime) => {
                let dispatcher = self.clone();
                let event = event.clone();
                Some(runtime.spawn(async move { dispatcher.fan_out(event).await }))
            }
            Err(_) => {
                error!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    "dispatch called outside a runtime; event dropped"
                );
                None
            }
        };

        DispatchHandle { event, task }
    }

    /// Build an event from display fields and dispatch it.
    pub fn notify(
        &self,
        tenant_id: impl Into<String>,
        event_type: impl Into<String>,
        entity_id: impl Into<String>,
        fields: Fields,
    ) -> DispatchHandle {
        self.dispatch(opsline_events::build(event_type, tenant_id, entity_id, fields))
    }

    /// Run the fan-out to completion on the current task.
    pub async fn dispatch_and_wait(&self, event: DomainEvent) -> DispatchReport {
        self.fan_out(Arc::new(event)).await
    }

    async fn fan_out(&self, event: Arc<DomainEvent>) -> DispatchReport {
        let enabled = match self
            .preferences
            .enabled_channels(&event.tenant_id, &event.event_type)
            .await
        {
            Ok(enabled) => enabled,
            Err(e) => {
                error!(
                    tenant_id = %event.tenant_id,
                    event_type = %event.event_type,
                    error = %e,
                    "could not resolve channel preferences"
                );
                return DispatchReport::aborted(&event, e.to_string());
            }
        };

        let mut report = DispatchReport::new(&event);
        if enabled.is_empty() {
            debug!(
                tenant_id = %event.tenant_id,
                event_type = %event.event_type,
                "no channels enabled"
            );
            return report;
        }

        let mut tasks = Vec::new();
        for kind in enabled {
            match self.channels.get(&kind) {
                Some(channel) => {
                    let channel = channel.clone();
                    let event = event.clone();
                    tasks.push((
                        kind,
                        tokio::spawn(async move { channel.deliver(&event).await }),
                    ));
                }
                None => {
                    warn!(
                        tenant_id = %event.tenant_id,
                        channel = %kind,
                        "channel enabled but not registered"
                    );
                    report.outcomes.push((kind, ChannelOutcome::Unavailable));
                }
            }
        }

        for (kind, task) in tasks {
            let outcome = match task.await {
                Ok(Ok(())) => {
                    debug!(tenant_id = %event.tenant_id, channel = %kind, "channel delivered");
                    ChannelOutcome::Delivered
                }
                Ok(Err(e)) => {
                    error!(
                        tenant_id = %event.tenant_id,
                        event_type = %event.event_type,
                        channel = %kind,
                        error = %e,
                        "channel delivery failed"
                    );
                    ChannelOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    error!(
                        tenant_id = %event.tenant_id,
                        event_type = %event.event_type,
                        channel = %kind,
                        error = %e,
                        "channel task panicked"
                    );
                    ChannelOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.push((kind, outcome));
        }
        report.outcomes.sort_by_key(|(kind, _)| *kind);

        info!(
            tenant_id = %event.tenant_id,
            event_type = %event.event_type,
            event_id = %event.event_id,
            delivered = report.delivered().len(),
            failed = report.failed().len(),
            "event dispatched"
        );
        report
    }
}

/// Builder for [`NotificationDispatcher`]
pub struct NotificationDispatcherBuilder {
    preferences: Arc<dyn ChannelPreferences>,
    channels: HashMap<ChannelKind, Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcherBuilder {
    /// Register a channel, replacing any channel of the same kind
    pub fn channel(mut self, channel: impl NotificationChannel + 'static) -> Self {
        self.channels.insert(channel.kind(), Arc::new(channel));
        self
    }

    /// Register a shared channel
    pub fn shared_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.insert(channel.kind(), channel);
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> NotificationDispatcher {
        NotificationDispatcher {
            preferences: self.preferences,
            channels: Arc::new(self.channels),
        }
    }
}
