//! Dispatcher integration tests with the shipped channels

use async_trait::async_trait;
use opsline_events::{EventBuilder, FieldValue, Fields};
use opsline_notify::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, tenant_id: &str, text: &str) -> Result<()> {
        self.sent.lock().push((tenant_id.to_string(), text.to_string()));
        Ok(())
    }
}

struct DownPush;

#[async_trait]
impl PushSender for DownPush {
    async fn send(&self, _: &str, _: &RenderedNotification, _: &Fields) -> Result<()> {
        Err(NotifyError::provider(ChannelKind::Push, "503 from provider"))
    }
}

#[tokio::test]
async fn test_in_app_and_sms_survive_push_outage() {
    let store = Arc::new(InMemoryNotificationStore::new());
    let sms = Arc::new(RecordingSms::default());
    let templates = Arc::new(NotificationTemplates::standard());

    let prefs = InMemoryChannelPreferences::new();
    prefs.enable("t-1", ChannelKind::InApp, EventSelection::All);
    prefs.enable("t-1", ChannelKind::Push, EventSelection::All);
    prefs.enable("t-1", ChannelKind::Sms, EventSelection::only(["appointment.confirmed"]));

    let dispatcher = NotificationDispatcher::builder(Arc::new(prefs))
        .channel(InAppChannel::new(store.clone(), templates.clone()))
        .channel(PushChannel::new(Arc::new(DownPush), templates.clone()))
        .channel(SmsChannel::new(sms.clone(), templates))
        .build();

    let event = EventBuilder::new("appointment.confirmed", "t-1", "appt-1")
        .field("customer_name", "Ada")
        .field("staff_name", "Grace")
        .field("starts_at", "09:00")
        .build();

    let report = dispatcher.dispatch(event).wait().await;
    assert_eq!(report.delivered(), vec![ChannelKind::InApp, ChannelKind::Sms]);
    assert_eq!(report.failed(), vec![ChannelKind::Push]);

    let rows = store.list("t-1", ListQuery::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Appointment confirmed");
    assert_eq!(rows[0].body, "Ada with Grace at 09:00");
    assert_eq!(rows[0].notification_type, "appointment.confirmed");
    assert!(!rows[0].is_read);

    let sent = sms.sent.lock().clone();
    assert_eq!(
        sent,
        vec![(
            "t-1".to_string(),
            "Appointment confirmed: Ada with Grace at 09:00".to_string()
        )]
    );
}

#[tokio::test]
async fn test_notify_builds_the_event() {
    let store = Arc::new(InMemoryNotificationStore::new());
    let dispatcher = NotificationDispatcher::builder(Arc::new(InMemoryChannelPreferences::new()))
        .channel(InAppChannel::new(store.clone(), Arc::new(NotificationTemplates::new())))
        .build();

    let mut fields = Fields::new();
    fields.insert("rating".into(), FieldValue::Int(5));

    let handle = dispatcher.notify("t-2", "review.received", "rev-1", fields);
    assert!(handle.wait().await.all_delivered());

    assert_eq!(store.unread_count("t-2").await.unwrap(), 1);
    let rows = store.list("t-2", ListQuery::default()).await.unwrap();
    assert_eq!(rows[0].title, "Review received");
    assert_eq!(rows[0].body, "Rating: 5");
}

#[test]
fn test_stored_notification_wire_shape() {
    let n = StoredNotification::new("t-1", "order.created", "New order", "body", Fields::new());
    let json = serde_json::to_value(&n).unwrap();
    assert_eq!(json["type"], "order.created");
    assert_eq!(json["is_read"], false);
}
