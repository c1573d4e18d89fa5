//! Title/body templates for human-facing channels.

use opsline_events::DomainEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Title and body pattern with `{field}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub title: String,
    pub body: String,
}

impl Template {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Rendered notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
}

/// Templates keyed by event type.
#[derive(Debug, Clone, Default)]
pub struct NotificationTemplates {
    templates: HashMap<String, Template>,
}

impl NotificationTemplates {
    /// Create an empty template set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates for the catalogued event types.
    pub fn standard() -> Self {
        Self::new()
            .with(
                "appointment.created",
                Template::new("New appointment", "{customer_name} booked for {starts_at}"),
            )
            .with(
                "appointment.confirmed",
                Template::new(
                    "Appointment confirmed",
                    "{customer_name} with {staff_name} at {starts_at}",
                ),
            )
            .with(
                "appointment.cancelled",
                Template::new(
                    "Appointment cancelled",
                    "{customer_name} cancelled the appointment at {starts_at}",
                ),
            )
            .with(
                "order.created",
                Template::new(
                    "New order {order_number}",
                    "{customer_name} placed an order for {total}",
                ),
            )
            .with(
                "order.status_changed",
                Template::new(
                    "Order {order_number} updated",
                    "Status changed from {from_status} to {to_status}",
                ),
            )
            .with(
                "reservation.created",
                Template::new(
                    "New reservation",
                    "{customer_name}, party of {party_size}, at {starts_at}",
                ),
            )
            .with(
                "invoice.paid",
                Template::new("Invoice {invoice_number} paid", "Payment of {amount} received"),
            )
            .with(
                "review.received",
                Template::new("New review", "{customer_name} left a {rating}-star review"),
            )
    }

    /// Register a template for an event type.
    pub fn with(mut self, event_type: impl Into<String>, template: Template) -> Self {
        self.templates.insert(event_type.into(), template);
        self
    }

    /// Template for an event type.
    pub fn get(&self, event_type: &str) -> Option<&Template> {
        self.templates.get(event_type)
    }

    /// Render an event.
    ///
    /// Without a template the title is the humanized event type and the body
    /// lists the payload fields.
    pub fn render(&self, event: &DomainEvent) -> RenderedNotification {
        match self.get(&event.event_type) {
            Some(template) => RenderedNotification {
                title: fill(&template.title, event),
                body: fill(&template.body, event),
            },
            None => RenderedNotification {
                title: humanize(&event.event_type),
                body: event
                    .payload
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(name, value)| format!("{}: {}", humanize(name), value))
                    .collect::<Vec<_>>()
                    .join("; "),
            },
        }
    }
}

/// Replace `{field}` placeholders; unknown placeholders are left as written.
fn fill(pattern: &str, event: &DomainEvent) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match event.field(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// `order.status_changed` -> `Order status changed`
fn humanize(name: &str) -> String {
    let words = name.replace(['.', '_'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsline_events::EventBuilder;

    #[test]
    fn test_render_with_template() {
        let event = EventBuilder::new("invoice.paid", "t-1", "inv-1")
            .field("invoice_number", "INV-7")
            .field("amount", "$120.00")
            .build();

        let rendered = NotificationTemplates::standard().render(&event);
        assert_eq!(rendered.title, "Invoice INV-7 paid");
        assert_eq!(rendered.body, "Payment of $120.00 received");
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let event = EventBuilder::new("x", "t-1", "e-1").build();
        assert_eq!(fill("Hello {name} {", &event), "Hello {name} {");
    }

    #[test]
    fn test_fallback_rendering() {
        let event = EventBuilder::new("legal_case.status_changed", "t-1", "c-1")
            .field("case_number", "2024-001")
            .field("to_status", "settled")
            .build();

        let rendered = NotificationTemplates::new().render(&event);
        assert_eq!(rendered.title, "Legal case status changed");
        assert_eq!(rendered.body, "Case number: 2024-001; To status: settled");
    }
}
