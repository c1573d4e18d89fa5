//! Known event types and the fields their notifications render.
//!
//! The catalogue documents what each producer is expected to send; the
//! builder only warns when a producer falls short.

/// Documented shape of one event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    pub event_type: &'static str,
    pub required: &'static [&'static str],
}

const CATALOG: &[EventSpec] = &[
    EventSpec {
        event_type: "appointment.created",
        required: &["customer_name", "starts_at"],
    },
    EventSpec {
        event_type: "appointment.confirmed",
        required: &["customer_name", "staff_name", "starts_at"],
    },
    EventSpec {
        event_type: "appointment.cancelled",
        required: &["customer_name", "starts_at"],
    },
    EventSpec {
        event_type: "appointment.completed",
        required: &["customer_name", "staff_name"],
    },
    EventSpec {
        event_type: "booking.created",
        required: &["customer_name", "starts_at"],
    },
    EventSpec {
        event_type: "order.created",
        required: &["customer_name", "order_number", "total"],
    },
    EventSpec {
        event_type: "order.status_changed",
        required: &["order_number", "from_status", "to_status"],
    },
    EventSpec {
        event_type: "reservation.created",
        required: &["customer_name", "party_size", "starts_at"],
    },
    EventSpec {
        event_type: "reservation.status_changed",
        required: &["customer_name", "from_status", "to_status"],
    },
    EventSpec {
        event_type: "legal_case.status_changed",
        required: &["case_number", "from_status", "to_status"],
    },
    EventSpec {
        event_type: "repair.status_changed",
        required: &["ticket_number", "from_status", "to_status"],
    },
    EventSpec {
        event_type: "invoice.paid",
        required: &["invoice_number", "amount"],
    },
    EventSpec {
        event_type: "quote.accepted",
        required: &["quote_number", "customer_name"],
    },
    EventSpec {
        event_type: "support_ticket.created",
        required: &["subject", "customer_name"],
    },
    EventSpec {
        event_type: "review.received",
        required: &["customer_name", "rating"],
    },
];

/// Every catalogued event type
pub fn all() -> &'static [EventSpec] {
    CATALOG
}

/// Catalogue entry for an event type
pub fn spec_for(event_type: &str) -> Option<&'static EventSpec> {
    CATALOG.iter().find(|spec| spec.event_type == event_type)
}

/// Required fields for an event type; empty for uncatalogued types
pub fn required_fields(event_type: &str) -> &'static [&'static str] {
    spec_for(event_type).map(|spec| spec.required).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(
            required_fields("invoice.paid"),
            &["invoice_number", "amount"]
        );
        assert!(required_fields("custom.thing").is_empty());
        assert!(spec_for("order.created").is_some());
    }

    #[test]
    fn test_event_types_are_unique() {
        let mut types: Vec<_> = all().iter().map(|spec| spec.event_type).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), all().len());
    }
}
