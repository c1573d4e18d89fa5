//! Built-in transition tables

use crate::{StateMachine, TransitionTable};

impl TransitionTable {
    /// Tables for the platform's status-bearing entity kinds.
    ///
    /// Deployments that need different rules overlay their own file with
    /// [`TransitionTable::merge`].
    pub fn standard() -> Self {
        Self::builder()
            .kind("appointment", appointment())
            .kind("booking", booking())
            .kind("order", order())
            .kind("reservation", reservation())
            .kind("legal_case", legal_case())
            .kind("repair", repair())
            .kind("invoice", invoice())
            .kind("work_order", work_order())
            .kind("quote", quote())
            .kind("support_ticket", support_ticket())
            .kind("delivery", delivery())
            .build()
    }
}

fn appointment() -> StateMachine {
    StateMachine::new()
        .allow("scheduled", ["confirmed", "cancelled", "rescheduled"])
        .allow("rescheduled", ["confirmed", "cancelled"])
        .allow("confirmed", ["checked_in", "cancelled", "no_show"])
        .allow("checked_in", ["in_progress"])
        .allow("in_progress", ["completed"])
}

fn booking() -> StateMachine {
    StateMachine::new()
        .allow("pending", ["confirmed", "cancelled"])
        .allow("confirmed", ["completed", "cancelled", "no_show"])
}

fn order() -> StateMachine {
    StateMachine::new()
        .allow("pending", ["confirmed", "cancelled"])
        .allow("confirmed", ["processing", "cancelled"])
        .allow("processing", ["shipped", "cancelled"])
        .allow("shipped", ["delivered"])
        .allow("delivered", ["refunded"])
}

fn reservation() -> StateMachine {
    StateMachine::new()
        .allow("requested", ["confirmed", "declined"])
        .allow("confirmed", ["seated", "cancelled", "no_show"])
        .allow("seated", ["completed"])
}

fn legal_case() -> StateMachine {
    StateMachine::new()
        .allow("intake", ["open", "declined"])
        .allow("open", ["discovery", "on_hold", "settled", "closed"])
        .allow("discovery", ["trial", "settled", "on_hold"])
        .allow("on_hold", ["open"])
        .allow("trial", ["judgment", "settled"])
        .allow("judgment", ["appeal", "closed"])
        .allow("appeal", ["closed"])
        .allow("settled", ["closed"])
}

fn repair() -> StateMachine {
    StateMachine::new()
        .allow("received", ["diagnosing", "cancelled"])
        .allow("diagnosing", ["awaiting_approval", "cancelled"])
        .allow("awaiting_approval", ["in_repair", "cancelled"])
        .allow("in_repair", ["awaiting_parts", "ready"])
        .allow("awaiting_parts", ["in_repair"])
        .allow("ready", ["picked_up"])
}

fn invoice() -> StateMachine {
    StateMachine::new()
        .allow("draft", ["sent", "void"])
        .allow("sent", ["paid", "partially_paid", "overdue", "void"])
        .allow("partially_paid", ["paid", "overdue"])
        .allow("overdue", ["paid", "partially_paid", "void"])
        .allow("paid", ["refunded"])
}

fn work_order() -> StateMachine {
    StateMachine::new()
        .allow("open", ["assigned", "cancelled"])
        .allow("assigned", ["in_progress", "cancelled"])
        .allow("in_progress", ["on_hold", "completed"])
        .allow("on_hold", ["in_progress", "cancelled"])
        .allow("completed", ["closed"])
}

fn quote() -> StateMachine {
    StateMachine::new()
        .allow("draft", ["sent"])
        .allow("sent", ["accepted", "rejected", "expired"])
        .allow("accepted", ["converted"])
}

fn support_ticket() -> StateMachine {
    StateMachine::new()
        .allow("new", ["open", "closed"])
        .allow("open", ["pending", "resolved"])
        .allow("pending", ["open", "resolved"])
        .allow("resolved", ["closed", "open"])
}

fn delivery() -> StateMachine {
    StateMachine::new()
        .allow("scheduled", ["dispatched", "cancelled"])
        .allow("dispatched", ["in_transit", "failed"])
        .allow("in_transit", ["delivered", "failed"])
        .allow("failed", ["scheduled", "returned"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RejectReason, validate};

    #[test]
    fn test_standard_kinds() {
        let table = TransitionTable::standard();
        let kinds: Vec<_> = table.kinds().into_iter().map(|k| k.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "appointment",
                "booking",
                "delivery",
                "invoice",
                "legal_case",
                "order",
                "quote",
                "repair",
                "reservation",
                "support_ticket",
                "work_order",
            ]
        );
    }

    #[test]
    fn test_every_machine_has_a_terminal_state() {
        let table = TransitionTable::standard();
        for kind in table.kinds() {
            let machine = table.machine(kind.as_str()).unwrap();
            assert!(
                machine
                    .states()
                    .into_iter()
                    .any(|state| table.is_terminal(kind.as_str(), state)),
                "{kind} has no terminal state"
            );
        }
    }

    #[test]
    fn test_completed_differs_by_kind() {
        let table = TransitionTable::standard();
        assert!(validate(&table, "work_order", "completed", "closed").is_allowed());
        assert_eq!(
            validate(&table, "appointment", "completed", "closed").reason(),
            Some(RejectReason::UnknownState)
        );
    }
}
