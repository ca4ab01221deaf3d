//! Partial ticket updates and the field changes they produce.
//!
//! [`TicketPatch::apply`] is the pure half of the update path: it compares
//! each requested field against the ticket, records a [`FieldChange`] for
//! every field that actually differs, then writes the new value. The store
//! persists the ticket and one activity entry per change in one transaction.
//!
//! Changes are always produced in the order status, priority, assignee,
//! deletion flag, so the audit trail replays deterministically.

use super::{ActivityAction, Priority, Status, Ticket};

/// Optional field changes for one update call.
///
/// `assigned_to` distinguishes "not supplied" (`None`) from "unassign"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Option<String>>,
    pub is_deleted: Option<bool>,
}

/// One observed transition, ready to become an activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub action: ActivityAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    fn transition(action: ActivityAction, old: Option<String>, new: Option<String>) -> Self {
        Self {
            action,
            old_value: old,
            new_value: new,
        }
    }

    const fn marker(action: ActivityAction) -> Self {
        Self {
            action,
            old_value: None,
            new_value: None,
        }
    }
}

impl TicketPatch {
    /// True when no field was supplied at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.is_deleted.is_none()
    }

    /// Apply the patch to `ticket`, returning the changes in log order.
    ///
    /// Fields equal to the current value are skipped. A blank assignee is
    /// treated as unassigned. Timestamps are left to the caller.
    pub fn apply(&self, ticket: &mut Ticket) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(status) = self.status.filter(|s| *s != ticket.status) {
            changes.push(FieldChange::transition(
                ActivityAction::StatusChanged,
                Some(ticket.status.to_string()),
                Some(status.to_string()),
            ));
            ticket.status = status;
        }

        if let Some(priority) = self.priority.filter(|p| *p != ticket.priority) {
            changes.push(FieldChange::transition(
                ActivityAction::PriorityChanged,
                Some(ticket.priority.to_string()),
                Some(priority.to_string()),
            ));
            ticket.priority = priority;
        }

        if let Some(requested) = &self.assigned_to {
            let requested = normalize_assignee(requested.as_deref());
            if requested != ticket.assigned_to {
                changes.push(FieldChange::transition(
                    ActivityAction::Assigned,
                    ticket.assigned_to.clone(),
                    requested.clone(),
                ));
                ticket.assigned_to = requested;
            }
        }

        if let Some(is_deleted) = self.is_deleted.filter(|d| *d != ticket.is_deleted) {
            let action = if is_deleted {
                ActivityAction::TicketDeleted
            } else {
                ActivityAction::TicketRestored
            };
            changes.push(FieldChange::marker(action));
            ticket.is_deleted = is_deleted;
        }

        changes
    }
}

fn normalize_assignee(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
}
