//! Audit trail entries.
//!
//! Entries are write-once: the store only ever inserts them, and the schema
//! rejects UPDATE and DELETE on the `activity_log` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::ParseEnumError;

/// What happened to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    TicketCreated,
    StatusChanged,
    PriorityChanged,
    Assigned,
    TicketDeleted,
    TicketRestored,
    CommentAdded,
}

impl ActivityAction {
    pub const ALL: [Self; 7] = [
        Self::TicketCreated,
        Self::StatusChanged,
        Self::PriorityChanged,
        Self::Assigned,
        Self::TicketDeleted,
        Self::TicketRestored,
        Self::CommentAdded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket_created",
            Self::StatusChanged => "status_changed",
            Self::PriorityChanged => "priority_changed",
            Self::Assigned => "assigned",
            Self::TicketDeleted => "ticket_deleted",
            Self::TicketRestored => "ticket_restored",
            Self::CommentAdded => "comment_added",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                expected: "activity action",
                got: s.to_string(),
            })
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub action: ActivityAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}
