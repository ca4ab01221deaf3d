use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment on a ticket. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for comment creation.
///
/// `ticket_id` is the raw identifier as supplied by the caller; the store
/// resolves it and rejects unknown tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewComment {
    pub ticket_id: String,
    pub author: String,
    pub content: String,
}
