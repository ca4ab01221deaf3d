//! Row writers for the ticket store.
//!
//! These helpers do no validation and open no transactions: the store calls
//! them inside one `BEGIN IMMEDIATE` transaction per operation, passing the
//! transaction as `&Connection`.

use anyhow::{Context, Result, ensure};
use rusqlite::{Connection, params};

use crate::model::{ActivityLogEntry, Comment, Ticket};

/// Insert a freshly created ticket.
///
/// # Errors
///
/// Returns an error if the insert fails (e.g. a duplicate ticket number).
pub fn insert_ticket(conn: &Connection, ticket: &Ticket) -> Result<()> {
    conn.execute(
        "INSERT INTO tickets (ticket_id, ticket_number, title, description, category, \
         priority, status, assigned_to, is_deleted, created_at_us, updated_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ticket.id.to_string(),
            ticket.ticket_number,
            ticket.title,
            ticket.description,
            ticket.category,
            ticket.priority.as_str(),
            ticket.status.as_str(),
            ticket.assigned_to,
            i64::from(ticket.is_deleted),
            ticket.created_at.timestamp_micros(),
            ticket.updated_at.timestamp_micros(),
        ],
    )
    .with_context(|| format!("insert ticket {}", ticket.ticket_number))?;
    Ok(())
}

/// Persist the mutable fields of an existing ticket.
///
/// Identity, number, title, description, category and `created_at` never
/// change after creation and are not written.
///
/// # Errors
///
/// Returns an error if the update fails or no row matches the ticket id.
pub fn update_ticket_row(conn: &Connection, ticket: &Ticket) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE tickets SET status = ?2, priority = ?3, assigned_to = ?4, \
             is_deleted = ?5, updated_at_us = ?6 \
             WHERE ticket_id = ?1",
            params![
                ticket.id.to_string(),
                ticket.status.as_str(),
                ticket.priority.as_str(),
                ticket.assigned_to,
                i64::from(ticket.is_deleted),
                ticket.updated_at.timestamp_micros(),
            ],
        )
        .with_context(|| format!("update ticket {}", ticket.ticket_number))?;
    ensure!(updated == 1, "ticket {} vanished during update", ticket.id);
    Ok(())
}

/// Append one audit entry.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn append_activity(conn: &Connection, entry: &ActivityLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO activity_log (entry_id, ticket_id, action, old_value, new_value, \
         performed_by, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.to_string(),
            entry.ticket_id.to_string(),
            entry.action.as_str(),
            entry.old_value,
            entry.new_value,
            entry.performed_by,
            entry.created_at.timestamp_micros(),
        ],
    )
    .with_context(|| format!("append {} for ticket {}", entry.action, entry.ticket_id))?;
    Ok(())
}

/// Insert one comment.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_comment(conn: &Connection, comment: &Comment) -> Result<()> {
    conn.execute(
        "INSERT INTO ticket_comments (comment_id, ticket_id, author, content, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.id.to_string(),
            comment.ticket_id.to_string(),
            comment.author,
            comment.content,
            comment.created_at.timestamp_micros(),
        ],
    )
    .with_context(|| format!("insert comment on ticket {}", comment.ticket_id))?;
    Ok(())
}
