//! `SQLite` read helpers for the ticket store.
//!
//! Provides typed query functions for the access patterns the API needs:
//! get a ticket by id, list/filter live tickets, read a ticket's comment
//! timeline and audit trail, and compute dashboard counters.
//!
//! All functions take a shared `&Connection` reference and return
//! `anyhow::Result<T>` with domain types (never raw rows).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params, params_from_iter, types::Type};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::model::{ActivityLogEntry, Comment, ParseEnumError, Priority, Status, Ticket};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Dashboard counters over all non-deleted tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
    /// Priority `high` or `urgent`.
    pub high_priority: u64,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter criteria for ticket listings.
///
/// All fields are optional and combined with AND semantics. Soft-deleted
/// tickets are never listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Filter by lifecycle status (exact match).
    pub status: Option<Status>,
    /// Filter by priority (exact match).
    pub priority: Option<Priority>,
    /// Filter by category (exact, case-sensitive match).
    pub category: Option<String>,
}

/// Value meaning "no filter" in query strings.
pub const MATCH_ALL: &str = "all";

fn filter_value(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(MATCH_ALL))
}

impl TicketFilter {
    /// Build a filter from raw query-string values.
    ///
    /// Absent, empty, and `"all"` values mean no filter for that field.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for a status or priority outside the
    /// allowed set.
    pub fn from_params(
        status: Option<&str>,
        priority: Option<&str>,
        category: Option<&str>,
    ) -> std::result::Result<Self, ParseEnumError> {
        Ok(Self {
            status: filter_value(status).map(Status::from_str).transpose()?,
            priority: filter_value(priority).map(Priority::from_str).transpose()?,
            category: filter_value(category).map(String::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Core query functions
// ---------------------------------------------------------------------------

const TICKET_COLUMNS: &str = "ticket_id, ticket_number, title, description, category, \
     priority, status, assigned_to, is_deleted, created_at_us, updated_at_us";

/// Fetch a single ticket by id, including soft-deleted tickets.
///
/// Returns `None` if no ticket has this id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_ticket(conn: &Connection, ticket_id: &Uuid) -> Result<Option<Ticket>> {
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1");
    let mut stmt = conn.prepare(&sql).context("prepare get_ticket query")?;

    match stmt.query_row(params![ticket_id.to_string()], row_to_ticket) {
        Ok(ticket) => Ok(Some(ticket)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_ticket for '{ticket_id}'")),
    }
}

/// Check whether a ticket exists (deleted or not).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn ticket_exists(conn: &Connection, ticket_id: &Uuid) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tickets WHERE ticket_id = ?1)",
        params![ticket_id.to_string()],
        |row| row.get(0),
    )
    .with_context(|| format!("ticket_exists for '{ticket_id}'"))
}

/// List live tickets matching the filter, newest first.
///
/// Tickets created in the same microsecond keep insertion order (later
/// insert first).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_tickets(conn: &Connection, filter: &TicketFilter) -> Result<Vec<Ticket>> {
    let mut conditions = vec!["is_deleted = 0".to_string()];
    let mut param_values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        param_values.push(status.as_str().to_string());
        conditions.push(format!("status = ?{}", param_values.len()));
    }

    if let Some(priority) = filter.priority {
        param_values.push(priority.as_str().to_string());
        conditions.push(format!("priority = ?{}", param_values.len()));
    }

    if let Some(ref category) = filter.category {
        param_values.push(category.clone());
        conditions.push(format!("category = ?{}", param_values.len()));
    }

    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE {} \
         ORDER BY created_at_us DESC, rowid DESC",
        conditions.join(" AND ")
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare list_tickets query: {sql}"))?;

    let rows = stmt
        .query_map(params_from_iter(param_values.iter()), row_to_ticket)
        .context("execute list_tickets query")?;

    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(row.context("read list_tickets row")?);
    }
    Ok(tickets)
}

/// Comments for a ticket, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_comments(conn: &Connection, ticket_id: &Uuid) -> Result<Vec<Comment>> {
    let mut stmt = conn
        .prepare(
            "SELECT comment_id, ticket_id, author, content, created_at_us \
             FROM ticket_comments WHERE ticket_id = ?1 \
             ORDER BY created_at_us ASC, rowid ASC",
        )
        .context("prepare get_comments query")?;

    let rows = stmt
        .query_map(params![ticket_id.to_string()], row_to_comment)
        .context("execute get_comments query")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row.context("read comment row")?);
    }
    Ok(comments)
}

/// Audit trail for a ticket, newest first.
///
/// Entries written in one transaction share a timestamp; the later insert
/// is listed first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_activity(conn: &Connection, ticket_id: &Uuid) -> Result<Vec<ActivityLogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT entry_id, ticket_id, action, old_value, new_value, performed_by, created_at_us \
             FROM activity_log WHERE ticket_id = ?1 \
             ORDER BY created_at_us DESC, rowid DESC",
        )
        .context("prepare get_activity query")?;

    let rows = stmt
        .query_map(params![ticket_id.to_string()], row_to_activity)
        .context("execute get_activity query")?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.context("read activity row")?);
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Aggregate helper query APIs
// ---------------------------------------------------------------------------

/// Dashboard counters, recomputed from the table on every call.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn ticket_stats(conn: &Connection) -> Result<TicketStats> {
    let by_status = count_tickets_grouped(conn, "status")?;
    let by_priority = count_tickets_grouped(conn, "priority")?;

    let status_count = |status: Status| by_status.get(status.as_str()).copied().unwrap_or(0);

    Ok(TicketStats {
        total: by_status.values().sum(),
        open: status_count(Status::Open),
        in_progress: status_count(Status::InProgress),
        resolved: status_count(Status::Resolved),
        closed: status_count(Status::Closed),
        high_priority: Priority::ALL
            .into_iter()
            .filter(|p| p.is_high())
            .map(|p| by_priority.get(p.as_str()).copied().unwrap_or(0))
            .sum(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn count_tickets_grouped(conn: &Connection, column: &str) -> Result<HashMap<String, u64>> {
    let sql =
        format!("SELECT {column}, COUNT(*) FROM tickets WHERE is_deleted = 0 GROUP BY {column}");
    let mut stmt = conn
        .prepare(&sql)
        .context("prepare aggregate count query")?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        Ok((key, count_column(row, 1)?))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
        let (key, count) = row.context("read aggregate count")?;
        counts.insert(key, count);
    }

    Ok(counts)
}

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|err| conversion_error(idx, Type::Text, err))
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let count: i64 = row.get(idx)?;
    u64::try_from(count).map_err(|err| conversion_error(idx, Type::Integer, err))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        conversion_error(
            idx,
            Type::Integer,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("timestamp {micros}us out of range"),
            ),
        )
    })
}

fn row_to_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: text_column(row, 0)?,
        ticket_number: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        priority: text_column(row, 5)?,
        status: text_column(row, 6)?,
        assigned_to: row.get(7)?,
        is_deleted: row.get::<_, i64>(8)? != 0,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: text_column(row, 0)?,
        ticket_id: text_column(row, 1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<ActivityLogEntry> {
    Ok(ActivityLogEntry {
        id: text_column(row, 0)?,
        ticket_id: text_column(row, 1)?,
        action: text_column(row, 2)?,
        old_value: row.get(3)?,
        new_value: row.get(4)?,
        performed_by: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
