//! The ticket store: tickets, comments, and the activity trail in one
//! SQLite database.
//!
//! Every write runs in a single `BEGIN IMMEDIATE` transaction, so a ticket
//! change and the activity entries describing it are committed together or
//! not at all, and ticket numbers are allocated under the write lock.

use anyhow::{Context, anyhow};
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::TicketConfig;
use crate::db::{self, migrations, query, write};
use crate::db::query::{TicketFilter, TicketStats};
use crate::error::{HelpdeskError, Result};
use crate::model::{
    ActivityAction, ActivityLogEntry, Comment, NewComment, NewTicket, Status, Ticket,
    TicketDetails, TicketPatch,
};
use crate::numbering;

/// Performer recorded on `ticket_created` entries.
pub const SYSTEM_PERFORMER: &str = "System";

/// Owns the database connection and the ticket settings.
///
/// Constructed once at startup and shared by reference (e.g. behind an
/// `Arc`); the connection is guarded by a mutex.
#[derive(Debug)]
pub struct TicketStore {
    conn: Mutex<Connection>,
    settings: TicketConfig,
}

impl TicketStore {
    /// Open (or create) the database at `path` and migrate it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be opened or migrated.
    pub fn open(path: &Path, settings: TicketConfig) -> Result<Self> {
        let conn = db::open_store(path)?;
        info!(path = %path.display(), prefix = %settings.prefix, "ticket store opened");
        Ok(Self::from_connection(conn, settings))
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schema cannot be applied.
    pub fn open_in_memory(settings: TicketConfig) -> Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?, settings))
    }

    /// Wrap an already migrated connection.
    #[must_use]
    pub const fn from_connection(conn: Connection, settings: TicketConfig) -> Self {
        Self {
            conn: Mutex::new(conn),
            settings,
        }
    }

    /// Schema version of the open database.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the version cannot be read.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.lock()?;
        Ok(migrations::current_schema_version(&conn).context("read schema version")?)
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    /// Create a ticket with the next number and log `ticket_created`.
    ///
    /// Title and description are trimmed and must be non-empty. A missing or
    /// blank category falls back to the configured default; a missing
    /// priority falls back to `medium`. Status always starts `open`.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Validation`] for a blank title or
    /// description, [`HelpdeskError::CorruptTicketNumber`] if the number
    /// sequence cannot be seeded, or a storage error.
    pub fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        let title = new.title.trim();
        let description = new.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(HelpdeskError::validation(
                "Title and description are required",
            ));
        }

        let category = new
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.settings.default_category)
            .to_string();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("begin create transaction")?;

        let number =
            numbering::next_ticket_number(&tx, &self.settings.prefix, self.settings.base_number)?;

        let now = now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            ticket_number: number.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category,
            priority: new.priority.unwrap_or_default(),
            status: Status::Open,
            assigned_to: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        write::insert_ticket(&tx, &ticket)?;
        write::append_activity(
            &tx,
            &ActivityLogEntry {
                id: Uuid::new_v4(),
                ticket_id: ticket.id,
                action: ActivityAction::TicketCreated,
                old_value: None,
                new_value: Some(Status::Open.to_string()),
                performed_by: SYSTEM_PERFORMER.to_string(),
                created_at: now,
            },
        )?;
        tx.commit().context("commit ticket creation")?;

        info!(
            ticket_id = %ticket.id,
            ticket_number = %ticket.ticket_number,
            priority = %ticket.priority,
            "ticket created"
        );
        Ok(ticket)
    }

    /// Fetch one ticket by id. Soft-deleted tickets are returned too.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::NotFound`] for an unknown or malformed id.
    pub fn get_ticket(&self, id: &str) -> Result<Ticket> {
        let ticket_id = parse_ticket_id(id)?;
        let conn = self.lock()?;
        query::get_ticket(&conn, &ticket_id)?.ok_or_else(|| HelpdeskError::ticket_not_found(id))
    }

    /// A ticket with its comments (oldest first) and activity (newest first).
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::NotFound`] for an unknown or malformed id.
    pub fn ticket_details(&self, id: &str) -> Result<TicketDetails> {
        let ticket_id = parse_ticket_id(id)?;
        let conn = self.lock()?;
        let ticket = query::get_ticket(&conn, &ticket_id)?
            .ok_or_else(|| HelpdeskError::ticket_not_found(id))?;
        let comments = query::get_comments(&conn, &ticket_id)?;
        let activity_logs = query::get_activity(&conn, &ticket_id)?;
        Ok(TicketDetails {
            ticket,
            comments,
            activity_logs,
        })
    }

    /// Live tickets matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let conn = self.lock()?;
        Ok(query::list_tickets(&conn, filter)?)
    }

    /// Dashboard counters over live tickets.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn stats(&self) -> Result<TicketStats> {
        let conn = self.lock()?;
        Ok(query::ticket_stats(&conn)?)
    }

    /// Apply `patch` to a ticket and log one activity entry per changed
    /// field, in the order status, priority, assignee, deletion flag.
    ///
    /// `performed_by` falls back to the configured default performer when
    /// absent or blank. A patch that changes nothing writes nothing and
    /// leaves `updated_at` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::NotFound`] for an unknown or malformed id,
    /// or a storage error; in both cases nothing is written.
    pub fn update_ticket(
        &self,
        id: &str,
        patch: &TicketPatch,
        performed_by: Option<&str>,
    ) -> Result<Ticket> {
        let ticket_id = parse_ticket_id(id)?;
        let performer = performed_by
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.settings.default_performer)
            .to_string();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("begin update transaction")?;

        let mut ticket = query::get_ticket(&tx, &ticket_id)?
            .ok_or_else(|| HelpdeskError::ticket_not_found(id))?;

        let changes = patch.apply(&mut ticket);
        if changes.is_empty() {
            debug!(ticket_id = %ticket.id, "update changed nothing");
            return Ok(ticket);
        }

        let now = now();
        ticket.updated_at = now;
        write::update_ticket_row(&tx, &ticket)?;

        for change in &changes {
            write::append_activity(
                &tx,
                &ActivityLogEntry {
                    id: Uuid::new_v4(),
                    ticket_id: ticket.id,
                    action: change.action,
                    old_value: change.old_value.clone(),
                    new_value: change.new_value.clone(),
                    performed_by: performer.clone(),
                    created_at: now,
                },
            )?;
        }
        tx.commit().context("commit ticket update")?;

        for change in &changes {
            info!(
                ticket_id = %ticket.id,
                ticket_number = %ticket.ticket_number,
                action = %change.action,
                old = change.old_value.as_deref().unwrap_or(""),
                new = change.new_value.as_deref().unwrap_or(""),
                performed_by = %performer,
                "ticket updated"
            );
        }
        Ok(ticket)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Append a comment and a `comment_added` entry.
    ///
    /// Comments on soft-deleted tickets are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Validation`] if any field is blank,
    /// [`HelpdeskError::NotFound`] if the ticket does not exist, or a
    /// storage error. Nothing is written on failure.
    pub fn add_comment(&self, new: NewComment) -> Result<Comment> {
        let author = new.author.trim();
        if new.ticket_id.trim().is_empty() || author.is_empty() || new.content.trim().is_empty() {
            return Err(HelpdeskError::validation(
                "Ticket ID, author, and content are required",
            ));
        }
        let ticket_id = parse_ticket_id(&new.ticket_id)?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("begin comment transaction")?;

        if !query::ticket_exists(&tx, &ticket_id)? {
            return Err(HelpdeskError::ticket_not_found(new.ticket_id));
        }

        let now = now();
        let comment = Comment {
            id: Uuid::new_v4(),
            ticket_id,
            author: author.to_string(),
            content: new.content,
            created_at: now,
        };

        write::insert_comment(&tx, &comment)?;
        write::append_activity(
            &tx,
            &ActivityLogEntry {
                id: Uuid::new_v4(),
                ticket_id,
                action: ActivityAction::CommentAdded,
                old_value: None,
                new_value: Some(format!("Comment by {author}")),
                performed_by: author.to_string(),
                created_at: now,
            },
        )?;
        tx.commit().context("commit comment")?;

        info!(ticket_id = %ticket_id, author = %comment.author, "comment added");
        Ok(comment)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HelpdeskError::Storage(anyhow!("ticket store connection lock poisoned")))
    }
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Ids are opaque to callers: anything that is not a UUID simply names no
/// ticket.
fn parse_ticket_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| HelpdeskError::ticket_not_found(raw))
}
