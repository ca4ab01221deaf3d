//! Canonical SQLite schema for the ticket store.
//!
//! - `tickets` holds the current state of each ticket; rows are never
//!   physically deleted, only flagged with `is_deleted`
//! - `ticket_comments` and `activity_log` are append-only; triggers abort any
//!   UPDATE or DELETE against them
//! - `ticket_sequence` holds the last handed-out number per prefix
//! - `store_meta` tracks the schema version alongside `PRAGMA user_version`

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id TEXT PRIMARY KEY,
    ticket_number TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL CHECK (length(trim(description)) > 0),
    category TEXT NOT NULL DEFAULT 'General',
    priority TEXT NOT NULL DEFAULT 'medium'
        CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'in_progress', 'resolved', 'closed')),
    assigned_to TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0 CHECK (is_deleted IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ticket_comments (
    comment_id TEXT PRIMARY KEY,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id),
    author TEXT NOT NULL CHECK (length(trim(author)) > 0),
    content TEXT NOT NULL CHECK (length(trim(content)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_log (
    entry_id TEXT PRIMARY KEY,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id),
    action TEXT NOT NULL CHECK (action IN (
        'ticket_created',
        'status_changed',
        'priority_changed',
        'assigned',
        'ticket_deleted',
        'ticket_restored',
        'comment_added'
    )),
    old_value TEXT,
    new_value TEXT,
    performed_by TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ticket_sequence (
    prefix TEXT PRIMARY KEY,
    last_value INTEGER NOT NULL CHECK (last_value >= 0)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes and append-only guards.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_deleted_created
    ON tickets(is_deleted, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_tickets_status
    ON tickets(status, is_deleted);

CREATE INDEX IF NOT EXISTS idx_tickets_priority
    ON tickets(priority, is_deleted);

CREATE INDEX IF NOT EXISTS idx_tickets_category
    ON tickets(category, is_deleted);

CREATE INDEX IF NOT EXISTS idx_ticket_comments_ticket_created
    ON ticket_comments(ticket_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_activity_log_ticket_created
    ON activity_log(ticket_id, created_at_us DESC);

CREATE TRIGGER IF NOT EXISTS activity_log_no_update
BEFORE UPDATE ON activity_log
BEGIN
    SELECT RAISE(ABORT, 'activity log entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS activity_log_no_delete
BEFORE DELETE ON activity_log
BEGIN
    SELECT RAISE(ABORT, 'activity log entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ticket_comments_no_update
BEFORE UPDATE ON ticket_comments
BEGIN
    SELECT RAISE(ABORT, 'comments are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ticket_comments_no_delete
BEFORE DELETE ON ticket_comments
BEGIN
    SELECT RAISE(ABORT, 'comments are immutable');
END;

CREATE TRIGGER IF NOT EXISTS tickets_no_delete
BEFORE DELETE ON tickets
BEGIN
    SELECT RAISE(ABORT, 'tickets are soft-deleted only');
END;

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by list/filter/detail query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tickets_deleted_created",
    "idx_tickets_status",
    "idx_tickets_priority",
    "idx_tickets_category",
    "idx_ticket_comments_ticket_created",
    "idx_activity_log_ticket_created",
];

/// Triggers that keep comments, activity, and tickets append-only.
pub const REQUIRED_TRIGGERS: &[&str] = &[
    "activity_log_no_update",
    "activity_log_no_delete",
    "ticket_comments_no_update",
    "ticket_comments_no_delete",
    "tickets_no_delete",
];
