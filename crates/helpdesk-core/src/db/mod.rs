//! SQLite ticket store utilities.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers are not blocked by the single writer
//! - `busy_timeout = 5s` to ride out transient lock contention
//! - `foreign_keys = ON` so comments and activity rows always reference a ticket

pub mod migrations;
pub mod query;
pub mod schema;
pub mod write;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ticket database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open ticket database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    Ok(conn)
}

/// Open a private in-memory store with the latest schema.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, open_in_memory, open_store};
    use crate::db::migrations;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("data").join("helpdesk.sqlite3");
        (dir, path)
    }

    #[test]
    fn open_store_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(
            u128::from(busy_timeout_ms),
            DEFAULT_BUSY_TIMEOUT.as_millis()
        );

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_store_runs_migrations() {
        let (_dir, path) = temp_db_path();
        let conn = open_store(&path).expect("open store");

        let version = migrations::current_schema_version(&conn).expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);

        let meta_version: i64 = conn
            .query_row(
                "SELECT schema_version FROM store_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .expect("store_meta schema version");
        assert_eq!(meta_version, i64::from(migrations::LATEST_SCHEMA_VERSION));
    }

    #[test]
    fn reopening_keeps_data() {
        let (_dir, path) = temp_db_path();
        {
            let conn = open_store(&path).expect("open store");
            conn.execute(
                "INSERT INTO ticket_sequence (prefix, last_value) VALUES ('INF', 1004)",
                [],
            )
            .expect("insert sequence");
        }
        let conn = open_store(&path).expect("reopen store");
        let last: i64 = conn
            .query_row(
                "SELECT last_value FROM ticket_sequence WHERE prefix = 'INF'",
                [],
                |row| row.get(0),
            )
            .expect("read sequence");
        assert_eq!(last, 1004);
    }

    #[test]
    fn in_memory_store_enforces_foreign_keys() {
        let conn = open_in_memory().expect("open in-memory");
        let result = conn.execute(
            "INSERT INTO ticket_comments (comment_id, ticket_id, author, content, created_at_us)
             VALUES ('c1', 'missing', 'sam', 'hello', 1)",
            [],
        );
        assert!(result.is_err());
    }
}
