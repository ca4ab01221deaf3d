//! Human ticket numbers (`PREFIX-NNNN`).
//!
//! The next number comes from the `ticket_sequence` row for the prefix, read
//! and bumped inside the caller's write transaction, so concurrent creations
//! can never hand out the same number. A missing sequence row is seeded from
//! the most recently created ticket carrying the prefix, raised to the highest
//! existing number when the history is out of order. A latest number that
//! does not parse fails the creation instead of guessing.

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;

use crate::error::{HelpdeskError, Result};

/// Prefix used when no configuration overrides it.
pub const DEFAULT_PREFIX: &str = "INF";

/// First number handed out for an empty store.
pub const DEFAULT_BASE_NUMBER: u64 = 1001;

/// Separator between prefix and integer suffix.
pub const SEPARATOR: char = '-';

/// A parsed ticket number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketNumber {
    prefix: String,
    value: u64,
}

/// Error returned when a stored ticket number is not `PREFIX-<integer>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{raw}' is not a {prefix}{SEPARATOR}<integer> ticket number")]
pub struct ParseTicketNumberError {
    pub raw: String,
    pub prefix: String,
}

impl TicketNumber {
    #[must_use]
    pub fn new(prefix: &str, value: u64) -> Self {
        Self {
            prefix: prefix.to_string(),
            value,
        }
    }

    /// Parse `raw` as `{prefix}-{digits}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or separator is missing, or the suffix
    /// is not a plain non-negative integer.
    pub fn parse(raw: &str, prefix: &str) -> std::result::Result<Self, ParseTicketNumberError> {
        let err = || ParseTicketNumberError {
            raw: raw.to_string(),
            prefix: prefix.to_string(),
        };

        let digits = raw
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .ok_or_else(err)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let value = digits.parse::<u64>().map_err(|_| err())?;
        Ok(Self::new(prefix, value))
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.value
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.prefix, self.value)
    }
}

/// Allocate the next ticket number for `prefix`.
///
/// Must run inside a write transaction that also inserts the ticket.
///
/// # Errors
///
/// Returns [`HelpdeskError::CorruptTicketNumber`] if the sequence has to be
/// seeded and the most recent ticket's number does not parse, or a storage
/// error if the sequence row cannot be read or written.
pub fn next_ticket_number(conn: &Connection, prefix: &str, base: u64) -> Result<TicketNumber> {
    let stored: Option<i64> = conn
        .query_row(
            "SELECT last_value FROM ticket_sequence WHERE prefix = ?1",
            params![prefix],
            |row| row.get(0),
        )
        .optional()
        .context("read ticket sequence")?;

    let last = match stored {
        Some(value) => Some(
            u64::try_from(value).with_context(|| format!("negative ticket sequence {value}"))?,
        ),
        None => seed_from_latest(conn, prefix)?,
    };

    let next = match last {
        Some(value) => value
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("ticket sequence for {prefix} exhausted"))?,
        None => base,
    };

    let stored_next = i64::try_from(next).context("ticket number exceeds i64 range")?;
    conn.execute(
        "INSERT INTO ticket_sequence (prefix, last_value) VALUES (?1, ?2)
         ON CONFLICT(prefix) DO UPDATE SET last_value = excluded.last_value",
        params![prefix, stored_next],
    )
    .context("advance ticket sequence")?;

    Ok(TicketNumber::new(prefix, next))
}

/// Seed value for a prefix with no sequence row.
///
/// The most recently created ticket must parse. The seed is the larger of
/// its number and the highest well-formed number under the prefix, so an
/// out-of-order import never hands out a number already taken.
fn seed_from_latest(conn: &Connection, prefix: &str) -> Result<Option<u64>> {
    let lead = format!("{prefix}{SEPARATOR}");
    let latest: Option<String> = conn
        .query_row(
            "SELECT ticket_number FROM tickets
             WHERE substr(ticket_number, 1, length(?1)) = ?1
             ORDER BY created_at_us DESC, rowid DESC
             LIMIT 1",
            params![lead],
            |row| row.get(0),
        )
        .optional()
        .context("read latest ticket number")?;

    let Some(raw) = latest else {
        return Ok(None);
    };

    let parsed = TicketNumber::parse(&raw, prefix).map_err(|err| {
        tracing::error!(ticket_number = %raw, prefix, "cannot seed ticket sequence");
        HelpdeskError::from(err)
    })?;

    let highest: Option<i64> = conn
        .query_row(
            "SELECT MAX(CAST(substr(ticket_number, length(?1) + 1) AS INTEGER)) FROM tickets
             WHERE substr(ticket_number, 1, length(?1)) = ?1
               AND length(ticket_number) > length(?1)
               AND substr(ticket_number, length(?1) + 1) NOT GLOB '*[^0-9]*'",
            params![lead],
            |row| row.get(0),
        )
        .context("read highest ticket number")?;
    let highest = highest.and_then(|value| u64::try_from(value).ok()).unwrap_or(0);

    let seed = parsed.value().max(highest);
    if seed != parsed.value() {
        tracing::warn!(
            prefix,
            latest = parsed.value(),
            highest = seed,
            "latest ticket is not the highest number, seeding past the maximum"
        );
    }

    tracing::info!(prefix, last = seed, "seeded ticket sequence from existing tickets");
    Ok(Some(seed))
}
