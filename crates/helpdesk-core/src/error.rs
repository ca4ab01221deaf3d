use std::fmt;

use crate::model::ParseEnumError;
use crate::numbering::ParseTicketNumberError;

/// Machine-readable error codes surfaced to API clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TicketNotFound,
    ValidationFailed,
    InvalidEnumValue,
    CorruptTicketNumber,
    StorageFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TicketNotFound => "E2001",
            Self::ValidationFailed => "E2002",
            Self::InvalidEnumValue => "E2005",
            Self::CorruptTicketNumber => "E3001",
            Self::StorageFailure => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and responses.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TicketNotFound => "Ticket not found",
            Self::ValidationFailed => "Validation failed",
            Self::InvalidEnumValue => "Invalid status/priority value",
            Self::CorruptTicketNumber => "Corrupt ticket number",
            Self::StorageFailure => "Storage failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::TicketNotFound | Self::ValidationFailed => None,
            Self::InvalidEnumValue => Some(
                "Use one of: low, medium, high, urgent / open, in_progress, resolved, closed.",
            ),
            Self::CorruptTicketNumber => {
                Some("Repair the ticket_number of the most recent ticket to PREFIX-<integer>.")
            }
            Self::StorageFailure => Some("Check disk space and database file permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// Whether the failure is on the server side (details stay in the logs).
    #[must_use]
    pub const fn is_internal(self) -> bool {
        matches!(
            self,
            Self::CorruptTicketNumber | Self::StorageFailure | Self::InternalUnexpected
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by [`crate::TicketStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum HelpdeskError {
    /// A required field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// A status/priority value outside the allowed set.
    #[error(transparent)]
    InvalidEnum(#[from] ParseEnumError),

    /// The addressed entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The stored ticket number cannot seed the sequence.
    #[error("corrupt ticket number: {0}")]
    CorruptTicketNumber(#[from] ParseTicketNumberError),

    /// Any persistence failure.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl HelpdeskError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn ticket_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "ticket",
            id: id.into(),
        }
    }

    /// Error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::InvalidEnum(_) => ErrorCode::InvalidEnumValue,
            Self::NotFound { .. } => ErrorCode::TicketNotFound,
            Self::CorruptTicketNumber(_) => ErrorCode::CorruptTicketNumber,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }
}

/// Result alias for store operations.
pub type Result<T, E = HelpdeskError> = std::result::Result<T, E>;
