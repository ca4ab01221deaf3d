use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use helpdesk_core::{ErrorCode, HelpdeskError};
use serde_json::json;

/// Errors surfaced by HTTP handlers.
///
/// Rendered as `{"error": <message>, "code": <E####>}`, plus a `hint` for
/// client errors whose code carries one. Server-side failures are logged with
/// their full context chain and operator hint, and answered with a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] HelpdeskError),

    /// Malformed request body or query string.
    #[error("{0}")]
    BadRequest(String),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Store(err) => err.code(),
            Self::BadRequest(_) => ErrorCode::ValidationFailed,
            Self::Task(_) => ErrorCode::InternalUnexpected,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.code() {
            ErrorCode::TicketNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationFailed | ErrorCode::InvalidEnumValue => StatusCode::BAD_REQUEST,
            ErrorCode::CorruptTicketNumber
            | ErrorCode::StorageFailure
            | ErrorCode::InternalUnexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code.is_internal() {
            tracing::error!(
                code = code.code(),
                hint = code.hint().unwrap_or(""),
                error = %format!("{self:#}"),
                "request failed"
            );
            let body = json!({ "error": code.message(), "code": code.code() });
            return (self.status(), Json(body)).into_response();
        }

        tracing::debug!(code = code.code(), error = %self, "request rejected");
        let mut body = json!({ "error": self.to_string(), "code": code.code() });
        if let Some(hint) = code.hint() {
            body["hint"] = json!(hint);
        }
        (self.status(), Json(body)).into_response()
    }
}
