mod comments;
mod tickets;

use axum::routing::{get, post};
use axum::{Json, Router};
use helpdesk_core::TicketStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub use comments::CreateCommentRequest;
pub use tickets::{CreateTicketRequest, ListTicketsParams, UpdateTicketRequest};

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    pub store: TicketStore,
}

impl AppState {
    #[must_use]
    pub const fn new(store: TicketStore) -> Self {
        Self { store }
    }
}

/// Build the full router: `/health`, and the ticket API at `/` and `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = api_routes();

    Router::new()
        .route("/health", get(health))
        .merge(api.clone())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/stats", get(tickets::ticket_stats))
        .route(
            "/tickets/:id",
            get(tickets::ticket_details).patch(tickets::update_ticket),
        )
        .route("/comments", post(comments::create_comment))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run a store call on the blocking pool.
async fn with_store<T, F>(state: &Arc<AppState>, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TicketStore) -> helpdesk_core::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    Ok(tokio::task::spawn_blocking(move || call(&state.store)).await??)
}

/// Blank means "not supplied" for optional enum fields.
fn parse_optional<T>(raw: Option<String>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
    helpdesk_core::HelpdeskError: From<T::Err>,
{
    raw.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<T>)
        .transpose()
        .map_err(|err| ApiError::Store(err.into()))
}
