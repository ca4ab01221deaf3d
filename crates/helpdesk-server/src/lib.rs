//! HTTP API for the helpdesk ticket store.
//!
//! [`build_router`] wires the ticket, comment and stats endpoints onto an
//! axum [`Router`]. Every route is served both at the root and under
//! `/api`. Store calls run on the blocking thread pool.

pub mod api;
pub mod error;

pub use api::{AppState, build_router};
pub use error::ApiError;
