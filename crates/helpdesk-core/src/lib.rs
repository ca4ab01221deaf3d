//! helpdesk-core library.
//!
//! Ticket model, SQLite-backed store, ticket numbering, and the append-only
//! activity trail that records every observable ticket change.
//!
//! # Conventions
//!
//! - **Errors**: store operations return [`error::Result`]; internal query
//!   helpers use `anyhow::Result` with `.context(...)` and are converted at
//!   the store boundary.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod numbering;
pub mod store;

pub use error::{ErrorCode, HelpdeskError, Result};
pub use store::TicketStore;
