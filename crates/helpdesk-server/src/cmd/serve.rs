use anyhow::{Context as _, Result};
use clap::Args;
use helpdesk_core::TicketStore;
use helpdesk_core::config::{ConfigOverrides, HelpdeskConfig};
use helpdesk_server::{AppState, build_router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and `HELPDESK_LISTEN`).
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Database file (overrides config and `HELPDESK_DB`).
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl ServeArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen: self.listen,
            db_path: self.db.clone(),
        }
    }
}

/// Execute `helpdesk serve`: open the store and serve the HTTP API until
/// Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn run_serve(config: HelpdeskConfig) -> Result<()> {
    let store = TicketStore::open(&config.store.path, config.tickets)?;
    let app = build_router(Arc::new(AppState::new(store)));

    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    info!(addr = %config.server.listen, "helpdesk API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("helpdesk API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
