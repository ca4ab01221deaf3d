use anyhow::Result;
use clap::Args;
use helpdesk_core::TicketStore;
use helpdesk_core::config::{ConfigOverrides, HelpdeskConfig};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Database file to create or migrate (overrides config and `HELPDESK_DB`).
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

impl InitArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen: None,
            db_path: self.db.clone(),
        }
    }
}

/// Execute `helpdesk init`: create the database if needed, bring the schema
/// up to date, and report the resulting version.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub fn run_init(config: &HelpdeskConfig) -> Result<()> {
    let store = TicketStore::open(&config.store.path, config.tickets.clone())?;
    let version = store.schema_version()?;

    println!(
        "Initialized ticket store at {} (schema v{version})",
        config.store.path.display()
    );
    Ok(())
}
