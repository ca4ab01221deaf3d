use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::numbering::{DEFAULT_BASE_NUMBER, DEFAULT_PREFIX};

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "helpdesk.toml";

/// Environment variable overriding `[server] listen`.
pub const ENV_LISTEN: &str = "HELPDESK_LISTEN";

/// Environment variable overriding `[store] path`.
pub const ENV_DB: &str = "HELPDESK_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tickets: TicketConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Ticket numbering and defaulting rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// First number handed out when no ticket carries the prefix yet.
    #[serde(default = "default_base_number")]
    pub base_number: u64,
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Recorded as `performed_by` when an update names nobody.
    #[serde(default = "default_performer")]
    pub default_performer: String,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            base_number: default_base_number(),
            default_category: default_category(),
            default_performer: default_performer(),
        }
    }
}

impl TicketConfig {
    /// Check the settings the store relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is empty or not ASCII alphanumeric,
    /// the base number is zero, or a default name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() || !self.prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            bail!(
                "tickets.prefix must be non-empty ASCII letters/digits, got '{}'",
                self.prefix
            );
        }
        if self.base_number == 0 {
            bail!("tickets.base_number must be at least 1");
        }
        if self.default_category.trim().is_empty() {
            bail!("tickets.default_category must not be blank");
        }
        if self.default_performer.trim().is_empty() {
            bail!("tickets.default_performer must not be blank");
        }
        Ok(())
    }
}

/// Command-line values that win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen: Option<SocketAddr>,
    pub db_path: Option<PathBuf>,
}

/// Load `path`, or defaults when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<HelpdeskConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(HelpdeskConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<HelpdeskConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the config file, then apply environment and command-line overrides
/// in that order, and validate the result.
///
/// # Errors
///
/// Returns an error if loading fails, an environment override does not
/// parse, or the final settings are invalid.
pub fn resolve_config(path: &Path, cli: &ConfigOverrides) -> Result<HelpdeskConfig> {
    let config = load_config(path)?;
    let resolved = apply_overrides(
        config,
        env::var(ENV_LISTEN).ok(),
        env::var_os(ENV_DB).map(PathBuf::from),
        cli,
    )?;
    resolved.tickets.validate()?;
    Ok(resolved)
}

fn apply_overrides(
    mut config: HelpdeskConfig,
    env_listen: Option<String>,
    env_db: Option<PathBuf>,
    cli: &ConfigOverrides,
) -> Result<HelpdeskConfig> {
    if let Some(raw) = env_listen.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        config.server.listen = raw
            .parse()
            .with_context(|| format!("{ENV_LISTEN}='{raw}' is not a socket address"))?;
    }

    if let Some(path) = env_db.filter(|p| !p.as_os_str().is_empty()) {
        config.store.path = path;
    }

    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }

    if let Some(ref path) = cli.db_path {
        config.store.path.clone_from(path);
    }

    Ok(config)
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_store_path() -> PathBuf {
    PathBuf::from("helpdesk.db")
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

const fn default_base_number() -> u64 {
    DEFAULT_BASE_NUMBER
}

fn default_category() -> String {
    "General".to_string()
}

fn default_performer() -> String {
    "Admin".to_string()
}
