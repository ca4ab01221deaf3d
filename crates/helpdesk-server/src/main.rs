#![forbid(unsafe_code)]

mod cmd;

use clap::{Parser, Subcommand};
use helpdesk_core::config::{self, ConfigOverrides};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "helpdesk: internal support ticket service",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (TOML). Missing file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run the HTTP API",
        long_about = "Open the ticket store and serve the HTTP API until interrupted.",
        after_help = "EXAMPLES:\n    # Serve with defaults (127.0.0.1:3000, ./helpdesk.db)\n    helpdesk serve\n\n    # Serve on all interfaces with a custom database\n    helpdesk serve --listen 0.0.0.0:8080 --db /var/lib/helpdesk/tickets.db"
    )]
    Serve(cmd::serve::ServeArgs),

    #[command(
        about = "Create or migrate the database",
        long_about = "Create the ticket database if needed, apply pending migrations, and exit.",
        after_help = "EXAMPLES:\n    # Initialize the default database\n    helpdesk init\n\n    # Initialize a specific file\n    helpdesk init --db /var/lib/helpdesk/tickets.db"
    )]
    Init(cmd::init::InitArgs),
}

impl Commands {
    fn overrides(&self) -> ConfigOverrides {
        match self {
            Self::Serve(args) => args.overrides(),
            Self::Init(args) => args.overrides(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HELPDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "helpdesk=debug,helpdesk_core=debug,helpdesk_server=debug,tower_http=debug,info"
        } else {
            "helpdesk=info,helpdesk_core=info,helpdesk_server=info,warn"
        })
    });

    let format = env::var("HELPDESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = config::resolve_config(&cli.config, &cli.command.overrides())?;

    match cli.command {
        Commands::Serve(_) => cmd::serve::run_serve(config).await,
        Commands::Init(_) => cmd::init::run_init(&config),
    }
}
