//! BookSmart CLI
//!
//! Interactive terminal client for the BookSmart library service.
//!
//! # Usage
//!
//! ```bash
//! # Use the configured service
//! booksmart
//!
//! # Point at another server and log requests
//! booksmart --base-url http://library.local:8000 --verbose
//! ```

use std::path::PathBuf;

use anyhow::Result;
use booksmart_core::Session;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod menu;
mod prompt;
mod render;

#[derive(Parser)]
#[command(name = "booksmart")]
#[command(about = "Browse, reserve and rate books in the BookSmart library")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Library service base URL, overriding the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    config.validate()?;

    init_logging(&config.log_level, cli.verbose);
    info!("Loaded configuration from {:?}", config.config_path);

    let session = Session::new(config.session_settings())?;
    let mut app = menu::App::new(session, prompt::TerminalPrompt, render::StdoutSink);
    app.run().await
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
