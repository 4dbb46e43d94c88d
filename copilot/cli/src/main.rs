//! Copilot CLI - Terminal Surface for the IT Helpdesk Copilot
//!
//! A line-oriented chat with the helpdesk backend. All session and conversation
//! state lives in `copilot-core`; this binary only reads lines and prints
//! messages.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (backend at http://localhost:8000)
//! copilot
//!
//! # Custom backend, non-interactive login
//! copilot --api-url https://helpdesk.example.com/api --email ada@example.com
//!
//! # With config file
//! copilot --config ~/.config/helpdesk-copilot/client.toml
//!
//! # Verbose logging (written to stderr)
//! RUST_LOG=debug copilot
//! ```

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use copilot_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use copilot_core::{Copilot, FileStore, HelpdeskBackend, HttpBackend};

/// Copilot - chat with the IT helpdesk from your terminal
#[derive(Parser, Debug)]
#[command(name = "copilot")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Backend base URL
    #[arg(short = 'u', long, value_name = "URL")]
    api_url: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "COPILOT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where the access token is kept between runs
    #[arg(long, value_name = "PATH")]
    token_path: Option<PathBuf>,

    /// Per-request timeout in milliseconds (0 waits indefinitely)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "COPILOT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Sign in with this email instead of prompting
    #[arg(short = 'e', long, value_name = "EMAIL")]
    email: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.api_url {
            overrides = overrides.with_api_url(url.clone());
        }
        if let Some(ms) = self.timeout_ms {
            overrides = overrides.with_request_timeout_ms(ms);
        }
        if let Some(path) = &self.token_path {
            overrides = overrides.with_token_path(path.clone());
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so they never interleave with the conversation on stdout.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("copilot_cli={level},copilot_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line options")?;

    info!(
        api_url = %config.api_url,
        source = %config.source(),
        token_path = %config.token_path.display(),
        "Configuration loaded"
    );

    let backend = Arc::new(HttpBackend::new(&config).context("Failed to create backend client")?);
    if !backend.health_check().await {
        warn!(api_url = %config.api_url, "Backend health check failed");
    }

    let store = FileStore::new(config.token_path.clone());
    let mut copilot = Copilot::new(backend, store, config);
    copilot
        .restore()
        .await
        .context("Failed to read stored session")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    repl::run(&mut copilot, &mut lines, args.email).await
}
