//! Rowbatch - batching insert proxy
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! rowbatch
//! rowbatch --config configs/config.toml
//! rowbatch serve --config configs/config.toml --log-level debug
//! ```

mod cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rowbatch_config::{Config, LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Rowbatch - collects rows per table and inserts them in batches
#[derive(Parser, Debug)]
#[command(name = "rowbatch")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut args = match cli.command {
        Some(Command::Serve(args)) => args,
        // No subcommand = run server
        None => cmd::serve::ServeArgs { config: None },
    };
    args.config = cli.config;

    let (level, format) = resolve_log_settings(cli.log_level.as_deref(), args.config.as_deref());
    init_logging(&level, format)?;
    cmd::serve::run(args).await
}

/// Resolve log filter and format: CLI flag > config file > default "info"
fn resolve_log_settings(
    cli_level: Option<&str>,
    config_path: Option<&Path>,
) -> (String, LogFormat) {
    let config_path = config_path.unwrap_or(Path::new(cmd::serve::DEFAULT_CONFIG_PATH));
    let log = if config_path.exists()
        && let Ok(config) = Config::from_file(config_path)
    {
        config.log
    } else {
        LogConfig::default()
    };

    (log.directive(cli_level), log.format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let layer = match format {
        LogFormat::Console => fmt::layer().with_target(true).with_thread_ids(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
