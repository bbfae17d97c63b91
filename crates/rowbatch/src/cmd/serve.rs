//! Serve command - Run the rowbatch server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use rowbatch_config::{Config, HolderConfig, ReceiverConfig};
use rowbatch_manager::{Holder, ManagerContext};
use rowbatch_receiver::{HttpReceiver, ReceiverError};
use rowbatch_sinks::{InsertErrorLogger, Sink, SinkRegistry};
use rowbatch_table::TablePool;

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file, set from the global `--config`
    #[arg(skip)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "rowbatch starting"
    );

    let config = load_config(&config_path)?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("rowbatch shutdown complete");
    Ok(())
}

/// Load and validate the configuration file
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(anyhow::anyhow!("config file not found: {}", path.display()));
    }
    Config::from_file(path).context("failed to load configuration")
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let sinks = SinkRegistry::with_defaults()
        .create_all(&config.sinks)
        .await
        .context("failed to create sinks")?;
    let sink_count = sinks.len();

    let holder = Arc::new(build_holder(&config, sinks)?);

    // Create cancellation token for coordinated shutdown
    let cancel = CancellationToken::new();
    let eviction_task = holder.spawn_eviction(cancel.clone());

    let (fatal_tx, mut fatal_rx) = mpsc::channel(config.receivers.len().max(1));
    let receiver_tasks = start_receivers(&config, &holder, &cancel, fatal_tx);

    info!(
        sinks = sink_count,
        receivers = receiver_tasks.len(),
        idle_timeout = ?config.holder.idle_timeout,
        "rowbatch running"
    );

    // A receiver that can't serve takes the whole process down
    let fatal = tokio::select! {
        () = wait_for_shutdown() => {
            info!("shutdown signal received, stopping server...");
            None
        }
        Some((name, e)) = fatal_rx.recv() => {
            error!(receiver = %name, error = %e, "receiver failed, stopping server...");
            Some(anyhow::Error::new(e).context(format!("receiver {name} failed")))
        }
    };

    cancel.cancel();

    info!("waiting for receivers to shut down...");
    for task in receiver_tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "receiver task panicked during shutdown");
        }
    }
    while let Ok((name, e)) = fatal_rx.try_recv() {
        warn!(receiver = %name, error = %e, "receiver shutdown error");
    }

    if let Err(e) = eviction_task.await {
        warn!(error = %e, "eviction task panicked");
    }

    info!(tables = holder.len(), "stopping table managers...");
    let errors = holder.stop_all().await;
    for e in &errors {
        error!(error = %e, "table manager stop failed");
    }

    let metrics = holder.snapshot();
    info!(
        flushes = metrics.flushes,
        rows_flushed = metrics.rows_flushed,
        flush_failures = metrics.flush_failures,
        stop_errors = errors.len(),
        "table managers stopped"
    );

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Wire the sinks, buffer pool and error log into a holder
fn build_holder(config: &Config, sinks: Vec<Arc<dyn Sink>>) -> Result<Holder> {
    let error_logger = InsertErrorLogger::from_config(&config.error_log)
        .context("failed to open insert error log")?;
    if let Some(ref path) = config.error_log.path {
        info!(path = %path.display(), "insert error log enabled");
    }

    let context = ManagerContext::new(sinks)
        .with_pool(Arc::new(table_pool(&config.holder)))
        .with_error_logger(Arc::new(error_logger));

    Ok(Holder::new(context, &config.holder))
}

fn table_pool(config: &HolderConfig) -> TablePool {
    TablePool::new(config.pool_size, config.pool_buffer_capacity, config.pool_max_buffer_len)
}

/// Start every configured receiver
///
/// Receivers that stop with an error report it on `fatal_tx`.
fn start_receivers(
    config: &Config,
    holder: &Arc<Holder>,
    cancel: &CancellationToken,
    fatal_tx: mpsc::Sender<(String, ReceiverError)>,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::with_capacity(config.receivers.len());

    for (name, receiver_config) in config.receivers.iter() {
        match receiver_config {
            ReceiverConfig::Http(http_config) => {
                info!(
                    receiver = %name,
                    address = %http_config.bind,
                    "starting HTTP receiver"
                );

                let receiver =
                    HttpReceiver::new(name.clone(), http_config.clone(), Arc::clone(holder));
                let cancel_token = cancel.clone();
                let fatal_tx = fatal_tx.clone();
                let name = name.clone();
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = receiver.run(cancel_token).await {
                        error!(receiver = %name, error = %e, "HTTP receiver error");
                        let _ = fatal_tx.send((name, e)).await;
                    }
                }));
            }
        }
    }

    tasks
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod serve_test;
