//! Citadel Monitor: a lightweight host-metrics sampler.
//!
//! Periodically measures per-core CPU utilization and system memory usage from procfs and
//! writes plain-text snapshots to the console and/or append-only log files.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use config::Config;
use output::OutputRouter;
use procfs::ProcfsReader;
use scheduler::Scheduler;
use snapshot::SnapshotEngine;

pub mod config;
pub mod error;
pub mod fsutil;
pub mod output;
pub mod procfs;
pub mod sampler;
pub mod scheduler;
pub mod snapshot;

/// Environment variable overriding where the proc filesystem is mounted.
pub const PROC_MOUNT_PATH_ENV: &str = "PROC_MOUNT_PATH";

/// Runs the sampler with the configuration file at `config_path`.
///
/// Loads the configuration, opens every output, then samples on the configured period until
/// Ctrl-C or SIGTERM is received.
///
/// # Errors
///
/// Possible errors include:
/// - The configuration file cannot be opened or is invalid.
/// - A log output cannot be opened for appending.
pub async fn run(config_path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_path(config_path.as_ref())?;
    log::debug!(
        "Loaded {} metrics and {} outputs from {}, period {:?}",
        config.metrics().len(),
        config.outputs().len(),
        config_path.as_ref().display(),
        config.period()
    );

    let proc_root = std::env::var_os(PROC_MOUNT_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/proc"));
    log::debug!("Reading counters from {}", proc_root.display());

    let router = OutputRouter::open(config.outputs())?;
    let engine = SnapshotEngine::new(ProcfsReader::new(proc_root));
    Scheduler::new(&config, engine, router)
        .run_until(shutdown_signal())
        .await;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM. Never resolves if neither handler can be installed.
///
/// The SIGTERM handler is installed when this is called, not when the future is first polled,
/// so a signal arriving before the scheduler starts is not lost.
fn shutdown_signal() -> impl Future<Output = ()> {
    use crate::error::ResultOkLogExt;
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm = signal(SignalKind::terminate()).ok_log("failed to install SIGTERM handler");

    async move {
        let ctrl_c = async {
            if tokio::signal::ctrl_c()
                .await
                .ok_log("failed to listen for Ctrl-C")
                .is_none()
            {
                std::future::pending::<()>().await;
            }
        };
        let terminate = async {
            match sigterm {
                Some(mut sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ctrl_c => log::info!("received Ctrl-C, shutting down"),
            _ = terminate => log::info!("received SIGTERM, shutting down"),
        }
    }
}

/// Extracts the configuration path from the process arguments (program name first).
///
/// Returns `None` if no path was given.
pub fn config_path_from_args(args: impl IntoIterator<Item = OsString>) -> Option<PathBuf> {
    args.into_iter().nth(1).map(PathBuf::from)
}

/// Name the process was invoked as, for usage messages. Never fails on non-UTF-8 names.
pub fn program_name(args: impl IntoIterator<Item = OsString>) -> String {
    args.into_iter()
        .next()
        .map(|arg0| arg0.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}
