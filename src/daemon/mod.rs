//! Trajectory server process: lifecycle, daemonization and the main entry
//! point.

mod handlers;
pub mod logging;
pub mod server;
pub mod store;

pub use server::TrajectoryServer;
pub use store::{DrillSnapshot, DrillStore};

use crate::DaemonConfig;
use fork::{daemon, Fork};
use std::error::Error;
use tokio::runtime::Runtime;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Result type alias for server operations.
pub type DaemonResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If SIGTERM handler registration fails, falls back to SIGINT only.
async fn wait_for_shutdown() {
    match unix_signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("received SIGINT (Ctrl+C), shutting down");
                },
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                },
            }
        }
        Err(e) => {
            warn!(error = %e, "could not register SIGTERM handler, using SIGINT only");
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "failed waiting for SIGINT");
            } else {
                info!("received SIGINT (Ctrl+C), shutting down");
            }
        }
    }
}

/// Forks and detaches from the terminal. The parent exits with code 0.
///
/// Must be called BEFORE the Tokio runtime starts: forking a running runtime
/// corrupts its signal handling state.
///
/// * `nochdir` - If false, changes the working directory to `/`.
/// * `noclose` - If false, redirects stdin/stdout/stderr to /dev/null.
pub fn daemonize_process(nochdir: bool, noclose: bool) -> DaemonResult<()> {
    match daemon(nochdir, noclose) {
        Ok(Fork::Child) => Ok(()),
        Ok(Fork::Parent(_)) => std::process::exit(0),
        Err(e) => Err(Box::new(std::io::Error::other(format!(
            "Failed to daemonize: {}",
            e
        )))),
    }
}

/// Runs the trajectory server until SIGINT or SIGTERM.
///
/// Daemonizes first when requested, then initializes logging, then builds the
/// runtime, binds the listener and serves clients.
///
/// # Example
///
/// ```no_run
/// use drillview::{daemon::run_daemon, DaemonConfig};
///
/// let config = DaemonConfig::new("127.0.0.1:8000".to_string(), false);
/// run_daemon(config).expect("Failed to run server");
/// ```
pub fn run_daemon(config: DaemonConfig) -> DaemonResult<()> {
    if config.daemonize {
        // A daemon with no log file would log into /dev/null; keep cwd so a
        // relative log path still resolves.
        daemonize_process(true, false)?;
    }

    // After daemonize, since stderr may be redirected.
    logging::init(config.log_level, config.log_file.as_deref())?;

    info!(
        listen = %config.listen,
        daemonize = config.daemonize,
        "drillview server starting"
    );

    let runtime = Runtime::new().map_err(|e| {
        Box::new(std::io::Error::other(format!(
            "Failed to create Tokio runtime: {}",
            e
        ))) as Box<dyn Error + Send + Sync>
    })?;

    runtime.block_on(async {
        let mut server = TrajectoryServer::new(config.listen.clone());
        server.start().await?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(async move {
            wait_for_shutdown().await;
            let _ = shutdown_tx.send(());
        });

        info!("server running, press Ctrl+C or send SIGTERM to stop");
        server.run_with_shutdown(shutdown_rx).await
    })?;

    info!("server stopped");
    Ok(())
}
