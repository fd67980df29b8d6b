//! drillview library
//!
//! Live drilling trajectory viewer. A trajectory server holds the current
//! drill state (bit position, recorded path, measured depth) and pushes it to
//! subscribed viewers over TCP; the viewer keeps a small 3D scene (a bit point
//! and a tube-shaped pipe along the path) and shows it in a terminal UI.
//!
//! # Platform Support
//!
//! Unix-like systems only (Linux, macOS): the server uses `fork()` for
//! `--daemonize` and Unix signals (SIGTERM, SIGINT) for shutdown.

pub mod client;
pub mod config;
pub mod daemon;
pub mod geo;
pub mod health;
pub mod ipc;
pub mod scene;
pub mod tui;
pub mod viewer;

pub use config::schema::LogLevel;
pub use health::{format_uptime, get_memory_usage_mb, HealthStatus};
pub use ipc::{
    DrillState, DrillStateMessage, IpcCommand, IpcCommandKind, IpcResponse, ProtocolError,
    DRILL_STATE_TYPE, IPC_VERSION,
};

use std::path::PathBuf;

/// Configuration for the trajectory server process.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Address to listen on, `host:port`.
    pub listen: String,
    /// Whether to run as a background daemon (detached from terminal).
    pub daemonize: bool,
    /// Default log level when `DRILLVIEW_LOG` is unset.
    pub log_level: LogLevel,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl DaemonConfig {
    /// Creates a new DaemonConfig with the given address and daemonize flag.
    pub fn new(listen: String, daemonize: bool) -> Self {
        Self {
            listen,
            daemonize,
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new(config::schema::DEFAULT_SERVER_ADDR.to_string(), false)
    }
}
