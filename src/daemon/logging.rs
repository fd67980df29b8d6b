//! Logging initialization.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `DRILLVIEW_LOG` environment variable. Falls back to the configured level
//! when the variable is unset or invalid.
//!
//! # Usage
//!
//! ```bash
//! # Default (configured level, info unless changed)
//! drillview daemon
//!
//! # Debug level
//! DRILLVIEW_LOG=debug drillview daemon
//!
//! # Module-specific filtering
//! DRILLVIEW_LOG=drillview::daemon=trace,warn drillview daemon
//! ```

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "DRILLVIEW_LOG";

fn filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_directive()))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the server's tracing subscriber.
///
/// Writes to `log_file` when given, otherwise to stderr.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (should only be
/// called once, at startup).
pub fn init(default_level: LogLevel, log_file: Option<&Path>) -> std::io::Result<()> {
    let builder = fmt().with_env_filter(filter(default_level)).with_target(false);
    match log_file {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Initialize logging for the terminal viewer.
///
/// The terminal belongs to the UI, so logs only go to a file. Without one, no
/// subscriber is installed.
pub fn init_viewer(default_level: LogLevel, log_file: Option<&Path>) -> std::io::Result<()> {
    match log_file {
        Some(path) => init(default_level, Some(path)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_parses_valid_directives() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert!(EnvFilter::try_new(level.as_directive()).is_ok());
        }
    }

    #[test]
    fn env_filter_parses_module_directive() {
        assert!(EnvFilter::try_new("drillview::daemon=trace,warn").is_ok());
    }

    #[test]
    fn open_log_file_creates_parents() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("logs/nested/drillview.log");
        open_log_file(&path).expect("should create log file");
        assert!(path.exists());
    }

    #[test]
    fn init_viewer_without_file_is_noop() {
        assert!(init_viewer(LogLevel::Info, None).is_ok());
    }
}
