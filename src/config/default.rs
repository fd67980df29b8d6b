//! Default configuration template and file creation.
//!
//! The template is commented TOML matching `Config::default()`; `config init`
//! writes it to the XDG config path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// Commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# drillview configuration
#
# All values shown below are the built-in defaults.
# Location: $XDG_CONFIG_HOME/drillview/config.toml

# ==============================================================================
# Viewer
# ==============================================================================

[viewer]

# Address of the trajectory server (host:port).
server = "127.0.0.1:8000"

# Connect as soon as the viewer opens. Press `c` to connect manually.
auto_connect = true

# Redraw interval as a human-readable duration.
# Examples: "50ms", "100ms", "1s"
tick_rate = "100ms"

# Pipe diameter in metres. Values below 0.05 are drawn at 0.05.
pipe_diameter = 0.3

# Pipe colour as a CSS colour string.
# Examples: "#00ff66", "#f80", "rgb(255, 128, 0)", "orange"
pipe_color = "#00ff66"

# Log file for the viewer. Empty disables viewer logging,
# because the terminal is used by the interface.
log_file = ""

# Viewer logging verbosity: "error", "warn", "info", "debug", "trace".
# The DRILLVIEW_LOG environment variable takes precedence.
log_level = "info"

# ==============================================================================
# Server
# ==============================================================================

[daemon]

# Address to listen on (host:port).
listen = "127.0.0.1:8000"

# Logging verbosity: "error", "warn", "info", "debug", "trace".
# The DRILLVIEW_LOG environment variable takes precedence.
log_level = "info"

# Path to log file. Empty string means stderr.
log_file = ""
"##;

/// Writes the template to `path`, or to the XDG config path when `None`.
///
/// An existing file is an error unless `force` is set, in which case it is
/// moved to `.toml.backup` first. Returns the path written.
pub fn create_default_config(path: Option<&Path>, force: bool) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(xdg::config_path, Path::to_path_buf);

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(&path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(&path)?;
    Ok(path)
}

/// Writes the template with 0600 permissions. The XDG directory is created
/// 0700; any other parent is created with default permissions.
fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    };

    match path.parent() {
        Some(dir) if dir == xdg::config_dir() => xdg::ensure_dir(dir).map_err(write_err)?,
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(write_err)?,
        _ => {}
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    Ok(())
}
