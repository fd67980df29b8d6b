//! TOML configuration schema types for drillview.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so a partial file only overrides what it names.
//!
//! Duration fields use human-readable strings (e.g. `"100ms"`, `"1s"`)
//! parsed by the `humantime` crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::viewer::{PipeSettings, DEFAULT_PIPE_COLOR, DEFAULT_PIPE_DIAMETER};

/// Default address of the trajectory server.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8000";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
///
/// ```toml
/// [viewer]
/// [daemon]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Terminal viewer settings.
    pub viewer: ViewerConfig,
    /// Trajectory server settings.
    pub daemon: TomlDaemonConfig,
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// `host:port` of the trajectory server.
    pub server: String,
    /// Connect as soon as the viewer opens.
    pub auto_connect: bool,
    /// Redraw interval as a human-readable duration (e.g. `"100ms"`).
    pub tick_rate: String,
    /// Initial pipe diameter in metres.
    pub pipe_diameter: f64,
    /// Initial pipe colour as a CSS colour string.
    pub pipe_color: String,
    /// Log file for the viewer. Empty disables viewer logging, since the
    /// terminal is taken by the UI.
    pub log_file: String,
    /// Viewer logging verbosity, overridden by `DRILLVIEW_LOG`.
    pub log_level: LogLevel,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER_ADDR.to_string(),
            auto_connect: true,
            tick_rate: "100ms".to_string(),
            pipe_diameter: DEFAULT_PIPE_DIAMETER,
            pipe_color: DEFAULT_PIPE_COLOR.to_string(),
            log_file: String::new(),
            log_level: LogLevel::Info,
        }
    }
}

impl ViewerConfig {
    /// Parses `tick_rate` with humantime.
    pub fn tick_rate(&self) -> Result<Duration, ConfigError> {
        let rate = humantime::parse_duration(&self.tick_rate).map_err(|e| {
            ConfigError::InvalidValue {
                field: "viewer.tick_rate".to_string(),
                message: e.to_string(),
            }
        })?;
        if rate.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "viewer.tick_rate".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(rate)
    }

    /// Initial pipe settings for the viewer.
    pub fn pipe_settings(&self) -> PipeSettings {
        PipeSettings {
            diameter: self.pipe_diameter,
            color: self.pipe_color.clone(),
        }
    }

    /// Checks every field that TOML alone cannot validate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tick_rate()?;
        if !self.pipe_diameter.is_finite() || self.pipe_diameter <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "viewer.pipe_diameter".to_string(),
                message: format!("{} is not a positive number", self.pipe_diameter),
            });
        }
        crate::scene::Color::from_css_color_string(&self.pipe_color).map_err(|e| {
            ConfigError::InvalidValue {
                field: "viewer.pipe_color".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Server configuration from the TOML `[daemon]` section.
///
/// Named `TomlDaemonConfig` to avoid collision with the runtime
/// `crate::DaemonConfig` (listen address / daemonize flag).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlDaemonConfig {
    /// `host:port` to listen on.
    pub listen: String,
    /// Logging verbosity, overridden by `DRILLVIEW_LOG`.
    pub log_level: LogLevel,
    /// Path to log file. Empty string means stderr.
    pub log_file: String,
}

impl Default for TomlDaemonConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_SERVER_ADDR.to_string(),
            log_level: LogLevel::Info,
            log_file: String::new(),
        }
    }
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages (default).
    #[default]
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// Filter directive accepted by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_config_all_fields() {
        let toml_str = r##"
[viewer]
server = "10.0.0.5:9000"
auto_connect = false
tick_rate = "50ms"
pipe_diameter = 0.5
pipe_color = "#ff8800"
log_file = "/tmp/viewer.log"
log_level = "warn"

[daemon]
listen = "0.0.0.0:8000"
log_level = "debug"
log_file = "/var/log/drillview.log"
"##;
        let config: Config = toml::from_str(toml_str).expect("valid TOML should parse");
        assert_eq!(config.viewer.server, "10.0.0.5:9000");
        assert!(!config.viewer.auto_connect);
        assert_eq!(config.viewer.tick_rate, "50ms");
        assert_eq!(config.viewer.pipe_diameter, 0.5);
        assert_eq!(config.viewer.pipe_color, "#ff8800");
        assert_eq!(config.viewer.log_file, "/tmp/viewer.log");
        assert_eq!(config.viewer.log_level, LogLevel::Warn);
        assert_eq!(config.daemon.listen, "0.0.0.0:8000");
        assert_eq!(config.daemon.log_level, LogLevel::Debug);
        assert_eq!(config.daemon.log_file, "/var/log/drillview.log");
    }

    #[test]
    fn parse_empty_string_uses_all_defaults() {
        let config: Config = toml::from_str("").expect("empty string should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_unknown_fields_are_ignored() {
        let toml_str = r#"
unknown_key = "hello"

[viewer]
future_field = 42
"#;
        let config: Config = toml::from_str(toml_str).expect("unknown fields should be ignored");
        assert_eq!(config.viewer.server, DEFAULT_SERVER_ADDR);
    }

    #[test]
    fn defaults_match_viewer_constants() {
        let config = Config::default();
        assert_eq!(config.viewer.pipe_diameter, 0.3);
        assert_eq!(config.viewer.pipe_color, "#00ff66");
        assert_eq!(config.daemon.listen, "127.0.0.1:8000");
        assert_eq!(config.viewer.pipe_settings(), PipeSettings::default());
        assert_eq!(config.viewer.log_level, LogLevel::Info);
    }

    #[test]
    fn tick_rate_parses_humantime() {
        let viewer = ViewerConfig::default();
        assert_eq!(viewer.tick_rate().unwrap(), Duration::from_millis(100));

        let bad = ViewerConfig {
            tick_rate: "soon".to_string(),
            ..ViewerConfig::default()
        };
        assert!(matches!(
            bad.tick_rate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "viewer.tick_rate"
        ));

        let zero = ViewerConfig {
            tick_rate: "0ms".to_string(),
            ..ViewerConfig::default()
        };
        assert!(zero.tick_rate().is_err());
    }

    #[test]
    fn validate_rejects_bad_pipe_settings() {
        assert!(ViewerConfig::default().validate().is_ok());

        let bad_colour = ViewerConfig {
            pipe_color: "mauve-ish".to_string(),
            ..ViewerConfig::default()
        };
        assert!(bad_colour.validate().is_err());

        let bad_diameter = ViewerConfig {
            pipe_diameter: -1.0,
            ..ViewerConfig::default()
        };
        assert!(bad_diameter.validate().is_err());
    }

    #[test]
    fn log_level_all_variants() {
        for (input, expected) in [
            ("error", LogLevel::Error),
            ("warn", LogLevel::Warn),
            ("info", LogLevel::Info),
            ("debug", LogLevel::Debug),
            ("trace", LogLevel::Trace),
        ] {
            let toml_str = format!("log_level = \"{}\"", input);
            let daemon: TomlDaemonConfig =
                toml::from_str(&toml_str).expect("log level should parse");
            assert_eq!(daemon.log_level, expected);
            assert_eq!(expected.as_directive(), input);
        }
    }

    #[test]
    fn invalid_log_level_returns_error() {
        let result: Result<TomlDaemonConfig, _> = toml::from_str(r#"log_level = "verbose""#);
        assert!(result.is_err());
    }

    #[test]
    fn roundtrip_serialize_deserialize() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).expect("serialization should succeed");
        let parsed: Config = toml::from_str(&toml_str).expect("roundtrip should parse");
        assert_eq!(config, parsed);
    }
}
