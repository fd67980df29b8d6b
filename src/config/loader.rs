//! Reads `config.toml` for the `daemon`, `view` and `config` commands.
//!
//! An explicit `--config` path must exist. The XDG file is optional: without
//! it every command runs on `Config::default()`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::schema::Config;
use crate::config::xdg;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` when given, otherwise the XDG file if there is one.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = path {
            return Self::load_file(path);
        }
        let path = xdg::config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Self::load_file(&path)
    }

    /// Reads and parses one file. A missing file is `NotFound`.
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
                message: "Configuration file not found".to_string(),
            },
            _ => ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e
                .span()
                .map_or((0, 0), |span| line_column(content, span.start));
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line,
                column,
                message: e.message().to_string(),
            }
        })
    }
}

/// One-based line and column of byte `offset` in `content`.
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (before.matches('\n').count() + 1, before.len() - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use serial_test::serial;

    #[test]
    fn line_column_is_one_based() {
        let text = "[viewer]\nserver = 1\n";
        assert_eq!(line_column(text, 0), (1, 1));
        assert_eq!(line_column(text, 9), (2, 1));
        assert_eq!(line_column(text, 18), (2, 10));
        assert_eq!(line_column(text, 999), (3, 1));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ConfigLoader::parse("[viewer]\npipe_color = \"orange\"\n", Path::new("p.toml"))
            .expect("partial config should parse");
        assert_eq!(config.viewer.pipe_color, "orange");
        assert_eq!(config.viewer.pipe_diameter, 0.3);
        assert_eq!(config.daemon.listen, "127.0.0.1:8000");
    }

    #[test]
    fn syntax_error_points_at_the_value() {
        let err = ConfigLoader::parse("[viewer]\nserver = \n", Path::new("bad.toml"))
            .expect_err("should fail");
        match err {
            ConfigError::ParseError { path, line, column, message } => {
                assert_eq!(path, Path::new("bad.toml"));
                assert_eq!(line, 2);
                assert!(column > 1);
                assert!(!message.is_empty());
            }
            other => panic!("expected ParseError, got: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_reports_its_line() {
        let err = ConfigLoader::parse("[viewer]\npipe_diameter = \"wide\"\n", Path::new("t.toml"))
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::ParseError { line: 2, .. }));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("rig.toml");
        fs::write(&file, "[daemon]\nlisten = \"0.0.0.0:9100\"\n").expect("write");
        let config = ConfigLoader::load(Some(&file)).expect("should load");
        assert_eq!(config.daemon.listen, "0.0.0.0:9100");
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.toml");
        let err = ConfigLoader::load(Some(&missing)).expect_err("should fail");
        assert!(matches!(err, ConfigError::NotFound { path, .. } if path == missing));
    }

    #[test]
    fn directory_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ConfigLoader::load_file(dir.path()).expect_err("should fail");
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    #[serial]
    fn xdg_file_is_optional_and_used_when_present() {
        let dir = tempfile::tempdir().expect("temp dir");
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let without = ConfigLoader::load(None);
        fs::create_dir_all(dir.path().join("drillview")).expect("mkdir");
        fs::write(
            dir.path().join("drillview/config.toml"),
            "[daemon]\nlog_level = \"warn\"\n",
        )
        .expect("write");
        let with = ConfigLoader::load(None);

        match original {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        assert_eq!(without.expect("defaults"), Config::default());
        assert_eq!(with.expect("xdg file").daemon.log_level, LogLevel::Warn);
    }
}
