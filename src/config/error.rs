//! Errors from reading, parsing, checking and writing `config.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error. `line`/`column` are one-based, 0 when the
    /// parser gave no span.
    #[error("Invalid configuration at {path}:{line}:{column}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// `--config` named a file that is not there.
    #[error("{message}\nPath: {path}")]
    NotFound { path: PathBuf, message: String },

    /// `config init` without `--force` over an existing file.
    #[error("Configuration file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Failed to write configuration file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsed fine, but the value is unusable (bad duration, colour,
    /// non-positive pipe diameter). `field` is dotted, e.g. `viewer.tick_rate`.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
