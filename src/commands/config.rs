//! `config` subcommand and config resolution shared by the other commands.

use drillview::config::schema::Config;
use drillview::config::{default, loader::ConfigLoader, xdg};
use std::path::Path;
use std::process::ExitCode;

/// Loads the config from `--config` or the default location, printing the
/// error when it fails.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config, ExitCode> {
    ConfigLoader::load(path).map_err(|e| {
        eprintln!("Config error: {e}");
        ExitCode::FAILURE
    })
}

/// Writes the default template to `--config` or the XDG location.
pub(crate) fn run_config_init_command(path: Option<&Path>, force: bool) -> ExitCode {
    match default::create_default_config(path, force) {
        Ok(path) => {
            println!("Created configuration at {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn run_config_path_command(path: Option<&Path>) -> ExitCode {
    match path {
        Some(p) => println!("{}", p.display()),
        None => println!("{}", xdg::config_path().display()),
    }
    ExitCode::SUCCESS
}

/// Parses the file and checks values TOML cannot (durations, colours).
pub(crate) fn run_config_validate_command(path: Option<&Path>) -> ExitCode {
    let config = match load_config(path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = config.viewer.validate() {
        eprintln!("Config error: {e}");
        return ExitCode::FAILURE;
    }
    println!("Configuration is valid");
    println!("{config:#?}");
    ExitCode::SUCCESS
}
