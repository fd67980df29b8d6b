//! CLI argument parsing tests.

use crate::{Cli, Commands, ConfigAction};
use clap::{CommandFactory, Parser};
use drillview::geo::Position;
use std::path::PathBuf;

#[test]
fn verify_cli() {
    Cli::command().debug_assert();
}

#[test]
fn test_daemon_defaults() {
    let cli = Cli::try_parse_from(["drillview", "daemon"]).unwrap();
    match cli.command {
        Commands::Daemon {
            daemonize,
            listen,
            log_file,
        } => {
            assert!(!daemonize);
            assert!(listen.is_none());
            assert!(log_file.is_none());
        }
        _ => panic!("unexpected command variant"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn test_daemon_flags() {
    let cli = Cli::try_parse_from([
        "drillview",
        "daemon",
        "--daemonize",
        "--listen",
        "0.0.0.0:9000",
        "--log-file",
        "/tmp/drillview.log",
    ])
    .unwrap();
    match cli.command {
        Commands::Daemon {
            daemonize,
            listen,
            log_file,
        } => {
            assert!(daemonize);
            assert_eq!(listen.as_deref(), Some("0.0.0.0:9000"));
            assert_eq!(log_file, Some(PathBuf::from("/tmp/drillview.log")));
        }
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_global_config_flag_after_subcommand() {
    let cli =
        Cli::try_parse_from(["drillview", "get", "--config", "/etc/drillview.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/etc/drillview.toml")));
}

#[test]
fn test_view_flags() {
    let cli = Cli::try_parse_from([
        "drillview",
        "view",
        "--server",
        "10.0.0.5:8000",
        "--no-connect",
    ])
    .unwrap();
    match cli.command {
        Commands::View { server, no_connect } => {
            assert_eq!(server.as_deref(), Some("10.0.0.5:8000"));
            assert!(no_connect);
        }
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_update_parses_bit_and_negative_md() {
    let cli = Cli::try_parse_from([
        "drillview",
        "update",
        "--bit",
        "50.1,25.2,-120",
        "--md",
        "-0.5",
        "--path",
        "[[50,25],[50.1,25.2,-120]]",
    ])
    .unwrap();
    match cli.command {
        Commands::Update { bit, md, path, .. } => {
            assert_eq!(bit, Some(Position::new(50.1, 25.2, -120.0)));
            assert_eq!(md, Some(-0.5));
            assert!(path.unwrap().starts_with("[[50,25]"));
        }
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_update_rejects_bad_bit() {
    assert!(Cli::try_parse_from(["drillview", "update", "--bit", "500,0"]).is_err());
    assert!(Cli::try_parse_from(["drillview", "update", "--bit", "50"]).is_err());
}

#[test]
fn test_update_path_conflicts_with_path_file() {
    let result = Cli::try_parse_from([
        "drillview",
        "update",
        "--path",
        "[]",
        "--path-file",
        "path.json",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_config_subcommands() {
    let cli = Cli::try_parse_from(["drillview", "config", "init", "--force"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Init { force: true }
        }
    ));
    let cli = Cli::try_parse_from(["drillview", "config", "validate"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Validate
        }
    ));
}

#[test]
fn test_missing_subcommand_fails() {
    assert!(Cli::try_parse_from(["drillview"]).is_err());
}
