//! Command implementations for the drillview CLI.
//!
//! - `daemon` - Run the trajectory server
//! - `ipc` - One-shot server commands (update, get, status)
//! - `view` - Open the terminal viewer
//! - `config` - Manage the configuration file

pub(crate) mod config;
pub(crate) mod daemon;
pub(crate) mod ipc;
pub(crate) mod view;

pub(crate) use config::*;
pub(crate) use daemon::*;
pub(crate) use ipc::*;
pub(crate) use view::*;
