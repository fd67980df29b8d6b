//! Client side of the trajectory protocol.
//!
//! `connection` handles one-shot request/response exchanges (used by the CLI)
//! and `subscription` runs the long-lived SUB stream that feeds the viewer.

pub mod connection;
pub mod subscription;

pub use connection::{send_command, Client, ClientError};
pub use subscription::{run_subscription, spawn_subscription, ViewerEvent};

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
