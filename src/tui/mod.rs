//! Terminal viewer.
//!
//! Provides a terminal user interface built on ratatui and crossterm that
//! shows the live trajectory received from the server.

pub mod app;
pub mod event;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_utils;
