//! `config.toml`: schema, loading, the `config init` template and its
//! location.

pub mod default;
pub mod error;
pub mod loader;
pub mod schema;
pub mod xdg;
