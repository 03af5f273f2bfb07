//! Commands behind the `quire` binary. Each writes its report to the given
//! writer so it can run against a buffer.

pub mod commands;
pub mod config;

pub use config::{Config, DEFAULT_CONFIG_NAME};
