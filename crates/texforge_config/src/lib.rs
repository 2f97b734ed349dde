//! Parsing and validation of `texforge.toml` workspace configuration files.
//!
//! This crate reads the optional workspace configuration file and produces a
//! strongly-typed [`WorkspaceConfig`] controlling root resolution, directive
//! scanning, incremental-build policy, and the external compiler command.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use types::*;
