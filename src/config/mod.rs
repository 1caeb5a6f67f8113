//! Configuration module for the themekit pipeline
//!
//! Provides types and parsing for `themekit.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{find_config, find_config_from, load_config_file, load_project, ConfigError};
pub use schema::*;
