//! Configuration loading and discovery for `themekit.toml`
//!
//! Provides functions to find, load, and resolve configuration.

use super::schema::ThemeConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "themekit.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse themekit.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find themekit.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find themekit.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration and determine the project root.
///
/// With an explicit path the file must exist. Without one, the config is
/// discovered by walking up from the current directory, and the defaults are
/// used (rooted at the current directory) when nothing is found.
pub fn load_project(path: Option<&Path>) -> Result<(ThemeConfig, PathBuf), ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            let config = load_config_file(&p)?;
            let root = project_root(&p)
                .map(Path::to_path_buf)
                .filter(|r| !r.as_os_str().is_empty())
                .unwrap_or_else(|| env::current_dir().unwrap_or_default());
            let root = if root.is_absolute() { root } else { env::current_dir()?.join(root) };
            tracing::debug!(config = %p.display(), root = %root.display(), "loaded config");
            Ok((config, root))
        }
        None => {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            Ok((ThemeConfig::default(), env::current_dir()?))
        }
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<ThemeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ThemeConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
