//! Error types for tasks and the registry.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::build::DiscoveryError;
use crate::watch::WatchError;

/// Registry misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A task with this name is already registered
    #[error("task '{0}' is already registered")]
    DuplicateName(String),
    /// No task with this name is registered
    #[error("task '{0}' is not registered")]
    NotFound(String),
}

/// A file transform reported a failure.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Stylesheet could not be parsed or printed
    #[error("{}:{}:{}: {}", .file.display(), .line, .column, .message)]
    Style { file: PathBuf, line: u32, column: u32, message: String },
    /// Script lint found problems
    #[error("{problems} lint problem(s) in {files} file(s)")]
    Lint { files: usize, problems: usize },
    /// A listed source file does not exist
    #[error("source not found: {}", .0.display())]
    MissingSource(PathBuf),
    /// A glob pattern could not be resolved
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Any other transform failure
    #[error("{0}")]
    Other(String),
}

/// Error returned by a task body.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Registry or composition problem
    #[error(transparent)]
    Configuration(#[from] RegistryError),
    /// A transform failed
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// Filesystem operation failed
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Watch mode could not start
    #[error(transparent)]
    Watch(#[from] WatchError),
    /// An explicit-completion body dropped its handle without resolving it
    #[error("task '{0}' dropped its completion handle without resolving it")]
    Abandoned(String),
}

impl TaskError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        TaskError::Io { path: path.as_ref().to_path_buf(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        assert_eq!(
            RegistryError::DuplicateName("copy".to_string()).to_string(),
            "task 'copy' is already registered"
        );
        assert_eq!(
            RegistryError::NotFound("deploy".to_string()).to_string(),
            "task 'deploy' is not registered"
        );
    }

    #[test]
    fn test_style_error_display() {
        let err = TransformError::Style {
            file: PathBuf::from("src/css/style.css"),
            line: 12,
            column: 4,
            message: "Unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "src/css/style.css:12:4: Unexpected token");
    }

    #[test]
    fn test_io_error_display() {
        let err = TaskError::io(
            "dist/css",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "dist/css: denied");
    }

    #[test]
    fn test_transform_wraps_transparently() {
        let err: TaskError = TransformError::MissingSource(PathBuf::from("a.js")).into();
        assert_eq!(err.to_string(), "source not found: a.js");
    }
}
