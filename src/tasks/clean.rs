//! Output directory removal.

use std::fs;
use std::io::ErrorKind;

use crate::build::BuildContext;
use crate::task::{TaskError, TaskLog, TransformError};

/// Remove every configured clean target.
///
/// Targets that do not exist are skipped, so running twice is harmless.
/// Targets that resolve to the project root or one of its ancestors are
/// refused.
pub fn clean(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let root = ctx.project_root().canonicalize().unwrap_or_else(|_| ctx.project_root().to_path_buf());
    let mut removed = 0usize;

    for target in &ctx.config().clean.targets {
        let path = ctx.resolve_path(target);
        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        if root.starts_with(&resolved) {
            return Err(TransformError::Other(format!(
                "refusing to clean '{}': it contains the project root",
                target.display()
            ))
            .into());
        }

        let result = if path.is_dir() { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
        match result {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %path.display(), "removed");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "already absent");
            }
            Err(e) => return Err(TaskError::io(&path, e)),
        }
    }

    if log.is_verbose() {
        log.info(format!("removed {} of {} targets", removed, ctx.config().clean.targets.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::{NullProgress, ProgressReporter};
    use crate::config::ThemeConfig;
    use crate::task::Task;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn run(ctx: &mut BuildContext) -> Result<(), TaskError> {
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        Task::new("clean", clean).invoke(ctx, &reporter)
    }

    #[test]
    fn test_clean_removes_targets_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".tmp/css")).unwrap();
        fs::create_dir_all(temp.path().join("dist/js")).unwrap();
        fs::write(temp.path().join("dist/js/app.js"), "x").unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let mut ctx = BuildContext::new(ThemeConfig::default(), temp.path().to_path_buf());
        run(&mut ctx).unwrap();
        assert!(!temp.path().join(".tmp").exists());
        assert!(!temp.path().join("dist").exists());
        assert!(temp.path().join("src").exists());

        run(&mut ctx).unwrap();
    }

    #[test]
    fn test_clean_refuses_project_root() {
        let temp = TempDir::new().unwrap();
        let mut config = ThemeConfig::default();
        config.clean.targets = vec![PathBuf::from(".")];
        let mut ctx = BuildContext::new(config, temp.path().to_path_buf());

        let err = run(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("refusing to clean"));
        assert!(temp.path().exists());
    }

    #[test]
    fn test_clean_removes_plain_file_target() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bundle.zip"), "zip").unwrap();
        let mut config = ThemeConfig::default();
        config.clean.targets = vec![PathBuf::from("bundle.zip")];
        let mut ctx = BuildContext::new(config, temp.path().to_path_buf());

        run(&mut ctx).unwrap();
        assert!(!temp.path().join("bundle.zip").exists());
    }
}
