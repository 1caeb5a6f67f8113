//! Static asset copy into the distribution directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::build::{discover_all, BuildContext};
use crate::task::{Completion, TaskError, TaskLog, TransformError};

/// Copy every file matching the configured patterns into the distribution
/// directory, preserving paths relative to the copy base.
///
/// The copy runs on a worker thread and resolves `done` when finished.
pub fn copy(ctx: &mut BuildContext, log: &TaskLog<'_>, done: Completion) {
    let root = ctx.project_root().to_path_buf();
    let base = ctx.resolve_path(&ctx.config().copy.base);
    let dist = ctx.dist_dir();
    let patterns = ctx.config().copy.patterns.clone();
    let reporter = log.reporter().clone();
    let task = log.task().to_string();

    thread::spawn(move || {
        let result = copy_matches(&root, &base, &dist, &patterns);
        if let Ok(count) = &result {
            let log = TaskLog::new(&task, &reporter);
            if *count == 0 {
                log.warn("no files matched the copy patterns");
            } else {
                log.info(format!("copied {} files", count));
            }
        }
        done.complete(result.map(|_| ()));
    });
}

/// Copy the matched files and return how many were copied.
pub fn copy_matches(
    root: &Path,
    base: &Path,
    dist: &Path,
    patterns: &[String],
) -> Result<usize, TaskError> {
    let files = discover_all(root, patterns).map_err(TransformError::from)?;

    for file in &files {
        let dest = destination(file, base, dist)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::copy(file, &dest).map_err(|e| TaskError::io(file, e))?;
        tracing::trace!(from = %file.display(), to = %dest.display(), "copied");
    }

    Ok(files.len())
}

fn destination(file: &Path, base: &Path, dist: &Path) -> Result<PathBuf, TaskError> {
    let relative = file.strip_prefix(base).map_err(|_| {
        TransformError::Other(format!(
            "{} is outside the copy base {}",
            file.display(),
            base.display()
        ))
    })?;
    Ok(dist.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::{NullProgress, ProgressReporter};
    use crate::config::ThemeConfig;
    use crate::task::Task;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative).unwrap();
    }

    #[test]
    fn test_copy_preserves_structure_relative_to_base() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "src/index.php");
        touch(root, "src/screenshot.png");
        touch(root, "src/style.css");
        touch(root, "src/readme.md");
        touch(root, "src/modules/header.php");
        touch(root, "src/img/icons/logo.svg");
        touch(root, "src/img/photo.jpg");
        touch(root, "src/fonts/body.woff2");
        touch(root, "src/languages/de_DE.po");
        touch(root, "src/js/scripts.js");

        let mut ctx = BuildContext::new(ThemeConfig::default(), root.to_path_buf());
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        Task::deferred("copy", copy).invoke(&mut ctx, &reporter).unwrap();

        let dist = root.join("dist");
        for expected in [
            "index.php",
            "screenshot.png",
            "style.css",
            "modules/header.php",
            "img/icons/logo.svg",
            "img/photo.jpg",
            "fonts/body.woff2",
            "languages/de_DE.po",
        ] {
            assert!(dist.join(expected).is_file(), "missing {}", expected);
        }
        assert!(!dist.join("readme.md").exists());
        assert!(!dist.join("js").exists());
        assert_eq!(fs::read_to_string(dist.join("img/photo.jpg")).unwrap(), "src/img/photo.jpg");
    }

    #[test]
    fn test_copy_with_nothing_matched() {
        let temp = TempDir::new().unwrap();
        let count = copy_matches(
            temp.path(),
            &temp.path().join("src"),
            &temp.path().join("dist"),
            &["src/*.php".to_string()],
        )
        .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_copy_rejects_files_outside_base() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "vendor/lib.php");
        let err = copy_matches(
            temp.path(),
            &temp.path().join("src"),
            &temp.path().join("dist"),
            &["vendor/*.php".to_string()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside the copy base"));
    }
}
