//! Build context threaded through every task invocation.

use crate::config::ThemeConfig;
use crate::mode::Mode;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build context containing configuration, paths and the current mode.
///
/// The sequencer hands a `&mut BuildContext` to each task in turn, so a task
/// that changes the mode is observed by every task after it in the same run.
/// Watch invocations each get their own clone.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: Arc<ThemeConfig>,
    /// Project root directory (where themekit.toml is located)
    project_root: PathBuf,
    /// Development or production
    mode: Mode,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context in development mode.
    pub fn new(config: ThemeConfig, project_root: PathBuf) -> Self {
        Self { config: Arc::new(config), project_root, mode: Mode::default(), verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Current build mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Overwrite the build mode.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::debug!(from = %self.mode, to = %mode, "mode changed");
        }
        self.mode = mode;
    }

    /// Set the initial mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the distribution directory (resolved to absolute path).
    pub fn dist_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.dist)
    }

    /// Get the scratch directory (resolved to absolute path).
    pub fn tmp_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.tmp)
    }

    /// Output directory for mode-dependent artifacts.
    ///
    /// Production builds write to the distribution directory, development
    /// builds to the scratch directory.
    pub fn out_dir(&self) -> PathBuf {
        if self.mode.is_production() {
            self.dist_dir()
        } else {
            self.tmp_dir()
        }
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::loader::resolve_path(&self.project_root, path)
    }

    /// Path relative to the project root, for display.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.project_root).unwrap_or(path).display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BuildContext {
        BuildContext::new(ThemeConfig::default(), PathBuf::from("/project"))
    }

    #[test]
    fn test_build_context_new() {
        let ctx = context();
        assert_eq!(ctx.project_root(), Path::new("/project"));
        assert_eq!(ctx.mode(), Mode::Development);
        assert!(!ctx.is_verbose());
    }

    #[test]
    fn test_build_context_set_mode() {
        let mut ctx = context();
        ctx.set_mode(Mode::Production);
        assert_eq!(ctx.mode(), Mode::Production);
    }

    #[test]
    fn test_build_context_with_verbose() {
        let ctx = context().with_verbose(true);
        assert!(ctx.is_verbose());
    }

    #[test]
    fn test_build_context_dirs() {
        let ctx = context();
        assert_eq!(ctx.src_dir(), PathBuf::from("/project/src"));
        assert_eq!(ctx.dist_dir(), PathBuf::from("/project/dist"));
        assert_eq!(ctx.tmp_dir(), PathBuf::from("/project/.tmp"));
    }

    #[test]
    fn test_out_dir_follows_mode() {
        let mut ctx = context();
        assert_eq!(ctx.out_dir(), PathBuf::from("/project/.tmp"));
        ctx.set_mode(Mode::Production);
        assert_eq!(ctx.out_dir(), PathBuf::from("/project/dist"));
    }

    #[test]
    fn test_clones_do_not_share_mode() {
        let ctx = context();
        let mut other = ctx.clone();
        other.set_mode(Mode::Production);
        assert_eq!(ctx.mode(), Mode::Development);
    }

    #[test]
    fn test_build_context_resolve_path() {
        let ctx = context();
        assert_eq!(ctx.resolve_path(Path::new("/other/path")), PathBuf::from("/other/path"));
        assert_eq!(ctx.resolve_path(Path::new("src/css")), PathBuf::from("/project/src/css"));
    }

    #[test]
    fn test_display_path_strips_root() {
        let ctx = context();
        let path = PathBuf::from("/project/src/js/scripts.js");
        assert_eq!(ctx.display_path(&path).to_string(), "src/js/scripts.js");
    }
}
