//! Built-in theme tasks.
//!
//! Every task reads its inputs from the [`BuildContext`] configuration and
//! resolves paths against the project root. [`builtin_registry`] registers
//! them all under their [`TaskId`] names.

pub mod clean;
pub mod copy;
pub mod lint;
pub mod modernizr;
pub mod styles;
pub mod template;
pub mod uglify;
pub mod vendor;

use crate::build::{discover_files, BuildContext};
use crate::mode::Mode;
use crate::task::{RegistryError, Task, TaskError, TaskId, TaskLog, TaskRegistry, TransformError};

/// Switch the run to production mode.
pub fn env_production(ctx: &mut BuildContext, _log: &TaskLog<'_>) -> Result<(), TaskError> {
    ctx.set_mode(Mode::Production);
    Ok(())
}

/// Summarise the distribution directory.
pub fn report(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let dist = ctx.dist_dir();
    let files = discover_files(&dist, "**/*").map_err(TransformError::from)?;
    let bytes: u64 = files.iter().filter_map(|f| f.metadata().ok()).map(|m| m.len()).sum();
    log.info(format!(
        "{} files, {:.1} KiB in {}",
        files.len(),
        bytes as f64 / 1024.0,
        ctx.display_path(&dist)
    ));
    Ok(())
}

/// The task for a built-in identifier.
pub fn builtin_task(id: TaskId) -> Task {
    let name = id.as_str();
    match id {
        TaskId::Clean => Task::new(name, clean::clean),
        TaskId::Copy => Task::deferred(name, copy::copy),
        TaskId::Sass => Task::new(name, styles::sass),
        TaskId::Autoprefixer => Task::new(name, styles::autoprefixer),
        TaskId::Jshint => Task::new(name, lint::jshint),
        TaskId::Template => Task::new(name, template::template),
        TaskId::Modernizr => Task::new(name, modernizr::modernizr),
        TaskId::Uglify => Task::new(name, uglify::uglify),
        TaskId::Jquery => Task::new(name, vendor::jquery),
        TaskId::Normalize => Task::new(name, vendor::normalize),
        TaskId::EnvProduction => Task::new(name, env_production),
        TaskId::Report => Task::new(name, report),
    }
}

/// Register every built-in task.
pub fn register_builtin(registry: &mut TaskRegistry) -> Result<(), RegistryError> {
    for id in TaskId::ALL {
        registry.register(builtin_task(id))?;
    }
    Ok(())
}

/// A registry holding every built-in task.
pub fn builtin_registry() -> Result<TaskRegistry, RegistryError> {
    let mut registry = TaskRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::{NullProgress, ProgressReporter};
    use crate::config::ThemeConfig;
    use std::sync::Arc;

    #[test]
    fn test_builtin_registry_has_every_id() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.len(), TaskId::ALL.len());
        for id in TaskId::ALL {
            assert_eq!(registry.lookup(id.as_str()).unwrap().name(), id.as_str());
        }
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut registry = builtin_registry().unwrap();
        assert_eq!(
            register_builtin(&mut registry).unwrap_err(),
            RegistryError::DuplicateName("clean".to_string())
        );
    }

    #[test]
    fn test_env_production_sets_mode() {
        let mut ctx = BuildContext::new(ThemeConfig::default(), "/project".into());
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        builtin_task(TaskId::EnvProduction).invoke(&mut ctx, &reporter).unwrap();
        assert_eq!(ctx.mode(), Mode::Production);
    }

    #[test]
    fn test_report_on_missing_dist() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut ctx = BuildContext::new(ThemeConfig::default(), temp.path().to_path_buf());
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        builtin_task(TaskId::Report).invoke(&mut ctx, &reporter).unwrap();
    }
}
