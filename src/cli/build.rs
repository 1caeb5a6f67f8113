//! Entrypoint execution and listing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::progress::{ConsoleProgress, ProgressReporter};
use crate::build::BuildContext;
use crate::config::{load_project, ConfigError, ThemeConfig};
use crate::entrypoint::Entrypoint;
use crate::mode::Mode;
use crate::tasks::builtin_registry;

fn load(config: Option<&Path>) -> Result<(ThemeConfig, PathBuf), ExitCode> {
    match load_project(config) {
        Ok(loaded) => Ok(loaded),
        Err(ConfigError::Validation(errors)) => {
            for error in errors {
                eprintln!("Error: {}", error);
            }
            Err(ExitCode::from(EXIT_ERROR))
        }
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Run a named entrypoint to completion.
pub fn run_entrypoint(
    name: &str,
    mode: Mode,
    config: Option<&Path>,
    verbose: bool,
    use_colors: bool,
) -> ExitCode {
    let entrypoint: Entrypoint = match name.parse() {
        Ok(entrypoint) => entrypoint,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Run 'themekit --list' to see available entrypoints");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let (config, project_root) = match load(config) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    tracing::debug!(root = %project_root.display(), "project root");

    let registry = match builtin_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let sequence = match entrypoint.compose(&registry, &config) {
        Ok(sequence) => sequence,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut context = BuildContext::new(config, project_root).with_mode(mode).with_verbose(verbose);
    let reporter: Arc<dyn ProgressReporter> =
        Arc::new(ConsoleProgress::new().with_colors(use_colors).with_verbose(verbose));

    if entrypoint.is_resident() {
        eprintln!("Press Ctrl+C to stop");
    }

    match sequence.run(&mut context, &reporter) {
        Ok(report) => {
            tracing::debug!(tasks = report.tasks.len(), mode = %context.mode(), "finished");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            tracing::debug!("{:?}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Print entrypoints and registered tasks.
pub fn run_list(config: Option<&Path>) -> ExitCode {
    let (config, _) = match load(config) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let registry = match builtin_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Entrypoints:");
    for entrypoint in Entrypoint::ALL {
        let tasks = match entrypoint.compose(&registry, &config) {
            Ok(sequence) => sequence.task_names().join(" -> "),
            Err(e) => format!("error: {}", e),
        };
        println!("  {:<16} {}", entrypoint.as_str(), entrypoint.description());
        println!("  {:<16} {}", "", tasks);
    }

    println!();
    println!("Tasks:");
    for name in registry.names() {
        println!("  {}", name);
    }

    ExitCode::from(EXIT_SUCCESS)
}
