//! Named entrypoints and the fixed sequences they run.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::build::DiscoveryError;
use crate::config::ThemeConfig;
use crate::sequence::Sequence;
use crate::task::{RegistryError, TaskId, TaskRegistry};
use crate::watch::{self, WatchBinding};

/// Failure to assemble an entrypoint's sequence.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A watch binding pattern is invalid
    #[error(transparent)]
    Pattern(#[from] DiscoveryError),
    /// A watch binding names something that is not an entrypoint
    #[error("watch binding target: {0}")]
    UnknownTarget(String),
    /// A watch binding targets an entrypoint that never returns
    #[error("watch binding target '{0}' never returns")]
    ResidentTarget(Entrypoint),
}

/// Entrypoints selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entrypoint {
    Clean,
    Copy,
    Sass,
    Styles,
    Jshint,
    Template,
    Modernizr,
    Uglify,
    Jquery,
    Normalize,
    EnvProduction,
    Build,
    Watch,
    Default,
}

impl Entrypoint {
    pub const ALL: [Entrypoint; 14] = [
        Entrypoint::Clean,
        Entrypoint::Copy,
        Entrypoint::Sass,
        Entrypoint::Styles,
        Entrypoint::Jshint,
        Entrypoint::Template,
        Entrypoint::Modernizr,
        Entrypoint::Uglify,
        Entrypoint::Jquery,
        Entrypoint::Normalize,
        Entrypoint::EnvProduction,
        Entrypoint::Build,
        Entrypoint::Watch,
        Entrypoint::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entrypoint::Clean => "clean",
            Entrypoint::Copy => "copy",
            Entrypoint::Sass => "sass",
            Entrypoint::Styles => "styles",
            Entrypoint::Jshint => "jshint",
            Entrypoint::Template => "template",
            Entrypoint::Modernizr => "modernizr",
            Entrypoint::Uglify => "uglify",
            Entrypoint::Jquery => "jquery",
            Entrypoint::Normalize => "normalize",
            Entrypoint::EnvProduction => "env-production",
            Entrypoint::Build => "build",
            Entrypoint::Watch => "watch",
            Entrypoint::Default => "default",
        }
    }

    /// One-line summary for `--list`.
    pub fn description(&self) -> &'static str {
        match self {
            Entrypoint::Clean => "Remove the scratch and distribution directories",
            Entrypoint::Copy => "Copy static assets into the distribution directory",
            Entrypoint::Sass => "Concatenate and compile stylesheets",
            Entrypoint::Styles => "Compile stylesheets and add vendor prefixes",
            Entrypoint::Jshint => "Lint scripts",
            Entrypoint::Template => "Render templates into derived files",
            Entrypoint::Modernizr => "Generate the feature-detection script",
            Entrypoint::Uglify => "Concatenate and minify scripts",
            Entrypoint::Jquery => "Sync the vendored jQuery",
            Entrypoint::Normalize => "Sync the vendored normalize.css",
            Entrypoint::EnvProduction => "Switch to production mode",
            Entrypoint::Build => "Full production build",
            Entrypoint::Watch => "Prepare sources, then rebuild on change",
            Entrypoint::Default => "Same as watch",
        }
    }

    /// Whether the entrypoint keeps running until the process exits.
    pub fn is_resident(&self) -> bool {
        matches!(self, Entrypoint::Watch | Entrypoint::Default)
    }

    /// Assemble the sequence this entrypoint runs.
    pub fn compose(
        &self,
        registry: &TaskRegistry,
        config: &ThemeConfig,
    ) -> Result<Sequence, ComposeError> {
        let single = |id: TaskId| Sequence::compose(self.as_str(), registry, &[id.as_str()]);

        let sequence = match self {
            Entrypoint::Clean => single(TaskId::Clean)?,
            Entrypoint::Copy => single(TaskId::Copy)?,
            Entrypoint::Sass => single(TaskId::Sass)?,
            Entrypoint::Jshint => single(TaskId::Jshint)?,
            Entrypoint::Template => single(TaskId::Template)?,
            Entrypoint::Modernizr => single(TaskId::Modernizr)?,
            Entrypoint::Uglify => single(TaskId::Uglify)?,
            Entrypoint::Jquery => single(TaskId::Jquery)?,
            Entrypoint::Normalize => single(TaskId::Normalize)?,
            Entrypoint::EnvProduction => single(TaskId::EnvProduction)?,
            Entrypoint::Styles => styles_sequence(registry)?,
            Entrypoint::Build => Sequence::new("build")
                .then_named(registry, TaskId::EnvProduction.as_str())?
                .then_named(registry, TaskId::Clean.as_str())?
                .then_named(registry, TaskId::Template.as_str())?
                .then_sequence(Arc::new(styles_sequence(registry)?))
                .then_named(registry, TaskId::Modernizr.as_str())?
                .then_named(registry, TaskId::Jshint.as_str())?
                .then_named(registry, TaskId::Copy.as_str())?
                .then_named(registry, TaskId::Uglify.as_str())?
                .then_named(registry, TaskId::Report.as_str())?,
            Entrypoint::Watch => watch_sequence(registry, config)?,
            Entrypoint::Default => {
                Sequence::new("default").then_sequence(Arc::new(watch_sequence(registry, config)?))
            }
        };
        Ok(sequence)
    }
}

fn styles_sequence(registry: &TaskRegistry) -> Result<Sequence, RegistryError> {
    Sequence::compose(
        Entrypoint::Styles.as_str(),
        registry,
        &[TaskId::Sass.as_str(), TaskId::Autoprefixer.as_str()],
    )
}

fn watch_sequence(registry: &TaskRegistry, config: &ThemeConfig) -> Result<Sequence, ComposeError> {
    let bindings = watch_bindings(registry, config)?;
    let debounce = Duration::from_millis(u64::from(config.watch.debounce_ms));

    Ok(Sequence::new("watch")
        .then_named(registry, TaskId::Template.as_str())?
        .then_sequence(Arc::new(styles_sequence(registry)?))
        .then_named(registry, TaskId::Jshint.as_str())?
        .then_named(registry, TaskId::Modernizr.as_str())?
        .then_named(registry, TaskId::Jquery.as_str())?
        .then_named(registry, TaskId::Normalize.as_str())?
        .then_task(Arc::new(watch::start_task(bindings, debounce))))
}

/// Build the configured watch bindings, composing each target entrypoint.
pub fn watch_bindings(
    registry: &TaskRegistry,
    config: &ThemeConfig,
) -> Result<Vec<WatchBinding>, ComposeError> {
    config
        .watch
        .bindings
        .iter()
        .map(|binding| {
            let target: Entrypoint = binding.target.parse().map_err(ComposeError::UnknownTarget)?;
            if target.is_resident() {
                return Err(ComposeError::ResidentTarget(target));
            }
            let sequence = target.compose(registry, config)?;
            Ok(WatchBinding::new(binding.patterns.clone(), binding.events.clone(), Arc::new(sequence))?)
        })
        .collect()
}

impl FromStr for Entrypoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entrypoint::ALL.into_iter().find(|e| e.as_str() == s).ok_or_else(|| {
            let names: Vec<&str> = Entrypoint::ALL.iter().map(Entrypoint::as_str).collect();
            format!("unknown entrypoint '{}' (expected one of: {})", s, names.join(", "))
        })
    }
}

impl std::fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
