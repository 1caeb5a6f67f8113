//! Watch mode: re-run sequences when matching files change.
//!
//! A [`WatchTrigger`] holds a set of [`WatchBinding`]s, each pairing glob
//! patterns and an event filter with a target sequence. Every matching change
//! starts an independent invocation of the target on its own thread, with its
//! own copy of the build context. Invocations may overlap; nothing is queued
//! or cancelled, and a failing invocation is reported without stopping the
//! trigger.

use glob::{MatchOptions, Pattern};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

use crate::build::progress::{ProgressEvent, ProgressReporter};
use crate::build::{compile_patterns, discover_all, BuildContext, DiscoveryError};
use crate::sequence::{Sequence, SequenceError, SequenceReport};
use crate::task::Task;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Invalid binding pattern
    #[error(transparent)]
    Pattern(#[from] DiscoveryError),
    /// Event channel closed
    #[error("Watch channel error: {0}")]
    ChannelError(String),
}

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEvent {
    /// A file appeared
    Add,
    /// A known file was modified
    Change,
    /// A file was removed
    Unlink,
}

impl std::fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchEvent::Add => write!(f, "add"),
            WatchEvent::Change => write!(f, "change"),
            WatchEvent::Unlink => write!(f, "unlink"),
        }
    }
}

/// Glob patterns and an event filter bound to a target sequence.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    patterns: Vec<String>,
    matchers: Vec<Pattern>,
    events: Vec<WatchEvent>,
    target: Arc<Sequence>,
}

impl WatchBinding {
    /// Create a binding. An empty event list accepts every event.
    pub fn new(
        patterns: Vec<String>,
        events: Vec<WatchEvent>,
        target: Arc<Sequence>,
    ) -> Result<Self, DiscoveryError> {
        let mut matchers = Vec::new();
        for pattern in &patterns {
            matchers.extend(compile_patterns(pattern)?);
        }
        Ok(Self { patterns, matchers, events, target })
    }

    /// Whether a change at `relative` (to the project root) triggers this binding.
    pub fn matches(&self, relative: &Path, event: WatchEvent) -> bool {
        (self.events.is_empty() || self.events.contains(&event)) && self.covers(relative)
    }

    /// Whether `relative` matches one of the patterns, whatever the event.
    pub fn covers(&self, relative: &Path) -> bool {
        let options = MatchOptions { require_literal_separator: true, ..MatchOptions::new() };
        self.matchers.iter().any(|m| m.matches_path_with(relative, options))
    }

    /// Directories, relative to the project root, that contain every path
    /// the patterns can match: the literal components before the first
    /// wildcard.
    pub fn base_dirs(&self) -> Vec<PathBuf> {
        self.matchers
            .iter()
            .map(|m| {
                let components: Vec<&str> = m.as_str().split('/').collect();
                let mut base = PathBuf::new();
                for (i, component) in components.iter().enumerate() {
                    if i + 1 == components.len() || component.contains(['*', '?', '[']) {
                        break;
                    }
                    base.push(component);
                }
                base
            })
            .collect()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn target(&self) -> &Arc<Sequence> {
        &self.target
    }
}

/// Long-lived observer dispatching file changes to bindings.
pub struct WatchTrigger {
    context: BuildContext,
    bindings: Vec<WatchBinding>,
    reporter: Arc<dyn ProgressReporter>,
    debounce: Duration,
    /// Files seen so far, used to tell `add` from `change`
    known: Mutex<HashSet<PathBuf>>,
}

impl std::fmt::Debug for WatchTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTrigger")
            .field("root", &self.context.project_root())
            .field("bindings", &self.bindings.len())
            .field("debounce", &self.debounce)
            .finish()
    }
}

impl WatchTrigger {
    /// Create a trigger rooted at the context's project root.
    ///
    /// Files already matching a binding are recorded as known, so their
    /// first modification is reported as `change` rather than `add`.
    pub fn new(
        context: BuildContext,
        bindings: Vec<WatchBinding>,
        reporter: Arc<dyn ProgressReporter>,
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let root = context.project_root().to_path_buf();
        let mut known = HashSet::new();
        for binding in &bindings {
            known.extend(discover_all(&root, &binding.patterns)?);
        }
        Ok(Self { context, bindings, reporter, debounce, known: Mutex::new(known) })
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Directories to watch recursively: the existing base directories of
    /// every binding, without any nested inside another. A base directory
    /// that does not exist yet is replaced by its nearest existing ancestor
    /// under the project root.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let root = self.context.project_root();
        let mut dirs: Vec<PathBuf> = self
            .bindings
            .iter()
            .flat_map(WatchBinding::base_dirs)
            .map(|base| {
                let mut dir = root.to_path_buf();
                dir.extend(&base);
                while !dir.is_dir() && dir.as_path() != root && dir.pop() {}
                dir
            })
            .collect();
        dirs.sort();
        dirs.dedup();

        let mut outermost: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !outermost.iter().any(|kept| dir.starts_with(kept)) {
                outermost.push(dir);
            }
        }
        outermost
    }

    /// Classify a change reported for `path` and update the known-file set.
    ///
    /// Only paths some binding covers are recorded; build outputs and other
    /// unrelated files never enter the set.
    pub fn classify(&self, path: &Path) -> WatchEvent {
        let relative = self.relative(path);
        if !self.bindings.iter().any(|b| b.covers(&relative)) {
            return if path.exists() { WatchEvent::Change } else { WatchEvent::Unlink };
        }

        let mut known = match self.known.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if path.exists() {
            if known.insert(path.to_path_buf()) {
                WatchEvent::Add
            } else {
                WatchEvent::Change
            }
        } else {
            known.remove(path);
            WatchEvent::Unlink
        }
    }

    /// Start one invocation per binding matching the change.
    ///
    /// Each invocation runs on its own thread with its own clone of the
    /// context. The returned handles may be joined or dropped; dropping them
    /// leaves the invocations running.
    pub fn dispatch(
        &self,
        path: &Path,
        event: WatchEvent,
    ) -> Vec<JoinHandle<Result<SequenceReport, SequenceError>>> {
        let relative = self.relative(path);
        let mut handles = Vec::new();

        for binding in &self.bindings {
            if !binding.matches(&relative, event) {
                continue;
            }
            tracing::debug!(
                path = %relative.display(),
                %event,
                sequence = binding.target.name(),
                "dispatching watch target"
            );
            self.reporter.report(ProgressEvent::Info {
                task: None,
                message: format!(
                    "{} {} -> {}",
                    event,
                    relative.display(),
                    binding.target.name()
                ),
            });

            let target = Arc::clone(&binding.target);
            let reporter = Arc::clone(&self.reporter);
            let mut ctx = self.context.clone();
            handles.push(thread::spawn(move || {
                let result = target.run(&mut ctx, &reporter);
                if let Err(e) = &result {
                    tracing::warn!(sequence = target.name(), "watch invocation failed: {}", e);
                    reporter.report(ProgressEvent::Error {
                        task: Some(e.task.clone()),
                        message: format!("{} (still watching)", e.source),
                    });
                }
                result
            }));
        }

        handles
    }

    /// Watch the binding base directories and dispatch changes until the
    /// process exits.
    ///
    /// Only returns if the watcher cannot be set up or its channel closes.
    pub fn run(&self) -> Result<(), WatchError> {
        let root = self.context.project_root();
        let (tx, rx) = channel();
        let mut debouncer = new_debouncer(self.debounce, tx).map_err(WatchError::WatcherInit)?;
        let dirs = self.watch_dirs();
        for dir in &dirs {
            tracing::debug!(dir = %dir.display(), "watching");
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::Recursive)
                .map_err(WatchError::WatchPath)?;
        }

        let shown: Vec<String> = dirs
            .iter()
            .map(|d| match self.context.display_path(d).to_string() {
                relative if relative.is_empty() => ".".to_string(),
                relative => relative,
            })
            .collect();
        self.reporter.report(ProgressEvent::Info {
            task: None,
            message: format!(
                "Watching {} for changes ({} binding{})...",
                if shown.is_empty() { root.display().to_string() } else { shown.join(", ") },
                self.bindings.len(),
                if self.bindings.len() == 1 { "" } else { "s" }
            ),
        });

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    for event in events {
                        if !matches!(event.kind, DebouncedEventKind::Any) {
                            continue;
                        }
                        let kind = self.classify(&event.path);
                        // Invocations are detached; failures are reported from their thread.
                        drop(self.dispatch(&event.path, kind));
                    }
                }
                Ok(Err(error)) => {
                    tracing::warn!("watch error: {:?}", error);
                    self.reporter.report(ProgressEvent::Warning {
                        task: None,
                        message: format!("Watch error: {:?}, continuing to watch", error),
                    });
                }
                Err(e) => {
                    return Err(WatchError::ChannelError(e.to_string()));
                }
            }
        }
    }

    /// Path relative to the project root, trying the canonical root as well
    /// since watchers may report resolved paths.
    fn relative(&self, path: &Path) -> PathBuf {
        let root = self.context.project_root();
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.to_path_buf();
        }
        if let Ok(canonical) = root.canonicalize() {
            if let Ok(rel) = path.strip_prefix(&canonical) {
                return rel.to_path_buf();
            }
        }
        path.to_path_buf()
    }
}

/// Task that starts a [`WatchTrigger`] over `bindings` with the running
/// context and never returns unless the watcher fails.
pub fn start_task(bindings: Vec<WatchBinding>, debounce: Duration) -> Task {
    Task::new("start-watch", move |ctx, log| {
        let trigger =
            WatchTrigger::new(ctx.clone(), bindings.clone(), Arc::clone(log.reporter()), debounce)?;
        trigger.run()?;
        Ok(())
    })
}
