//! Tasks: named units of build work.
//!
//! A task body comes in one of two calling conventions:
//!
//! - **Synchronous**: the body returns when the work is done. An `Err` marks
//!   the task as failed.
//! - **Explicit completion**: the body receives a [`Completion`] handle and
//!   may hand it to another thread. The task is finished when the handle is
//!   resolved. Resolving consumes the handle, so it can be resolved at most
//!   once; a body that keeps the handle alive without resolving it blocks the
//!   sequence forever, and one that drops it fails with
//!   [`TaskError::Abandoned`].
//!
//! Tasks carry no dependencies. Ordering comes only from the
//! [`Sequence`](crate::sequence::Sequence) they are composed into.

mod error;
mod registry;

pub use error::{RegistryError, TaskError, TransformError};
pub use registry::TaskRegistry;

use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::build::progress::{ProgressEvent, ProgressReporter};
use crate::build::BuildContext;

type SyncBody = dyn Fn(&mut BuildContext, &TaskLog<'_>) -> Result<(), TaskError> + Send + Sync;
type DeferredBody = dyn Fn(&mut BuildContext, &TaskLog<'_>, Completion) + Send + Sync;

enum TaskBody {
    Sync(Box<SyncBody>),
    Deferred(Box<DeferredBody>),
}

/// A named unit of work.
pub struct Task {
    name: String,
    body: TaskBody,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.body {
            TaskBody::Sync(_) => "sync",
            TaskBody::Deferred(_) => "deferred",
        };
        f.debug_struct("Task").field("name", &self.name).field("body", &kind).finish()
    }
}

impl Task {
    /// Create a task with a synchronous body.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut BuildContext, &TaskLog<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Self { name: name.into(), body: TaskBody::Sync(Box::new(body)) }
    }

    /// Create a task whose body signals completion through a [`Completion`].
    pub fn deferred<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut BuildContext, &TaskLog<'_>, Completion) + Send + Sync + 'static,
    {
        Self { name: name.into(), body: TaskBody::Deferred(Box::new(body)) }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the body and wait until it has finished.
    pub fn invoke(
        &self,
        ctx: &mut BuildContext,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> Result<(), TaskError> {
        let log = TaskLog { task: &self.name, reporter };
        match &self.body {
            TaskBody::Sync(body) => body(ctx, &log),
            TaskBody::Deferred(body) => {
                let (completion, signal) = Completion::channel();
                body(ctx, &log, completion);
                signal.recv().unwrap_or_else(|_| Err(TaskError::Abandoned(self.name.clone())))
            }
        }
    }
}

/// One-shot completion handle for explicit-completion task bodies.
#[derive(Debug)]
pub struct Completion {
    sender: Sender<Result<(), TaskError>>,
}

impl Completion {
    fn channel() -> (Self, Receiver<Result<(), TaskError>>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    /// Resolve the task with a result.
    pub fn complete(self, result: Result<(), TaskError>) {
        // The sequencer waits on the other end for as long as the task runs.
        let _ = self.sender.send(result);
    }

    /// Resolve the task as successful.
    pub fn succeed(self) {
        self.complete(Ok(()))
    }

    /// Resolve the task as failed.
    pub fn fail(self, error: TaskError) {
        self.complete(Err(error))
    }
}

/// Reporting handle passed to task bodies.
pub struct TaskLog<'a> {
    task: &'a str,
    reporter: &'a Arc<dyn ProgressReporter>,
}

impl<'a> TaskLog<'a> {
    /// Reporting handle for work a body continues on another thread.
    pub fn new(task: &'a str, reporter: &'a Arc<dyn ProgressReporter>) -> Self {
        Self { task, reporter }
    }

    /// Name of the running task.
    pub fn task(&self) -> &str {
        self.task
    }

    /// The reporter events go to, for bodies that outlive the call.
    pub fn reporter(&self) -> &Arc<dyn ProgressReporter> {
        self.reporter
    }

    /// Report an informational message.
    pub fn info(&self, message: impl Into<String>) {
        self.reporter
            .report(ProgressEvent::Info { task: Some(self.task.to_string()), message: message.into() });
    }

    /// Report a warning.
    pub fn warn(&self, message: impl Into<String>) {
        self.reporter.report(ProgressEvent::Warning {
            task: Some(self.task.to_string()),
            message: message.into(),
        });
    }

    /// Whether the reporter asked for verbose output.
    pub fn is_verbose(&self) -> bool {
        self.reporter.is_verbose()
    }
}

/// Built-in task identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Clean,
    Copy,
    Sass,
    Autoprefixer,
    Jshint,
    Template,
    Modernizr,
    Uglify,
    Jquery,
    Normalize,
    EnvProduction,
    Report,
}

impl TaskId {
    /// Every built-in task, in registration order.
    pub const ALL: [TaskId; 12] = [
        TaskId::Clean,
        TaskId::Copy,
        TaskId::Sass,
        TaskId::Autoprefixer,
        TaskId::Jshint,
        TaskId::Template,
        TaskId::Modernizr,
        TaskId::Uglify,
        TaskId::Jquery,
        TaskId::Normalize,
        TaskId::EnvProduction,
        TaskId::Report,
    ];

    /// Registry name of the task.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Clean => "clean",
            TaskId::Copy => "copy",
            TaskId::Sass => "sass",
            TaskId::Autoprefixer => "autoprefixer",
            TaskId::Jshint => "jshint",
            TaskId::Template => "template",
            TaskId::Modernizr => "modernizr",
            TaskId::Uglify => "uglify",
            TaskId::Jquery => "jquery",
            TaskId::Normalize => "normalize",
            TaskId::EnvProduction => "env-production",
            TaskId::Report => "report",
        }
    }
}

impl FromStr for TaskId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| RegistryError::NotFound(s.to_string()))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
