//! Sequence progress reporting.
//!
//! The sequencer emits a [`ProgressEvent`] for every sequence and task it
//! runs. Reporters decide how (and whether) to show them: [`ConsoleProgress`]
//! writes coloured lines to stderr, [`NullProgress`] discards everything.
//!
//! # Example
//!
//! ```ignore
//! use themekit::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter, TaskStatus};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::SequenceStarted {
//!     sequence: "build".to_string(),
//!     depth: 0,
//!     total_tasks: 9,
//! });
//! reporter.report(ProgressEvent::TaskCompleted {
//!     task: "clean".to_string(),
//!     status: TaskStatus::Success,
//!     duration_ms: 12,
//! });
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

/// Outcome of a task in progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task finished without error
    Success,
    /// Task failed
    Failed(String),
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Events that can be reported while a sequence runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A sequence started
    SequenceStarted {
        /// Sequence name
        sequence: String,
        /// Nesting depth, 0 for the entrypoint itself
        depth: usize,
        /// Number of tasks in the sequence, nested ones included
        total_tasks: usize,
    },
    /// A task started
    TaskStarted {
        /// Task name
        task: String,
    },
    /// A task finished
    TaskCompleted {
        /// Task name
        task: String,
        /// Outcome
        status: TaskStatus,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// A sequence finished, successfully or not
    SequenceCompleted {
        /// Sequence name
        sequence: String,
        /// Nesting depth, 0 for the entrypoint itself
        depth: usize,
        /// Whether every task succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Tasks that succeeded
        succeeded: usize,
        /// Tasks never started because an earlier one failed
        not_run: usize,
    },
    /// Informational message from a task
    Info {
        /// Task that produced the message (if applicable)
        task: Option<String>,
        /// Message text
        message: String,
    },
    /// A warning was generated
    Warning {
        /// Task that generated the warning (if applicable)
        task: Option<String>,
        /// Warning message
        message: String,
    },
    /// An error occurred
    Error {
        /// Task that generated the error (if applicable)
        task: Option<String>,
        /// Error message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// `[finished, total]` task counts of the top-level sequence running on
    /// each thread. Watch invocations overlap on separate threads.
    counters: Mutex<HashMap<ThreadId, [usize; 2]>>,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a new console progress reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            counters: Mutex::new(HashMap::new()),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            counters: Mutex::new(HashMap::new()),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn bold(&self, text: &str) -> String {
        self.color(text, "\x1b[1m")
    }

    /// Apply `update` to this thread's counters and return them.
    fn with_counters(&self, update: impl FnOnce(&mut [usize; 2])) -> [usize; 2] {
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = counters.entry(thread::current().id()).or_insert([0, 0]);
        update(entry);
        *entry
    }

    fn end_counters(&self) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.remove(&thread::current().id());
        }
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn task_prefix(task: Option<String>) -> String {
    match task {
        Some(name) => format!("{}: ", name),
        None => String::new(),
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SequenceStarted { sequence, depth, total_tasks } => {
                if depth == 0 {
                    self.with_counters(|c| *c = [0, total_tasks]);
                    self.writeln(&format!(
                        "{} Running '{}' ({} task{})...",
                        self.cyan("[run]"),
                        sequence,
                        total_tasks,
                        if total_tasks == 1 { "" } else { "s" }
                    ));
                } else if self.verbose {
                    self.writeln(&format!("{} Entering '{}'", self.cyan("[run]"), sequence));
                }
            }
            ProgressEvent::TaskStarted { task } => {
                if self.verbose {
                    let [done, total] = self.with_counters(|_| {});
                    let current = done + 1;
                    self.writeln(&format!(
                        "{} [{}/{}] Starting {}...",
                        self.cyan("[run]"),
                        current,
                        total,
                        task
                    ));
                }
            }
            ProgressEvent::TaskCompleted { task, status, duration_ms } => {
                let [current, total] = self.with_counters(|c| c[0] += 1);

                let status_str = match &status {
                    TaskStatus::Success => self.green("ok"),
                    TaskStatus::Failed(_) => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({})",
                    self.cyan("[run]"),
                    current,
                    total,
                    status_str,
                    task,
                    format_duration(duration_ms)
                ));

                if let TaskStatus::Failed(err) = status {
                    for line in err.lines() {
                        self.writeln(&format!("        {}", self.red(line)));
                    }
                }
            }
            ProgressEvent::SequenceCompleted {
                sequence,
                depth,
                success,
                duration_ms,
                succeeded,
                not_run,
            } => {
                if depth != 0 {
                    return;
                }
                self.end_counters();
                let duration_str = format_duration(duration_ms);
                if success {
                    self.writeln(&format!(
                        "{} '{}' finished: {} {} in {}",
                        self.green("[done]"),
                        sequence,
                        self.bold(&succeeded.to_string()),
                        if succeeded == 1 { "task" } else { "tasks" },
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "{} '{}' failed: {} succeeded, {} not run, in {}",
                        self.red("[error]"),
                        sequence,
                        succeeded,
                        not_run,
                        duration_str
                    ));
                }
            }
            ProgressEvent::Info { task, message } => {
                self.writeln(&format!("{} {}{}", self.cyan("[info]"), task_prefix(task), message));
            }
            ProgressEvent::Warning { task, message } => {
                self.writeln(&format!(
                    "{} {}{}",
                    self.yellow("[warn]"),
                    task_prefix(task),
                    message
                ));
            }
            ProgressEvent::Error { task, message } => {
                self.writeln(&format!("{} {}{}", self.red("[error]"), task_prefix(task), message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub(crate) fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
