//! Ordered, failure-propagating composition of tasks.
//!
//! A [`Sequence`] runs its steps strictly one after another. Each step must
//! finish before the next starts, and the first failure stops the sequence:
//! no later step is invoked. A nested sequence behaves as one step, so a
//! failure inside it also stops every enclosing sequence.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::build::progress::{ProgressEvent, ProgressReporter, TaskStatus};
use crate::build::BuildContext;
use crate::task::{RegistryError, Task, TaskError, TaskRegistry};

/// A sequence failed because one of its tasks failed.
#[derive(Debug, Error)]
#[error("'{sequence}' stopped at task '{task}': {source}")]
pub struct SequenceError {
    /// Innermost sequence containing the failing task
    pub sequence: String,
    /// Name of the failing task
    pub task: String,
    /// What the task reported
    #[source]
    pub source: TaskError,
}

/// One element of a sequence.
#[derive(Debug, Clone)]
pub enum Step {
    Task(Arc<Task>),
    Sequence(Arc<Sequence>),
}

impl Step {
    fn task_count(&self) -> usize {
        match self {
            Step::Task(_) => 1,
            Step::Sequence(seq) => seq.task_count(),
        }
    }
}

/// Record of a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRun {
    pub task: String,
    pub duration: Duration,
}

/// Result of a successful sequence run.
#[derive(Debug, Clone, Default)]
pub struct SequenceReport {
    /// Tasks in the order they ran, nested sequences flattened
    pub tasks: Vec<TaskRun>,
    /// Total run time
    pub duration: Duration,
}

impl SequenceReport {
    /// Task names in the order they ran.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task.as_str()).collect()
    }
}

/// An ordered list of tasks and nested sequences.
#[derive(Debug, Clone)]
pub struct Sequence {
    name: String,
    steps: Vec<Step>,
}

impl Sequence {
    /// Create an empty sequence.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    /// Compose a sequence from registered task names, in order.
    pub fn compose<S: AsRef<str>>(
        name: impl Into<String>,
        registry: &TaskRegistry,
        tasks: &[S],
    ) -> Result<Self, RegistryError> {
        let mut sequence = Sequence::new(name);
        for task in tasks {
            sequence.steps.push(Step::Task(registry.lookup(task.as_ref())?));
        }
        Ok(sequence)
    }

    /// Append a task.
    pub fn then_task(mut self, task: Arc<Task>) -> Self {
        self.steps.push(Step::Task(task));
        self
    }

    /// Append a nested sequence.
    pub fn then_sequence(mut self, sequence: Arc<Sequence>) -> Self {
        self.steps.push(Step::Sequence(sequence));
        self
    }

    /// Append a registered task by name.
    pub fn then_named(self, registry: &TaskRegistry, task: &str) -> Result<Self, RegistryError> {
        Ok(self.then_task(registry.lookup(task)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of tasks, nested sequences included.
    pub fn task_count(&self) -> usize {
        self.steps.iter().map(Step::task_count).sum()
    }

    /// Flattened task names in execution order.
    pub fn task_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        for step in &self.steps {
            match step {
                Step::Task(task) => names.push(task.name().to_string()),
                Step::Sequence(seq) => seq.collect_names(names),
            }
        }
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(
        &self,
        ctx: &mut BuildContext,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> Result<SequenceReport, SequenceError> {
        let mut report = SequenceReport::default();
        let start = Instant::now();
        let result = self.run_nested(ctx, reporter, 0, &mut report);
        report.duration = start.elapsed();
        result.map(|()| report)
    }

    fn run_nested(
        &self,
        ctx: &mut BuildContext,
        reporter: &Arc<dyn ProgressReporter>,
        depth: usize,
        report: &mut SequenceReport,
    ) -> Result<(), SequenceError> {
        let start = Instant::now();
        let before = report.tasks.len();
        tracing::debug!(sequence = %self.name, depth, mode = %ctx.mode(), "sequence started");
        reporter.report(ProgressEvent::SequenceStarted {
            sequence: self.name.clone(),
            depth,
            total_tasks: self.task_count(),
        });

        let mut outcome = Ok(());
        for step in &self.steps {
            let result = match step {
                Step::Task(task) => self.run_task(task, ctx, reporter, report),
                Step::Sequence(seq) => seq.run_nested(ctx, reporter, depth + 1, report),
            };
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
        }

        let succeeded = report.tasks.len() - before;
        let failed = usize::from(outcome.is_err());
        reporter.report(ProgressEvent::SequenceCompleted {
            sequence: self.name.clone(),
            depth,
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            succeeded,
            not_run: self.task_count() - succeeded - failed,
        });
        tracing::debug!(sequence = %self.name, ok = outcome.is_ok(), "sequence finished");
        outcome
    }

    fn run_task(
        &self,
        task: &Task,
        ctx: &mut BuildContext,
        reporter: &Arc<dyn ProgressReporter>,
        report: &mut SequenceReport,
    ) -> Result<(), SequenceError> {
        reporter.report(ProgressEvent::TaskStarted { task: task.name().to_string() });
        let start = Instant::now();
        let result = task.invoke(ctx, reporter);
        let duration = start.elapsed();

        let status = match &result {
            Ok(()) => TaskStatus::Success,
            Err(e) => TaskStatus::Failed(e.to_string()),
        };
        reporter.report(ProgressEvent::TaskCompleted {
            task: task.name().to_string(),
            status,
            duration_ms: duration.as_millis() as u64,
        });

        match result {
            Ok(()) => {
                report.tasks.push(TaskRun { task: task.name().to_string(), duration });
                Ok(())
            }
            Err(source) => Err(SequenceError {
                sequence: self.name.clone(),
                task: task.name().to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::NullProgress;
    use crate::config::ThemeConfig;
    use crate::mode::Mode;
    use crate::task::TransformError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn context() -> BuildContext {
        BuildContext::new(ThemeConfig::default(), PathBuf::from("/project"))
    }

    fn reporter() -> Arc<dyn ProgressReporter> {
        Arc::new(NullProgress::new())
    }

    /// Registry of instrumented tasks recording their invocation into `log`.
    fn instrumented(names: &[&str], failing: &str, log: &Arc<Mutex<Vec<String>>>) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for name in names {
            let log = Arc::clone(log);
            let fails = *name == failing;
            let task_name = name.to_string();
            registry
                .register(Task::new(*name, move |_, _| {
                    log.lock().unwrap().push(task_name.clone());
                    if fails {
                        Err(TransformError::Other(format!("{} broke", task_name)).into())
                    } else {
                        Ok(())
                    }
                }))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_runs_in_list_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = instrumented(&["a", "b", "c"], "", &log);
        let seq = Sequence::compose("all", &registry, &["c", "a", "b"]).unwrap();

        let report = seq.run(&mut context(), &reporter()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["c", "a", "b"]);
        assert_eq!(report.task_names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_failure_stops_later_steps_at_every_position() {
        let names = ["t1", "t2", "t3", "t4", "t5"];
        for (i, failing) in names.iter().enumerate() {
            let log = Arc::new(Mutex::new(Vec::new()));
            let registry = instrumented(&names, failing, &log);
            let seq = Sequence::compose("seq", &registry, &names).unwrap();

            let err = seq.run(&mut context(), &reporter()).unwrap_err();
            assert_eq!(err.task, *failing);
            assert_eq!(err.sequence, "seq");
            let ran = log.lock().unwrap().clone();
            assert_eq!(ran, names[..=i].to_vec(), "failing at {}", failing);
        }
    }

    #[test]
    fn test_nested_failure_aborts_outer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = instrumented(&["a", "b", "c", "d", "e"], "c", &log);
        let inner = Sequence::compose("inner", &registry, &["b", "c", "d"]).unwrap();
        let outer = Sequence::compose("outer", &registry, &["a"])
            .unwrap()
            .then_sequence(Arc::new(inner))
            .then_named(&registry, "e")
            .unwrap();

        let err = outer.run(&mut context(), &reporter()).unwrap_err();
        assert_eq!(err.sequence, "inner");
        assert_eq!(err.task, "c");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_compose_unknown_task() {
        let registry = TaskRegistry::new();
        let err = Sequence::compose("x", &registry, &["missing"]).unwrap_err();
        assert_eq!(err, RegistryError::NotFound("missing".to_string()));
    }

    #[test]
    fn test_context_mutation_visible_to_later_tasks() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let mut registry = TaskRegistry::new();
        registry
            .register(Task::new("set", |ctx, _| {
                ctx.set_mode(Mode::Production);
                Ok(())
            }))
            .unwrap();
        registry
            .register(Task::new("read", move |ctx, _| {
                *seen_clone.lock().unwrap() = Some(ctx.mode());
                Ok(())
            }))
            .unwrap();

        let seq = Sequence::compose("s", &registry, &["set", "read"]).unwrap();
        let mut ctx = context();
        seq.run(&mut ctx, &reporter()).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(Mode::Production));
        assert_eq!(ctx.mode(), Mode::Production);
    }

    #[test]
    fn test_deferred_task_finishes_before_next_starts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slow_log = Arc::clone(&log);
        let fast_log = Arc::clone(&log);
        let mut registry = TaskRegistry::new();
        registry
            .register(Task::deferred("slow", move |_, _, done| {
                let log = Arc::clone(&slow_log);
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    log.lock().unwrap().push("slow");
                    done.succeed();
                });
            }))
            .unwrap();
        registry
            .register(Task::new("fast", move |_, _| {
                fast_log.lock().unwrap().push("fast");
                Ok(())
            }))
            .unwrap();

        let seq = Sequence::compose("s", &registry, &["slow", "fast"]).unwrap();
        seq.run(&mut context(), &reporter()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
    }

    #[test]
    fn test_task_count_and_names_flatten() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = instrumented(&["a", "b", "c"], "", &log);
        let inner = Arc::new(Sequence::compose("inner", &registry, &["b", "c"]).unwrap());
        let outer = Sequence::compose("outer", &registry, &["a"]).unwrap().then_sequence(inner);
        assert_eq!(outer.task_count(), 3);
        assert_eq!(outer.task_names(), vec!["a", "b", "c"]);
        assert_eq!(outer.steps().len(), 2);
    }

    #[test]
    fn test_empty_sequence_succeeds() {
        let report = Sequence::new("empty").run(&mut context(), &reporter()).unwrap();
        assert!(report.tasks.is_empty());
    }
}
