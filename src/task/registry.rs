//! Named task storage.

use std::collections::HashMap;
use std::sync::Arc;

use super::{RegistryError, Task};

/// Registry mapping unique names to tasks.
///
/// Names are kept in registration order for listing.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<Task>>,
    order: Vec<String>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its name.
    pub fn register(&mut self, task: Task) -> Result<(), RegistryError> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        tracing::trace!(task = %name, "registered task");
        self.order.push(name.clone());
        self.tasks.insert(name, Arc::new(task));
        Ok(())
    }

    /// Look up a task by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Task>, RegistryError> {
        self.tasks.get(name).cloned().ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Whether a task with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Task {
        Task::new(name, |_, _| Ok(()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TaskRegistry::new();
        registry.register(noop("clean")).unwrap();
        registry.register(noop("copy")).unwrap();

        assert_eq!(registry.lookup("copy").unwrap().name(), "copy");
        assert!(registry.contains("clean"));
        assert_eq!(registry.names(), &["clean".to_string(), "copy".to_string()]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register(noop("clean")).unwrap();
        let err = registry.register(noop("clean")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("clean".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.lookup("deploy").unwrap_err(),
            RegistryError::NotFound("deploy".to_string())
        );
    }
}
