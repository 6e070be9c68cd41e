//! Executor Registry - manages available execution backends

use crate::executor::Executor;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of execution backends, looked up by name
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register a backend under its own name
    pub fn register(&mut self, executor: Arc<dyn Executor>) {
        let name = executor.name();
        self.executors.insert(name.to_string(), executor);
    }

    /// Unregister a backend
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors.remove(name)
    }

    /// Get a backend by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors.get(name).cloned()
    }

    /// Get a backend by name, only if it is usable on this host
    pub fn get_available(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors
            .get(name)
            .filter(|e| e.is_available())
            .cloned()
    }

    /// Check if a backend exists
    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Get all backend names
    pub fn names(&self) -> Vec<&str> {
        self.executors.keys().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered backends
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ShellExecutor;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ExecutorRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(ShellExecutor::new()));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("shell"));
        assert!(registry.get("shell").is_some());
        assert!(registry.get("container").is_none());
    }

    #[test]
    fn test_get_available_filters_unusable_backends() {
        let mut registry = ExecutorRegistry::new();
        registry.register(Arc::new(ShellExecutor::new()));

        // The shell backend is always usable
        assert!(registry.get_available("shell").is_some());
        assert!(registry.get_available("missing").is_none());
    }

    #[test]
    fn test_unregister() {
        let mut registry = ExecutorRegistry::new();
        registry.register(Arc::new(ShellExecutor::new()));

        assert!(registry.unregister("shell").is_some());
        assert!(registry.unregister("shell").is_none());
        assert!(registry.is_empty());
    }
}
