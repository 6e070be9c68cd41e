//! Terminal result store

use crate::task::AgentResult;
use std::collections::HashMap;

/// In-memory map from task id to terminal result.
///
/// Results are write-once: the first record wins and later writes for the
/// same id are rejected. The store is mutated only by the orchestrator
/// while it holds the registry lock, so it needs no synchronization of
/// its own.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: HashMap<String, AgentResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminal result; returns false if one already exists for
    /// the task id.
    pub fn record(&mut self, result: AgentResult) -> bool {
        if self.results.contains_key(&result.task_id) {
            return false;
        }
        self.results.insert(result.task_id.clone(), result);
        true
    }

    pub fn get(&self, task_id: &str) -> Option<&AgentResult> {
        self.results.get(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.results.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_record_is_write_once() {
        let mut store = ResultStore::new();
        let first = AgentResult::ok("t-1", "first", Duration::from_secs(1));
        let second = AgentResult::failed("t-1", "second", Duration::from_secs(2));

        assert!(store.record(first));
        assert!(!store.record(second));

        let kept = store.get("t-1").unwrap();
        assert!(kept.success);
        assert_eq!(kept.output, "first");
    }

    #[test]
    fn test_clear() {
        let mut store = ResultStore::new();
        store.record(AgentResult::ok("t-1", "", Duration::ZERO));
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
        assert!(store.get("t-1").is_none());
    }
}
