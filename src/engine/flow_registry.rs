//! Flow registry: lazy creation, lookup and teardown of flows by key.
//!
//! Backed by a `DashMap` so get-or-create is atomic per key; at most one
//! live flow ever exists for a given key.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::flow::Flow;

pub struct FlowRegistry {
    flows: DashMap<String, Arc<Flow>>,
    channel_capacity: usize,
}

impl FlowRegistry {
    pub(crate) fn new(channel_capacity: usize) -> Self {
        Self {
            flows: DashMap::new(),
            channel_capacity,
        }
    }

    /// Return the flow for `key`, creating it under `root_token` on first
    /// reference. Concurrent calls for the same key observe one instance.
    pub(crate) fn get_or_create(&self, root_token: &CancellationToken, key: &str) -> Arc<Flow> {
        self.flows
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(flow_key = key, "flow created");
                Arc::new(Flow::new(root_token, key, self.channel_capacity))
            })
            .clone()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<Flow>> {
        self.flows.get(key).map(|entry| entry.value().clone())
    }

    /// Stop and evict the flow for `key`; no-op when absent.
    pub(crate) fn delete(&self, key: &str) {
        if let Some((_, flow)) = self.flows.remove(key) {
            flow.stop();
        }
    }

    /// Sum of live task counts across all flows.
    pub fn total_active_tasks(&self) -> usize {
        self.flows
            .iter()
            .map(|entry| entry.value().group().live_count())
            .sum()
    }

    /// Stop every flow and reset the registry. Full-teardown path only.
    pub(crate) fn cancel_all(&self) {
        for entry in self.flows.iter() {
            entry.value().stop();
        }
        self.flows.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.flows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{Message, Method};

    fn message(flow_key: &str, task_key: &str) -> Message {
        Message {
            flow_key: flow_key.to_string(),
            method: Method(1),
            task_key: task_key.to_string(),
            payload: String::new(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let root = CancellationToken::new();
        let registry = FlowRegistry::new(1);

        let first = registry.get_or_create(&root, "f1");
        let second = registry.get_or_create(&root, "f1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let registry = FlowRegistry::new(1);
        assert!(registry.get("absent").is_none());
    }

    #[tokio::test]
    async fn test_delete_stops_flow() {
        let root = CancellationToken::new();
        let registry = FlowRegistry::new(1);

        let flow = registry.get_or_create(&root, "f1");
        let (task, _rx) = flow.group().register(message("f1", "t1"));

        registry.delete("f1");

        assert!(registry.get("f1").is_none());
        assert!(flow.is_stopped());
        assert!(task.is_cancelled());

        // Absent key: silent no-op.
        registry.delete("f1");
    }

    #[tokio::test]
    async fn test_total_active_tasks_sums_flows() {
        let root = CancellationToken::new();
        let registry = FlowRegistry::new(1);

        let f1 = registry.get_or_create(&root, "f1");
        let f2 = registry.get_or_create(&root, "f2");
        let (_t1, _rx1) = f1.group().register(message("f1", "t1"));
        let (_t2, _rx2) = f2.group().register(message("f2", "t1"));
        let (_t3, _rx3) = f2.group().register(message("f2", "t2"));

        assert_eq!(registry.total_active_tasks(), 3);

        registry.delete("f2");
        assert_eq!(registry.total_active_tasks(), 1);
    }

    #[tokio::test]
    async fn test_cancel_all_resets_registry() {
        let root = CancellationToken::new();
        let registry = FlowRegistry::new(1);

        let f1 = registry.get_or_create(&root, "f1");
        let f2 = registry.get_or_create(&root, "f2");

        registry.cancel_all();

        assert!(registry.is_empty());
        assert!(f1.is_stopped());
        assert!(f2.is_stopped());
    }
}
