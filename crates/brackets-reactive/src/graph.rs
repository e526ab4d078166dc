//! Dependency graph: state name → root key → subscribed templates.

use crate::template::TemplateId;
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    states: IndexMap<String, IndexMap<String, IndexSet<TemplateId>>>,
}

impl DependencyGraph {
    /// Returns `false` if `id` was already subscribed to the key.
    pub(crate) fn subscribe(&mut self, state: &str, key: &str, id: TemplateId) -> bool {
        self.states
            .entry(state.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(id)
    }

    /// Subscribers of `state.key` in subscription order.
    pub(crate) fn subscribers<'a>(
        &'a self,
        state: &str,
        key: &str,
    ) -> impl Iterator<Item = TemplateId> + 'a {
        self.states
            .get(state)
            .and_then(|keys| keys.get(key))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Keys of `state` that have at least one subscriber.
    pub(crate) fn keys(&self, state: &str) -> Vec<String> {
        self.states
            .get(state)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every subscription of `id`.
    pub(crate) fn remove(&mut self, id: TemplateId) {
        for keys in self.states.values_mut() {
            keys.retain(|_, subscribers| {
                subscribers.shift_remove(&id);
                !subscribers.is_empty()
            });
        }
        self.states.retain(|_, keys| !keys.is_empty());
    }

    pub(crate) fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &DependencyGraph, state: &str, key: &str) -> Vec<u64> {
        graph.subscribers(state, key).map(TemplateId::as_u64).collect()
    }

    #[test]
    fn test_subscriptions_are_per_state_and_key() {
        let mut graph = DependencyGraph::default();
        assert!(graph.subscribe("default", "count", TemplateId::new(1)));
        assert!(graph.subscribe("default", "count", TemplateId::new(2)));
        assert!(!graph.subscribe("default", "count", TemplateId::new(1)));
        graph.subscribe("other", "count", TemplateId::new(3));

        assert_eq!(ids(&graph, "default", "count"), vec![1, 2]);
        assert_eq!(ids(&graph, "other", "count"), vec![3]);
        assert!(ids(&graph, "default", "missing").is_empty());
        assert!(ids(&graph, "missing", "count").is_empty());
    }

    #[test]
    fn test_remove_prunes_empty_entries() {
        let mut graph = DependencyGraph::default();
        graph.subscribe("s", "a", TemplateId::new(1));
        graph.subscribe("s", "b", TemplateId::new(1));
        graph.subscribe("s", "b", TemplateId::new(2));

        graph.remove(TemplateId::new(1));
        assert_eq!(graph.keys("s"), vec!["b"]);
        assert_eq!(ids(&graph, "s", "b"), vec![2]);

        graph.remove(TemplateId::new(2));
        assert!(graph.keys("s").is_empty());
    }
}
