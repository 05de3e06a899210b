use crate::RuleHolder;
use blockshift_common::{EntityId, TriggerKey};
use std::collections::BTreeMap;

/// Index from trigger key to the holders whose rules listen for it.
///
/// Owned by one world session; created empty at session start and cleared
/// at teardown. Per-key lists keep registration order.
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    subscribers: BTreeMap<TriggerKey, Vec<EntityId>>,
}

impl TriggerRegistry {
    /// Create an empty registry, one per session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `holder` to the list for `key`, creating the list on first use.
    /// Returns false, leaving the list untouched, if the holder is already
    /// subscribed under that key.
    pub fn register(&mut self, key: impl Into<TriggerKey>, holder: EntityId) -> bool {
        let list = self.subscribers.entry(key.into()).or_default();
        if list.contains(&holder) {
            return false;
        }
        list.push(holder);
        true
    }

    /// Subscribe a holder under every key its rules name. Returns how many
    /// keys it was newly added to.
    pub fn register_holder(&mut self, holder: &RuleHolder) -> usize {
        holder
            .trigger_keys()
            .into_iter()
            .filter(|key| self.register(key.clone(), holder.entity))
            .count()
    }

    /// Remove `holder` from every list. Lists left empty are dropped.
    /// Returns how many lists it was removed from.
    pub fn unregister(&mut self, holder: EntityId) -> usize {
        let mut removed = 0;
        self.subscribers.retain(|_, list| {
            let before = list.len();
            list.retain(|h| *h != holder);
            removed += before - list.len();
            !list.is_empty()
        });
        removed
    }

    /// Holders subscribed to `key`, in registration order. Empty if unknown.
    pub fn lookup(&self, key: &TriggerKey) -> &[EntityId] {
        self.subscribers.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any holder listens for `key`.
    pub fn contains_key(&self, key: &TriggerKey) -> bool {
        self.subscribers.contains_key(key)
    }

    /// Number of distinct trigger keys with at least one subscriber.
    pub fn key_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total subscriptions across all keys.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }

    /// Subscribed keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &TriggerKey> {
        self.subscribers.keys()
    }

    /// Drop every subscription, logging how many holders each key still had.
    pub fn clear(&mut self) -> Vec<(TriggerKey, usize)> {
        let report: Vec<(TriggerKey, usize)> = std::mem::take(&mut self.subscribers)
            .into_iter()
            .map(|(key, list)| (key, list.len()))
            .collect();
        for (key, count) in &report {
            tracing::info!(%key, count, "clearing trigger subscribers");
        }
        report
    }
}
