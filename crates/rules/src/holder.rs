use crate::ConditionRule;
use blockshift_common::{BlockPos, EntityId, Side, TriggerKey};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A block entity carrying conditional rules, anchored at its block position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHolder {
    pub entity: EntityId,
    pub anchor: BlockPos,
    /// Direction the holder block's front points in world space.
    pub facing: Side,
    pub rules: Vec<ConditionRule>,
}

impl RuleHolder {
    /// Create a holder whose front faces [`Side::Front`].
    pub fn new(entity: EntityId, anchor: BlockPos, rules: Vec<ConditionRule>) -> Self {
        Self {
            entity,
            anchor,
            facing: Side::Front,
            rules,
        }
    }

    /// Set the world direction the holder block's front points in.
    pub fn with_facing(mut self, facing: Side) -> Self {
        self.facing = facing;
        self
    }

    /// Block center of the anchor, the origin of every distance check.
    pub fn anchor_point(&self) -> Vec3 {
        self.anchor.as_vec3()
    }

    /// Distinct trigger keys named by the rules, in rule order.
    pub fn trigger_keys(&self) -> Vec<TriggerKey> {
        let mut keys: Vec<TriggerKey> = Vec::new();
        for rule in &self.rules {
            let key = rule.trigger_key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Rule holders keyed by entity. BTreeMap for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct HolderStore {
    holders: BTreeMap<EntityId, RuleHolder>,
}

impl HolderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a holder. Returns the previous one.
    pub fn insert(&mut self, holder: RuleHolder) -> Option<RuleHolder> {
        self.holders.insert(holder.entity, holder)
    }

    /// Remove the holder of an entity. Returns it if there was one.
    pub fn remove(&mut self, entity: EntityId) -> Option<RuleHolder> {
        self.holders.remove(&entity)
    }

    /// Look up the holder of an entity.
    pub fn get(&self, entity: EntityId) -> Option<&RuleHolder> {
        self.holders.get(&entity)
    }

    /// Whether an entity currently holds rules.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.holders.contains_key(&entity)
    }

    /// Number of holders.
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Holders in entity-id order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleHolder> {
        self.holders.values()
    }

    /// Drop every holder.
    pub fn clear(&mut self) {
        self.holders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockshift_common::EntityCategory;
    use glam::IVec3;

    #[test]
    fn trigger_keys_are_distinct_and_ordered() {
        let holder = RuleHolder::new(
            EntityId::new(),
            IVec3::ZERO,
            vec![
                ConditionRule::block_nearby("core:water", "core:mud"),
                ConditionRule::entity_nearby(EntityCategory::Player, "core:trampled"),
                ConditionRule::block_directed("CORE:WATER", Side::Top, "core:wet"),
            ],
        );
        assert_eq!(
            holder.trigger_keys(),
            vec![
                TriggerKey::Block("core:water".into()),
                TriggerKey::Entity(EntityCategory::Player),
            ]
        );
    }

    #[test]
    fn anchor_point_is_block_center() {
        let holder = RuleHolder::new(EntityId::new(), IVec3::new(1, -2, 3), Vec::new());
        assert_eq!(holder.anchor_point(), Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(holder.facing, Side::Front);
    }

    #[test]
    fn store_insert_replace_remove() {
        let mut store = HolderStore::new();
        let id = EntityId::new();
        assert!(store.insert(RuleHolder::new(id, IVec3::ZERO, Vec::new())).is_none());
        assert!(store.insert(RuleHolder::new(id, IVec3::ONE, Vec::new())).is_some());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).map(|h| h.anchor), Some(IVec3::ONE));
        assert!(store.remove(id).is_some());
        assert!(store.is_empty());
    }
}
