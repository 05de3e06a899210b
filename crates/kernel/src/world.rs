use crate::{BlockWorld, CollisionFilter, Raycast};
use blockshift_common::{BlockPos, BlockUri, EntityCategory, EntityId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distance the occlusion ray advances per sample.
const RAY_STEP: f32 = 0.05;
/// Mobile entities are treated as spheres of this radius when traced.
const MOVER_RADIUS: f32 = 0.5;

/// An event record produced by every mutation to the world.
///
/// Hosts drain these and feed them back to the engine as signals, which is
/// how one block replacement can trigger further rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A block was replaced.
    BlockChanged {
        pos: BlockPos,
        old: BlockUri,
        new: BlockUri,
        /// Entity attached to the block position, if any.
        entity: Option<EntityId>,
    },
    /// A mobile entity appeared or moved.
    EntityMoved {
        id: EntityId,
        category: EntityCategory,
        position: Vec3,
    },
    /// A mobile entity was removed.
    EntityDespawned { id: EntityId },
}

/// A mobile entity tracked for occlusion tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub category: EntityCategory,
    pub position: Vec3,
}

/// In-memory voxel world.
///
/// Blocks are stored at integer positions with block centers at those
/// positions. Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxelWorld {
    blocks: BTreeMap<[i32; 3], BlockUri>,
    block_entities: BTreeMap<[i32; 3], EntityId>,
    movers: BTreeMap<EntityId, Mover>,
    /// Append-only event log of all mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl VoxelWorld {
    /// Create an empty world: every position reads as air.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-air blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Non-air blocks in canonical position order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockPos, &BlockUri)> {
        self.blocks
            .iter()
            .map(|(p, b)| (BlockPos::from_array(*p), b))
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Attach an entity to a block position (a block with behaviour).
    pub fn attach_entity(&mut self, pos: BlockPos, id: EntityId) {
        self.block_entities.insert(pos.to_array(), id);
    }

    /// Detach whatever entity is attached at `pos`.
    pub fn detach_entity(&mut self, pos: BlockPos) -> Option<EntityId> {
        self.block_entities.remove(&pos.to_array())
    }

    /// Block entity attached at `pos`, if any.
    pub fn entity_at(&self, pos: BlockPos) -> Option<EntityId> {
        self.block_entities.get(&pos.to_array()).copied()
    }

    /// Place or move a mobile entity and log the move.
    pub fn move_entity(&mut self, id: EntityId, category: EntityCategory, position: Vec3) {
        self.movers.insert(id, Mover { category, position });
        self.event_log.push(WorldEvent::EntityMoved {
            id,
            category,
            position,
        });
    }

    /// Remove a mobile entity. Returns its last state if it existed.
    pub fn despawn_entity(&mut self, id: EntityId) -> Option<Mover> {
        let mover = self.movers.remove(&id);
        if mover.is_some() {
            self.event_log.push(WorldEvent::EntityDespawned { id });
        }
        mover
    }

    /// Current state of a mobile entity.
    pub fn mover(&self, id: EntityId) -> Option<&Mover> {
        self.movers.get(&id)
    }

    /// Deterministic hash of the block layout, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for (pos, block) in &self.blocks {
            for c in pos {
                mix(&mut h, &c.to_le_bytes());
            }
            mix(&mut h, block.as_str().as_bytes());
        }
        h
    }

    fn mover_hit(&self, point: Vec3) -> Option<EntityId> {
        self.movers
            .iter()
            .find(|(_, m)| m.position.distance(point) <= MOVER_RADIUS)
            .map(|(id, _)| *id)
    }
}

impl BlockWorld for VoxelWorld {
    fn block_at(&self, pos: BlockPos) -> BlockUri {
        self.blocks
            .get(&pos.to_array())
            .cloned()
            .unwrap_or_else(BlockUri::air)
    }

    fn set_block(&mut self, pos: BlockPos, block: &BlockUri) {
        let key = pos.to_array();
        let previous = if block.is_air() {
            self.blocks.remove(&key)
        } else {
            self.blocks.insert(key, block.clone())
        };
        let old = previous.unwrap_or_else(BlockUri::air);
        self.event_log.push(WorldEvent::BlockChanged {
            pos,
            old,
            new: block.clone(),
            entity: self.block_entities.get(&key).copied(),
        });
    }
}

impl Raycast for VoxelWorld {
    /// Marches the ray in fixed steps. The block cell containing `origin` is
    /// never an obstacle, so a block can see out of itself.
    fn trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: CollisionFilter,
    ) -> Option<EntityId> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let origin_cell = origin.round().as_ivec3();
        let mut travelled = RAY_STEP;
        while travelled <= max_distance {
            let point = origin + dir * travelled;
            if filter == CollisionFilter::WorldAndEntities {
                if let Some(id) = self.mover_hit(point) {
                    return Some(id);
                }
            }
            let cell = point.round().as_ivec3();
            if cell != origin_cell && self.blocks.contains_key(&cell.to_array()) {
                return self.entity_at(cell);
            }
            travelled += RAY_STEP;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    #[test]
    fn world_starts_empty() {
        let w = VoxelWorld::new();
        assert_eq!(w.block_count(), 0);
        assert!(w.block_at(IVec3::ZERO).is_air());
    }

    #[test]
    fn writes_are_immediately_visible() {
        let mut w = VoxelWorld::new();
        w.set_block(IVec3::new(1, 2, 3), &"core:stone".into());
        assert_eq!(w.block_at(IVec3::new(1, 2, 3)), BlockUri::new("core:stone"));
        w.set_block(IVec3::new(1, 2, 3), &BlockUri::air());
        assert_eq!(w.block_count(), 0);
    }

    #[test]
    fn block_changes_are_logged() {
        let mut w = VoxelWorld::new();
        let id = EntityId::new();
        w.attach_entity(IVec3::ZERO, id);
        w.set_block(IVec3::ZERO, &"core:dirt".into());
        w.set_block(IVec3::ZERO, &"core:grass".into());
        let events = w.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            WorldEvent::BlockChanged {
                pos: IVec3::ZERO,
                old: "core:dirt".into(),
                new: "core:grass".into(),
                entity: Some(id),
            }
        );
        assert!(w.events().is_empty());
    }

    #[test]
    fn trace_hits_block_entity() {
        let mut w = VoxelWorld::new();
        let target = EntityId::new();
        w.set_block(IVec3::new(0, 0, 3), &"core:water".into());
        w.attach_entity(IVec3::new(0, 0, 3), target);
        let hit = w.trace(Vec3::ZERO, Vec3::Z, 5.0, CollisionFilter::World);
        assert_eq!(hit, Some(target));
    }

    #[test]
    fn trace_is_blocked_by_plain_block() {
        let mut w = VoxelWorld::new();
        let target = EntityId::new();
        w.set_block(IVec3::new(0, 0, 1), &"core:stone".into());
        w.set_block(IVec3::new(0, 0, 3), &"core:water".into());
        w.attach_entity(IVec3::new(0, 0, 3), target);
        assert_eq!(w.trace(Vec3::ZERO, Vec3::Z, 5.0, CollisionFilter::World), None);
    }

    #[test]
    fn trace_ignores_origin_cell_and_respects_range() {
        let mut w = VoxelWorld::new();
        let target = EntityId::new();
        w.set_block(IVec3::ZERO, &"core:sapling".into());
        w.set_block(IVec3::new(4, 0, 0), &"core:water".into());
        w.attach_entity(IVec3::new(4, 0, 0), target);
        assert_eq!(w.trace(Vec3::ZERO, Vec3::X, 5.0, CollisionFilter::World), Some(target));
        assert_eq!(w.trace(Vec3::ZERO, Vec3::X, 2.0, CollisionFilter::World), None);
    }

    #[test]
    fn trace_sees_movers_only_with_entity_filter() {
        let mut w = VoxelWorld::new();
        let player = EntityId::new();
        w.move_entity(player, EntityCategory::Player, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(
            w.trace(Vec3::ZERO, Vec3::Y, 3.0, CollisionFilter::WorldAndEntities),
            Some(player)
        );
        assert_eq!(w.trace(Vec3::ZERO, Vec3::Y, 3.0, CollisionFilter::World), None);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut w1 = VoxelWorld::new();
        let mut w2 = VoxelWorld::new();
        for w in [&mut w1, &mut w2] {
            w.set_block(IVec3::new(1, 0, 0), &"core:stone".into());
            w.set_block(IVec3::new(0, 1, 0), &"core:dirt".into());
        }
        assert_eq!(w1.state_hash(), w2.state_hash());
        w2.set_block(IVec3::new(0, 1, 0), &"core:grass".into());
        assert_ne!(w1.state_hash(), w2.state_hash());
    }
}
