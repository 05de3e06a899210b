use blockshift_common::{BlockPos, BlockUri, EntityId};
use glam::Vec3;

/// Game clock in milliseconds. Monotonic and driven by the host, not wall time.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Block storage owned by the host world.
pub trait BlockWorld {
    /// Block type at `pos`. Unset positions read as air.
    fn block_at(&self, pos: BlockPos) -> BlockUri;

    /// Replace the block at `pos`. Visible to the next `block_at` call.
    fn set_block(&mut self, pos: BlockPos, block: &BlockUri);
}

/// Lookup of known block types.
pub trait BlockCatalog {
    /// Canonical block type for `uri`, or `None` when no such block exists.
    fn resolve(&self, uri: &BlockUri) -> Option<BlockUri>;
}

/// What a line-of-sight trace may collide with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionFilter {
    /// Only world blocks stop the ray.
    World,
    /// World blocks and mobile entities stop the ray.
    WorldAndEntities,
}

/// Occlusion queries.
pub trait Raycast {
    /// Entity owning the first thing hit by a ray from `origin` along
    /// `direction`, at most `max_distance` away. `None` when nothing is hit
    /// or the obstacle has no entity.
    fn trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: CollisionFilter,
    ) -> Option<EntityId>;
}

/// Uniform random numbers for the probability gate.
pub trait RandomSource {
    /// A float in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
}

/// Outbound notifications.
pub trait EventSink {
    /// A non-looping stage sequence reached its final stage.
    fn sequence_complete(&mut self, entity: EntityId, location: BlockPos);
}

/// The world-facing surface a trigger sweep needs: block reads and writes
/// plus occlusion tests against the same world.
pub trait WorldAdapter: BlockWorld + Raycast {}

impl<T: BlockWorld + Raycast + ?Sized> WorldAdapter for T {}
