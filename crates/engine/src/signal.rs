use blockshift_animate::StageSequence;
use blockshift_common::{BlockPos, BlockUri, EntityCategory, EntityId};
use blockshift_kernel::WorldEvent;
use blockshift_rules::RuleHolder;
use glam::Vec3;

/// Something the host world reports to a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq)]
pub enum WorldSignal {
    /// A block entity gained conditional rules. Replaces any holder already
    /// registered for the same entity.
    HolderSpawned(RuleHolder),
    /// A block entity lost its conditional rules.
    HolderRemoved(EntityId),
    /// A block entity gained a stage sequence.
    SequenceSpawned {
        entity: EntityId,
        location: BlockPos,
        sequence: StageSequence,
    },
    /// A block entity lost its stage sequence.
    SequenceRemoved(EntityId),
    /// A block entity was destroyed: drops its rules and its sequence.
    EntityRemoved(EntityId),
    /// A mobile entity appeared or moved.
    EntityMoved {
        entity: EntityId,
        category: EntityCategory,
        position: Vec3,
    },
    /// A block was placed or replaced.
    BlockChanged {
        entity: Option<EntityId>,
        pos: BlockPos,
        block: BlockUri,
    },
    /// Game time advanced.
    Tick,
}

impl WorldSignal {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HolderSpawned(_) => "holder_spawned",
            Self::HolderRemoved(_) => "holder_removed",
            Self::SequenceSpawned { .. } => "sequence_spawned",
            Self::SequenceRemoved(_) => "sequence_removed",
            Self::EntityRemoved(_) => "entity_removed",
            Self::EntityMoved { .. } => "entity_moved",
            Self::BlockChanged { .. } => "block_changed",
            Self::Tick => "tick",
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::HolderRemoved(_) | Self::SequenceRemoved(_) | Self::EntityRemoved(_)
        )
    }

    /// Translate a world log record. Despawned mobile entities carry no
    /// behaviour, so they map to nothing.
    pub fn from_world_event(event: WorldEvent) -> Option<Self> {
        match event {
            WorldEvent::BlockChanged {
                pos, new, entity, ..
            } => Some(Self::BlockChanged {
                entity,
                pos,
                block: new,
            }),
            WorldEvent::EntityMoved {
                id,
                category,
                position,
            } => Some(Self::EntityMoved {
                entity: id,
                category,
                position,
            }),
            WorldEvent::EntityDespawned { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_change_maps_to_new_block() {
        let entity = EntityId::new();
        let signal = WorldSignal::from_world_event(WorldEvent::BlockChanged {
            pos: BlockPos::new(1, 2, 3),
            old: BlockUri::air(),
            new: BlockUri::new("core:water"),
            entity: Some(entity),
        });
        assert_eq!(
            signal,
            Some(WorldSignal::BlockChanged {
                entity: Some(entity),
                pos: BlockPos::new(1, 2, 3),
                block: BlockUri::new("core:water"),
            })
        );
    }

    #[test]
    fn despawn_maps_to_nothing() {
        let event = WorldEvent::EntityDespawned { id: EntityId::new() };
        assert_eq!(WorldSignal::from_world_event(event), None);
    }

    #[test]
    fn removals_are_flagged() {
        let id = EntityId::new();
        assert!(WorldSignal::EntityRemoved(id).is_removal());
        assert!(WorldSignal::HolderRemoved(id).is_removal());
        assert!(WorldSignal::SequenceRemoved(id).is_removal());
        assert!(!WorldSignal::Tick.is_removal());
        assert_eq!(WorldSignal::Tick.kind(), "tick");
    }
}
