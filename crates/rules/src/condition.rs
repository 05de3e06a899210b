use blockshift_common::{BlockUri, EntityCategory, Side, TriggerKey};
use serde::{Deserialize, Serialize};

/// Inclusive distance band a trigger must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    pub min: f32,
    pub max: f32,
}

impl DistanceRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.min && distance <= self.max
    }
}

/// Directional constraint of the Directed rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facing {
    /// Face of the holder block, relative to its own orientation, that must
    /// look at the trigger.
    pub side: Side,
    /// Half-angle in radians around the face normal. 0 means the trigger
    /// must sit exactly on the face axis; 1 covers everything the face sees.
    pub field_of_view: f32,
}

/// The four rule kinds and the fields only they carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleKind {
    BlockNearby {
        trigger: BlockUri,
        range: DistanceRange,
        /// Fire for any touching block regardless of `range`.
        adjacent: bool,
        ignore_occlusion: bool,
    },
    BlockDirected {
        trigger: BlockUri,
        range: DistanceRange,
        facing: Facing,
        ignore_occlusion: bool,
    },
    EntityNearby {
        trigger: EntityCategory,
        range: DistanceRange,
        ignore_occlusion: bool,
    },
    EntityDirected {
        trigger: EntityCategory,
        range: DistanceRange,
        facing: Facing,
        ignore_occlusion: bool,
    },
}

/// One conditional replacement: when the kind's gates pass and the dice
/// roll under `chance`, the holder block becomes `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub chance: f32,
    pub target: BlockUri,
    pub kind: RuleKind,
}

impl ConditionRule {
    /// Defaults of the Nearby kinds: touching-to-1.5 blocks away.
    pub const NEARBY_RANGE: DistanceRange = DistanceRange { min: 0.0, max: 1.5 };
    /// Defaults of the Directed kinds: touching-to-1 block away.
    pub const DIRECTED_RANGE: DistanceRange = DistanceRange { min: 0.0, max: 1.0 };

    pub fn block_nearby(trigger: impl Into<BlockUri>, target: impl Into<BlockUri>) -> Self {
        Self::new(
            target,
            RuleKind::BlockNearby {
                trigger: trigger.into(),
                range: Self::NEARBY_RANGE,
                adjacent: false,
                ignore_occlusion: false,
            },
        )
    }

    pub fn block_directed(
        trigger: impl Into<BlockUri>,
        side: Side,
        target: impl Into<BlockUri>,
    ) -> Self {
        Self::new(
            target,
            RuleKind::BlockDirected {
                trigger: trigger.into(),
                range: Self::DIRECTED_RANGE,
                facing: Facing {
                    side,
                    field_of_view: 0.0,
                },
                ignore_occlusion: false,
            },
        )
    }

    pub fn entity_nearby(trigger: EntityCategory, target: impl Into<BlockUri>) -> Self {
        Self::new(
            target,
            RuleKind::EntityNearby {
                trigger,
                range: Self::NEARBY_RANGE,
                ignore_occlusion: false,
            },
        )
    }

    pub fn entity_directed(
        trigger: EntityCategory,
        side: Side,
        target: impl Into<BlockUri>,
    ) -> Self {
        Self::new(
            target,
            RuleKind::EntityDirected {
                trigger,
                range: Self::DIRECTED_RANGE,
                facing: Facing {
                    side,
                    field_of_view: 0.0,
                },
                ignore_occlusion: false,
            },
        )
    }

    fn new(target: impl Into<BlockUri>, kind: RuleKind) -> Self {
        Self {
            chance: 1.0,
            target: target.into(),
            kind,
        }
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.chance = chance;
        self
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        *self.range_mut() = DistanceRange::new(min, max);
        self
    }

    /// Skip the line-of-sight check.
    pub fn through_walls(mut self) -> Self {
        match &mut self.kind {
            RuleKind::BlockNearby {
                ignore_occlusion, ..
            }
            | RuleKind::BlockDirected {
                ignore_occlusion, ..
            }
            | RuleKind::EntityNearby {
                ignore_occlusion, ..
            }
            | RuleKind::EntityDirected {
                ignore_occlusion, ..
            } => *ignore_occlusion = true,
        }
        self
    }

    /// Enable the adjacency fast path. Only meaningful for `BlockNearby`.
    pub fn adjacent(mut self) -> Self {
        if let RuleKind::BlockNearby { adjacent, .. } = &mut self.kind {
            *adjacent = true;
        }
        self
    }

    /// Set the field of view of a Directed rule.
    pub fn with_field_of_view(mut self, fov: f32) -> Self {
        if let RuleKind::BlockDirected { facing, .. } | RuleKind::EntityDirected { facing, .. } =
            &mut self.kind
        {
            facing.field_of_view = fov;
        }
        self
    }

    /// Registry key of the trigger this rule listens for.
    pub fn trigger_key(&self) -> TriggerKey {
        match &self.kind {
            RuleKind::BlockNearby { trigger, .. } | RuleKind::BlockDirected { trigger, .. } => {
                TriggerKey::Block(trigger.clone())
            }
            RuleKind::EntityNearby { trigger, .. } | RuleKind::EntityDirected { trigger, .. } => {
                TriggerKey::Entity(*trigger)
            }
        }
    }

    /// Whether this rule listens for `key`.
    pub fn listens_for(&self, key: &TriggerKey) -> bool {
        match (&self.kind, key) {
            (
                RuleKind::BlockNearby { trigger, .. } | RuleKind::BlockDirected { trigger, .. },
                TriggerKey::Block(uri),
            ) => trigger == uri,
            (
                RuleKind::EntityNearby { trigger, .. } | RuleKind::EntityDirected { trigger, .. },
                TriggerKey::Entity(category),
            ) => trigger == category,
            _ => false,
        }
    }

    pub fn is_block_rule(&self) -> bool {
        matches!(
            self.kind,
            RuleKind::BlockNearby { .. } | RuleKind::BlockDirected { .. }
        )
    }

    pub fn range(&self) -> DistanceRange {
        match &self.kind {
            RuleKind::BlockNearby { range, .. }
            | RuleKind::BlockDirected { range, .. }
            | RuleKind::EntityNearby { range, .. }
            | RuleKind::EntityDirected { range, .. } => *range,
        }
    }

    fn range_mut(&mut self) -> &mut DistanceRange {
        match &mut self.kind {
            RuleKind::BlockNearby { range, .. }
            | RuleKind::BlockDirected { range, .. }
            | RuleKind::EntityNearby { range, .. }
            | RuleKind::EntityDirected { range, .. } => range,
        }
    }

    pub fn ignores_occlusion(&self) -> bool {
        match &self.kind {
            RuleKind::BlockNearby {
                ignore_occlusion, ..
            }
            | RuleKind::BlockDirected {
                ignore_occlusion, ..
            }
            | RuleKind::EntityNearby {
                ignore_occlusion, ..
            }
            | RuleKind::EntityDirected {
                ignore_occlusion, ..
            } => *ignore_occlusion,
        }
    }

    /// Directional constraint, for the Directed kinds.
    pub fn facing(&self) -> Option<Facing> {
        match &self.kind {
            RuleKind::BlockDirected { facing, .. } | RuleKind::EntityDirected { facing, .. } => {
                Some(*facing)
            }
            _ => None,
        }
    }

    /// True for a `BlockNearby` rule with the adjacency fast path enabled.
    pub fn is_adjacent_only(&self) -> bool {
        matches!(self.kind, RuleKind::BlockNearby { adjacent: true, .. })
    }
}
