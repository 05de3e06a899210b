use crate::{ConditionRule, HolderStore, RuleHolder, TriggerRegistry};
use blockshift_common::geometry::{distance, is_within_fov, side_facing};
use blockshift_common::{BlockPos, BlockUri, EntityId, TriggerKey};
use blockshift_kernel::{
    BlockCatalog, BlockWorld, CollisionFilter, RandomSource, Raycast, WorldAdapter,
};
use glam::Vec3;

/// Below this distance a `BlockNearby` rule with `adjacent` set takes the
/// fast path.
pub const ADJACENT_DISTANCE: f32 = 2.0;

/// Something appeared or moved and may set off rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Entity that caused the trigger: the changed block's entity or the
    /// moving entity. Occlusion checks must see this entity, so a trigger
    /// without one only fires rules that ignore occlusion.
    pub cause: Option<EntityId>,
    pub position: Vec3,
    pub key: TriggerKey,
}

impl Trigger {
    pub fn new(
        cause: impl Into<Option<EntityId>>,
        position: Vec3,
        key: impl Into<TriggerKey>,
    ) -> Self {
        Self {
            cause: cause.into(),
            position,
            key: key.into(),
        }
    }

    pub fn is_block_trigger(&self) -> bool {
        self.key.is_block()
    }
}

/// A rule that passed every gate and replaced its holder's block.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFired {
    pub holder: EntityId,
    pub rule_index: usize,
    pub pos: BlockPos,
    pub block: BlockUri,
}

/// Outcome of one evaluation sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub holders_checked: usize,
    pub rules_checked: usize,
    pub fired: Vec<RuleFired>,
    /// Rules that passed their gates but named a block the catalog lacks.
    pub unresolved: usize,
}

/// Runs the gate chain of every rule subscribed to a trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every holder subscribed to `trigger.key`.
    ///
    /// Writes happen immediately through `world`, so a later rule in the same
    /// sweep reads the replaced block. Multiple firing rules on one holder
    /// each write; the last one wins.
    pub fn evaluate(
        &self,
        registry: &TriggerRegistry,
        holders: &HolderStore,
        trigger: &Trigger,
        world: &mut dyn WorldAdapter,
        catalog: &dyn BlockCatalog,
        random: &mut dyn RandomSource,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        let subscribers = registry.lookup(&trigger.key);
        if subscribers.is_empty() {
            return report;
        }
        let _span = tracing::info_span!("trigger_sweep", key = %trigger.key).entered();

        for id in subscribers {
            let Some(holder) = holders.get(*id) else {
                tracing::trace!(holder = %id, "subscriber has no rule holder");
                continue;
            };
            report.holders_checked += 1;
            for (index, rule) in holder.rules.iter().enumerate() {
                if rule.is_block_rule() != trigger.is_block_trigger()
                    || !rule.listens_for(&trigger.key)
                {
                    continue;
                }
                report.rules_checked += 1;
                if !self.passes_gates(holder, rule, trigger, world, random) {
                    continue;
                }
                let Some(block) = catalog.resolve(&rule.target) else {
                    tracing::warn!(
                        holder = %holder.entity,
                        target = %rule.target,
                        "rule target is not a known block"
                    );
                    report.unresolved += 1;
                    continue;
                };
                tracing::debug!(
                    holder = %holder.entity,
                    pos = ?holder.anchor,
                    %block,
                    "rule fired"
                );
                world.set_block(holder.anchor, &block);
                report.fired.push(RuleFired {
                    holder: holder.entity,
                    rule_index: index,
                    pos: holder.anchor,
                    block,
                });
            }
        }
        report
    }

    /// Range, direction, occlusion and probability gates, in that order.
    /// The dice are rolled only once everything else has passed.
    fn passes_gates(
        &self,
        holder: &RuleHolder,
        rule: &ConditionRule,
        trigger: &Trigger,
        world: &dyn WorldAdapter,
        random: &mut dyn RandomSource,
    ) -> bool {
        let origin = holder.anchor_point();
        let dist = distance(origin, trigger.position);

        if rule.is_adjacent_only() && dist < ADJACENT_DISTANCE {
            return roll(rule, random);
        }

        let range = rule.range();
        if !range.contains(dist) {
            tracing::trace!(holder = %holder.entity, dist, "out of range");
            return false;
        }

        let offset = trigger.position - origin;
        if let Some(facing) = rule.facing() {
            let side = facing.side.relative_to(holder.facing);
            if side_facing(offset) != side
                || !is_within_fov(offset, side.vector(), facing.field_of_view)
            {
                tracing::trace!(holder = %holder.entity, ?side, "wrong side");
                return false;
            }
        }

        if !rule.ignores_occlusion() {
            let filter = if trigger.is_block_trigger() {
                CollisionFilter::World
            } else {
                CollisionFilter::WorldAndEntities
            };
            let seen = match trigger.cause {
                Some(cause) => world.trace(origin, offset, range.max, filter) == Some(cause),
                None => false,
            };
            if !seen {
                tracing::trace!(holder = %holder.entity, "line of sight blocked");
                return false;
            }
        }

        roll(rule, random)
    }
}

fn roll(rule: &ConditionRule, random: &mut dyn RandomSource) -> bool {
    rule.chance >= random.next_f32()
}
