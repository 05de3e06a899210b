use crate::StageSequence;
use blockshift_common::{BlockPos, EntityId};
use blockshift_kernel::{BlockCatalog, BlockWorld, Clock, EventSink};
use std::collections::BTreeMap;

/// Animator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorConfig {
    /// Minimum game time between two sweeps of [`SequenceAnimator::update`].
    pub check_interval_ms: u64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
        }
    }
}

/// A block entity with a stage sequence attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedBlock {
    pub entity: EntityId,
    pub location: BlockPos,
    pub sequence: StageSequence,
}

/// Counters from one poll sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub entities: usize,
    pub skipped_stopped: usize,
    pub timers_started: usize,
    pub transitions: usize,
    pub completed: usize,
    /// Entities whose current block is not one of their stages.
    pub off_sequence: usize,
    /// Stages naming a block the catalog cannot resolve.
    pub unresolved: usize,
}

/// Advances every attached stage sequence whose dwell time has elapsed.
#[derive(Debug, Clone, Default)]
pub struct SequenceAnimator {
    config: AnimatorConfig,
    entities: BTreeMap<EntityId, AnimatedBlock>,
    last_check: u64,
    sweeps: u64,
}

impl SequenceAnimator {
    /// Create an animator with no tracked entities. The first sweep may run
    /// once the clock passes `check_interval_ms`.
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Throttle settings this animator was built with.
    pub fn config(&self) -> AnimatorConfig {
        self.config
    }

    /// Track an entity as-is. A sequence with an unset timer starts its
    /// timer on the first poll instead of transitioning.
    pub fn insert(&mut self, entity: EntityId, location: BlockPos, sequence: StageSequence) {
        self.entities.insert(
            entity,
            AnimatedBlock {
                entity,
                location,
                sequence,
            },
        );
    }

    /// Track a freshly spawned entity: its timer starts now, with the dwell
    /// time of whatever stage the block at `location` is in.
    pub fn attach<W: BlockWorld + ?Sized>(
        &mut self,
        entity: EntityId,
        location: BlockPos,
        mut sequence: StageSequence,
        now: u64,
        world: &W,
    ) {
        let current = world.block_at(location);
        let dwell = sequence.dwell_for(&current).unwrap_or_else(|| {
            tracing::warn!(%entity, block = %current, "spawned on a block outside its sequence");
            0
        });
        sequence.start_timer(now, dwell);
        self.insert(entity, location, sequence);
    }

    /// Stop tracking an entity. Returns its last state, stopped or not.
    pub fn detach(&mut self, entity: EntityId) -> Option<AnimatedBlock> {
        self.entities.remove(&entity)
    }

    /// Look up the sequence state of a tracked entity.
    pub fn get(&self, entity: EntityId) -> Option<&AnimatedBlock> {
        self.entities.get(&entity)
    }

    /// Mutable lookup, e.g. to [`StageSequence::reset`] a finished sequence.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut AnimatedBlock> {
        self.entities.get_mut(&entity)
    }

    /// Number of tracked entities, stopped ones included.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is tracked.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Tracked entities in entity-id order, the order sweeps visit them.
    pub fn iter(&self) -> impl Iterator<Item = &AnimatedBlock> {
        self.entities.values()
    }

    /// Number of tracked non-looping sequences that have completed.
    pub fn stopped_count(&self) -> usize {
        self.entities
            .values()
            .filter(|a| a.sequence.is_stopped())
            .count()
    }

    /// Sweeps run so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Per-tick entry point: sweeps only when more than the check interval
    /// has passed since the previous sweep.
    pub fn update<W: BlockWorld + ?Sized>(
        &mut self,
        clock: &dyn Clock,
        world: &mut W,
        catalog: &dyn BlockCatalog,
        sink: &mut dyn EventSink,
    ) -> Option<PollStats> {
        let now = clock.now_millis();
        if self.last_check.saturating_add(self.config.check_interval_ms) >= now {
            return None;
        }
        let stats = self.poll(now, world, catalog, sink);
        self.last_check = now;
        Some(stats)
    }

    /// One unconditional sweep over every tracked entity.
    pub fn poll<W: BlockWorld + ?Sized>(
        &mut self,
        now: u64,
        world: &mut W,
        catalog: &dyn BlockCatalog,
        sink: &mut dyn EventSink,
    ) -> PollStats {
        let _span = tracing::info_span!("animator_poll", now).entered();
        let mut stats = PollStats::default();
        for animated in self.entities.values_mut() {
            stats.entities += 1;
            poll_one(animated, now, world, catalog, sink, &mut stats);
        }
        self.sweeps += 1;
        tracing::trace!(?stats, "animator poll complete");
        stats
    }
}

fn poll_one<W: BlockWorld + ?Sized>(
    animated: &mut AnimatedBlock,
    now: u64,
    world: &mut W,
    catalog: &dyn BlockCatalog,
    sink: &mut dyn EventSink,
    stats: &mut PollStats,
) {
    let AnimatedBlock {
        entity,
        location,
        sequence,
    } = animated;

    if sequence.is_stopped() {
        stats.skipped_stopped += 1;
        return;
    }
    if sequence.last_polled().is_none() {
        let current = world.block_at(*location);
        let dwell = sequence.dwell_for(&current).unwrap_or(0);
        sequence.start_timer(now, dwell);
        stats.timers_started += 1;
        return;
    }
    if !sequence.is_due(now) {
        return;
    }
    sequence.touch(now);

    let current = world.block_at(*location);
    let Some(index) = sequence.index_of(&current) else {
        tracing::debug!(%entity, block = %current, "block is not part of its sequence");
        stats.off_sequence += 1;
        return;
    };
    let last = sequence.len() - 1;

    let next = if index < last {
        index + 1
    } else if sequence.loops() && last > 0 {
        0
    } else {
        return;
    };
    if next == last && !sequence.loops() {
        sequence.stop();
        stats.completed += 1;
        sink.sequence_complete(*entity, *location);
    }

    let Some(stage) = sequence.stage(next).cloned() else {
        return;
    };
    match catalog.resolve(&stage.block) {
        Some(block) => {
            tracing::debug!(%entity, pos = ?location, %block, "stage transition");
            world.set_block(*location, &block);
            sequence.set_dwell(stage.dwell_ms);
            stats.transitions += 1;
        }
        None => {
            tracing::warn!(%entity, block = %stage.block, "stage block is not a known block");
            stats.unresolved += 1;
        }
    }
}
