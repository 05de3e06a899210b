use crate::{SessionError, SessionSummary, WorldSignal};
use blockshift_animate::{AnimatorConfig, PollStats, SequenceAnimator, StageSequence};
use blockshift_common::{BlockPos, EntityId, Side, TriggerKey};
use blockshift_config::{ConfigError, Definitions, SessionConfig};
use blockshift_kernel::{BlockCatalog, BlockWorld, Clock, EventSink, SeededRandom, WorldAdapter};
use blockshift_rules::{
    HolderStore, RuleEvaluator, RuleHolder, SweepReport, Trigger, TriggerRegistry,
};

/// Collaborators a session borrows while it handles a signal.
pub struct Host<'a> {
    pub world: &'a mut dyn WorldAdapter,
    pub catalog: &'a dyn BlockCatalog,
    pub clock: &'a dyn Clock,
    pub sink: &'a mut dyn EventSink,
}

/// What handling one signal did.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// A holder was registered under `keys` trigger keys.
    Registered { entity: EntityId, keys: usize },
    /// A stage sequence was attached.
    Attached { entity: EntityId },
    /// Rules and, for a destroyed entity, its sequence were dropped.
    Removed {
        entity: EntityId,
        keys: usize,
        animated: bool,
    },
    /// A trigger ran a sweep over its subscribers.
    Swept(SweepReport),
    /// The animator ran a sweep.
    Polled(PollStats),
    /// The animator skipped this tick.
    Throttled,
    /// Nobody listens to the signal's trigger key.
    Ignored,
}

/// What [`Session::spawn_block`] set up for a block entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub keys: usize,
    pub animated: bool,
}

/// One running instance of both engines.
pub struct Session {
    config: SessionConfig,
    registry: TriggerRegistry,
    holders: HolderStore,
    evaluator: RuleEvaluator,
    animator: SequenceAnimator,
    random: SeededRandom,
    /// Holders retired by the current sweep, dropped once it ends.
    retired: Vec<EntityId>,
    trigger_sweeps: u64,
    rules_fired: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        tracing::info!(
            seed = config.seed,
            check_interval_ms = config.check_interval_ms,
            "session created"
        );
        Self {
            config,
            registry: TriggerRegistry::new(),
            holders: HolderStore::new(),
            evaluator: RuleEvaluator::new(),
            animator: SequenceAnimator::new(AnimatorConfig {
                check_interval_ms: config.check_interval_ms,
            }),
            random: SeededRandom::new(config.seed),
            retired: Vec::new(),
            trigger_sweeps: 0,
            rules_fired: 0,
        }
    }

    /// Build a session from the `session` section of a definitions document.
    pub fn from_definitions(defs: &Definitions) -> Result<Self, SessionError> {
        if defs.session.check_interval_ms == 0 {
            return Err(ConfigError::ZeroCheckInterval.into());
        }
        Ok(Self::new(defs.session))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub fn holders(&self) -> &HolderStore {
        &self.holders
    }

    pub fn animator(&self) -> &SequenceAnimator {
        &self.animator
    }

    /// Route one signal.
    pub fn handle(&mut self, signal: WorldSignal, host: &mut Host<'_>) -> SignalOutcome {
        tracing::trace!(signal = signal.kind(), "handle signal");
        match signal {
            WorldSignal::HolderSpawned(holder) => self.register(holder),
            WorldSignal::HolderRemoved(entity) => SignalOutcome::Removed {
                entity,
                keys: self.drop_holder(entity),
                animated: false,
            },
            WorldSignal::SequenceSpawned {
                entity,
                location,
                sequence,
            } => {
                self.animator
                    .attach(entity, location, sequence, host.clock.now_millis(), &*host.world);
                SignalOutcome::Attached { entity }
            }
            WorldSignal::SequenceRemoved(entity) => SignalOutcome::Removed {
                entity,
                keys: 0,
                animated: self.animator.detach(entity).is_some(),
            },
            WorldSignal::EntityRemoved(entity) => {
                let keys = self.drop_holder(entity);
                let animated = self.animator.detach(entity).is_some();
                SignalOutcome::Removed {
                    entity,
                    keys,
                    animated,
                }
            }
            WorldSignal::EntityMoved {
                entity,
                category,
                position,
            } => self.sweep(Trigger::new(entity, position, category), host),
            WorldSignal::BlockChanged { entity, pos, block } => {
                self.sweep(Trigger::new(entity, pos.as_vec3(), block), host)
            }
            WorldSignal::Tick => match self.animator.update(
                host.clock,
                &mut *host.world,
                host.catalog,
                &mut *host.sink,
            ) {
                Some(stats) => SignalOutcome::Polled(stats),
                None => SignalOutcome::Throttled,
            },
        }
    }

    /// Route a batch of signals in order.
    pub fn handle_all(
        &mut self,
        signals: impl IntoIterator<Item = WorldSignal>,
        host: &mut Host<'_>,
    ) -> Vec<SignalOutcome> {
        signals
            .into_iter()
            .map(|signal| self.handle(signal, host))
            .collect()
    }

    /// Give the block entity at `pos` the behaviour its block type defines:
    /// rules through [`WorldSignal::HolderSpawned`], a sequence through
    /// [`WorldSignal::SequenceSpawned`].
    pub fn spawn_block(
        &mut self,
        defs: &Definitions,
        entity: EntityId,
        pos: BlockPos,
        facing: Side,
        host: &mut Host<'_>,
    ) -> Result<SpawnReport, SessionError> {
        let block = host.world.block_at(pos);
        let Some(behaviour) = defs.behaviour(&block) else {
            return Err(SessionError::NoBehaviour { block, pos });
        };
        let sequence: Option<StageSequence> = behaviour
            .sequence
            .as_ref()
            .map(|def| def.to_sequence(&block))
            .transpose()?;

        let mut report = SpawnReport::default();
        let rules = defs.rules_for(&block);
        if !rules.is_empty() {
            let holder = RuleHolder::new(entity, pos, rules).with_facing(facing);
            if let SignalOutcome::Registered { keys, .. } =
                self.handle(WorldSignal::HolderSpawned(holder), host)
            {
                report.keys = keys;
            }
        }
        if let Some(sequence) = sequence {
            self.handle(
                WorldSignal::SequenceSpawned {
                    entity,
                    location: pos,
                    sequence,
                },
                host,
            );
            report.animated = true;
        }
        tracing::debug!(%entity, %block, keys = report.keys, animated = report.animated, "block spawned");
        Ok(report)
    }

    /// Tear down the trigger index. Returns per-key subscriber counts.
    pub fn shutdown(&mut self) -> Vec<(TriggerKey, usize)> {
        let report = self.registry.clear();
        self.holders.clear();
        self.retired.clear();
        tracing::info!(
            keys = report.len(),
            trigger_sweeps = self.trigger_sweeps,
            rules_fired = self.rules_fired,
            "session shut down"
        );
        report
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            seed: self.config.seed,
            holders: self.holders.len(),
            trigger_keys: self.registry.key_count(),
            subscriptions: self.registry.subscription_count(),
            animated: self.animator.len(),
            stopped: self.animator.stopped_count(),
            trigger_sweeps: self.trigger_sweeps,
            animator_sweeps: self.animator.sweeps(),
            rules_fired: self.rules_fired,
        }
    }

    fn register(&mut self, holder: RuleHolder) -> SignalOutcome {
        let entity = holder.entity;
        if self.holders.contains(entity) {
            tracing::debug!(%entity, "replacing rule holder");
            self.drop_holder(entity);
        }
        let keys = self.registry.register_holder(&holder);
        self.holders.insert(holder);
        SignalOutcome::Registered { entity, keys }
    }

    fn drop_holder(&mut self, entity: EntityId) -> usize {
        self.holders.remove(entity);
        self.registry.unregister(entity)
    }

    fn sweep(&mut self, trigger: Trigger, host: &mut Host<'_>) -> SignalOutcome {
        if !self.registry.contains_key(&trigger.key) {
            return SignalOutcome::Ignored;
        }
        let report = self.evaluator.evaluate(
            &self.registry,
            &self.holders,
            &trigger,
            &mut *host.world,
            host.catalog,
            &mut self.random,
        );
        self.trigger_sweeps += 1;
        self.rules_fired += report.fired.len() as u64;

        // A fired holder's block was replaced, so its rules no longer apply.
        for fired in &report.fired {
            if !self.retired.contains(&fired.holder) {
                self.retired.push(fired.holder);
            }
        }
        for entity in std::mem::take(&mut self.retired) {
            tracing::debug!(%entity, "rule holder retired");
            self.drop_holder(entity);
        }
        SignalOutcome::Swept(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockshift_common::{BlockUri, EntityCategory};
    use blockshift_kernel::{BlockRegistry, ManualClock, RecordingSink, VoxelWorld};
    use blockshift_rules::ConditionRule;
    use glam::{IVec3, Vec3};

    struct Rig {
        world: VoxelWorld,
        catalog: BlockRegistry,
        clock: ManualClock,
        sink: RecordingSink,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                world: VoxelWorld::new(),
                catalog: BlockRegistry::with_blocks(["grass", "dirt", "water", "mud", "a", "b"]),
                clock: ManualClock::new(0),
                sink: RecordingSink::new(),
            }
        }

        fn handle(&mut self, session: &mut Session, signal: WorldSignal) -> SignalOutcome {
            let mut host = Host {
                world: &mut self.world,
                catalog: &self.catalog,
                clock: &self.clock,
                sink: &mut self.sink,
            };
            session.handle(signal, &mut host)
        }
    }

    fn trampling_holder(id: EntityId) -> RuleHolder {
        let rule = ConditionRule::entity_nearby(EntityCategory::Player, "dirt")
            .with_range(0.0, 3.0)
            .through_walls();
        RuleHolder::new(id, IVec3::ZERO, vec![rule])
    }

    fn player_at(position: Vec3) -> WorldSignal {
        WorldSignal::EntityMoved {
            entity: EntityId::new(),
            category: EntityCategory::Player,
            position,
        }
    }

    #[test]
    fn spawn_registers_every_key() {
        let mut rig = Rig::new();
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        let outcome = rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));
        assert_eq!(outcome, SignalOutcome::Registered { entity: id, keys: 1 });
        assert!(session.registry().contains_key(&EntityCategory::Player.into()));
        assert_eq!(session.holders().len(), 1);
    }

    #[test]
    fn respawn_replaces_holder() {
        let mut rig = Rig::new();
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));
        let water = RuleHolder::new(
            id,
            IVec3::ZERO,
            vec![ConditionRule::block_nearby("water", "mud").through_walls()],
        );
        rig.handle(&mut session, WorldSignal::HolderSpawned(water));
        assert!(!session.registry().contains_key(&EntityCategory::Player.into()));
        assert_eq!(session.registry().lookup(&BlockUri::new("water").into()), &[id]);
        assert_eq!(session.holders().len(), 1);
    }

    #[test]
    fn unheard_keys_are_ignored() {
        let mut rig = Rig::new();
        let mut session = Session::new(SessionConfig::default());
        let outcome = rig.handle(&mut session, player_at(Vec3::X));
        assert_eq!(outcome, SignalOutcome::Ignored);
        assert_eq!(session.summary().trigger_sweeps, 0);
    }

    #[test]
    fn fired_holder_is_retired_after_sweep() {
        let mut rig = Rig::new();
        rig.world.set_block(IVec3::ZERO, &BlockUri::new("grass"));
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));

        let SignalOutcome::Swept(report) = rig.handle(&mut session, player_at(Vec3::X)) else {
            panic!("expected a sweep");
        };
        assert_eq!(report.fired.len(), 1);
        assert_eq!(rig.world.block_at(IVec3::ZERO), BlockUri::new("dirt"));
        assert!(session.holders().is_empty());
        assert_eq!(session.registry().key_count(), 0);

        // The next move finds nobody listening.
        assert_eq!(rig.handle(&mut session, player_at(Vec3::X)), SignalOutcome::Ignored);
    }

    #[test]
    fn all_rules_of_a_retired_holder_still_run_in_its_sweep() {
        let mut rig = Rig::new();
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        let rules = vec![
            ConditionRule::entity_nearby(EntityCategory::Player, "dirt").through_walls(),
            ConditionRule::entity_nearby(EntityCategory::Player, "mud").through_walls(),
        ];
        rig.handle(
            &mut session,
            WorldSignal::HolderSpawned(RuleHolder::new(id, IVec3::ZERO, rules)),
        );
        let SignalOutcome::Swept(report) = rig.handle(&mut session, player_at(Vec3::X)) else {
            panic!("expected a sweep");
        };
        assert_eq!(report.fired.len(), 2);
        assert_eq!(rig.world.block_at(IVec3::ZERO), BlockUri::new("mud"));
        assert_eq!(session.summary().rules_fired, 2);
    }

    #[test]
    fn entity_removal_drops_rules_and_sequence() {
        let mut rig = Rig::new();
        rig.world.set_block(IVec3::ZERO, &BlockUri::new("a"));
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));
        rig.handle(
            &mut session,
            WorldSignal::SequenceSpawned {
                entity: id,
                location: IVec3::ZERO,
                sequence: StageSequence::from_pairs([("a", 100), ("b", 100)], false),
            },
        );
        let outcome = rig.handle(&mut session, WorldSignal::EntityRemoved(id));
        assert_eq!(
            outcome,
            SignalOutcome::Removed {
                entity: id,
                keys: 1,
                animated: true
            }
        );
        assert!(session.animator().is_empty());
        assert!(session.holders().is_empty());
    }

    #[test]
    fn holder_removal_keeps_sequence() {
        let mut rig = Rig::new();
        rig.world.set_block(IVec3::ZERO, &BlockUri::new("a"));
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));
        rig.handle(
            &mut session,
            WorldSignal::SequenceSpawned {
                entity: id,
                location: IVec3::ZERO,
                sequence: StageSequence::from_pairs([("a", 100), ("b", 100)], false),
            },
        );
        rig.handle(&mut session, WorldSignal::HolderRemoved(id));
        assert_eq!(session.animator().len(), 1);
        assert!(session.holders().is_empty());
    }

    #[test]
    fn sequence_removal_keeps_rules() {
        let mut rig = Rig::new();
        rig.world.set_block(IVec3::ZERO, &BlockUri::new("a"));
        let mut session = Session::new(SessionConfig::default());
        let id = EntityId::new();
        rig.handle(&mut session, WorldSignal::HolderSpawned(trampling_holder(id)));
        rig.handle(
            &mut session,
            WorldSignal::SequenceSpawned {
                entity: id,
                location: IVec3::ZERO,
                sequence: StageSequence::from_pairs([("a", 100), ("b", 100)], false),
            },
        );
        let outcome = rig.handle(&mut session, WorldSignal::SequenceRemoved(id));
        assert_eq!(
            outcome,
            SignalOutcome::Removed {
                entity: id,
                keys: 0,
                animated: true
            }
        );
        assert!(session.animator().is_empty());
        assert_eq!(session.holders().len(), 1);
    }

    #[test]
    fn tick_is_throttled_by_check_interval() {
        let mut rig = Rig::new();
        rig.world.set_block(IVec3::ZERO, &BlockUri::new("a"));
        let mut session = Session::new(SessionConfig {
            check_interval_ms: 1000,
            seed: 0,
        });
        rig.handle(
            &mut session,
            WorldSignal::SequenceSpawned {
                entity: EntityId::new(),
                location: IVec3::ZERO,
                sequence: StageSequence::from_pairs([("a", 100), ("b", 100)], false),
            },
        );
        rig.clock.set(1000);
        assert_eq!(rig.handle(&mut session, WorldSignal::Tick), SignalOutcome::Throttled);
        rig.clock.set(1001);
        let SignalOutcome::Polled(stats) = rig.handle(&mut session, WorldSignal::Tick) else {
            panic!("expected a poll");
        };
        assert_eq!(stats.transitions, 1);
        assert_eq!(rig.world.block_at(IVec3::ZERO), BlockUri::new("b"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut defs = Definitions::default();
        defs.session.check_interval_ms = 0;
        assert!(matches!(
            Session::from_definitions(&defs),
            Err(SessionError::Config(ConfigError::ZeroCheckInterval))
        ));
    }

    #[test]
    fn shutdown_reports_keys() {
        let mut rig = Rig::new();
        let mut session = Session::new(SessionConfig::default());
        rig.handle(
            &mut session,
            WorldSignal::HolderSpawned(trampling_holder(EntityId::new())),
        );
        rig.handle(
            &mut session,
            WorldSignal::HolderSpawned(trampling_holder(EntityId::new())),
        );
        let report = session.shutdown();
        assert_eq!(report, vec![(TriggerKey::from(EntityCategory::Player), 2)]);
        assert_eq!(session.summary().holders, 0);
    }
}
