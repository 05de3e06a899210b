use blockshift_common::{BlockPos, BlockUri, EntityId, Side};
use blockshift_config::{Definitions, ScriptAction};
use blockshift_engine::{Host, Session, SessionError, SessionSummary, WorldSignal};
use blockshift_kernel::{
    BlockRegistry, BlockWorld, Clock, ManualClock, RecordingSink, SequenceComplete, VoxelWorld,
    WorldEvent,
};
use glam::{IVec3, Vec3};
use std::collections::BTreeMap;

/// Rounds of world events fed back per tick before a reaction chain is cut.
const MAX_ROUNDS: usize = 16;
/// Spacing between blocks laid out when a document has no scene.
const LAYOUT_SPACING: i32 = 3;

/// Result of a scripted run.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub elapsed_ms: u64,
    pub layout: Vec<(BlockPos, BlockUri)>,
    pub completions: Vec<SequenceComplete>,
    pub summary: SessionSummary,
    pub state_hash: u64,
}

/// A host world driven by the `scene` and `script` sections of a document.
pub struct Simulation {
    defs: Definitions,
    session: Session,
    world: VoxelWorld,
    catalog: BlockRegistry,
    clock: ManualClock,
    sink: RecordingSink,
    facings: BTreeMap<EntityId, Side>,
    movers: BTreeMap<String, EntityId>,
    next_step: usize,
    completions: Vec<SequenceComplete>,
}

impl Simulation {
    pub fn new(mut defs: Definitions, seed: Option<u64>) -> Result<Self, SessionError> {
        if let Some(seed) = seed {
            defs.session.seed = seed;
        }
        defs.script.sort_by_key(|step| step.at_ms);
        let mut sim = Self {
            session: Session::from_definitions(&defs)?,
            catalog: BlockRegistry::with_blocks(defs.known_blocks()),
            defs,
            world: VoxelWorld::new(),
            clock: ManualClock::new(0),
            sink: RecordingSink::new(),
            facings: BTreeMap::new(),
            movers: BTreeMap::new(),
            next_step: 0,
            completions: Vec::new(),
        };
        sim.place_scene()?;
        Ok(sim)
    }

    /// Advance `ticks` steps of `step_ms` each.
    pub fn run(&mut self, ticks: u64, step_ms: u64) -> Result<SimReport, SessionError> {
        for _ in 0..ticks {
            self.step(step_ms)?;
        }
        Ok(self.report())
    }

    pub fn step(&mut self, step_ms: u64) -> Result<(), SessionError> {
        self.clock.advance(step_ms);
        let now = self.clock.now_millis();
        let _span = tracing::debug_span!("sim_step", now).entered();

        while let Some(step) = self.defs.script.get(self.next_step) {
            if step.at_ms > now {
                break;
            }
            let action = step.action.clone();
            self.next_step += 1;
            self.apply(action);
        }
        self.pump()?;
        self.send(WorldSignal::Tick);
        self.pump()?;
        self.completions.extend(self.sink.drain());
        Ok(())
    }

    pub fn report(&self) -> SimReport {
        SimReport {
            elapsed_ms: self.clock.now_millis(),
            layout: self
                .world
                .blocks()
                .map(|(pos, block)| (pos, block.clone()))
                .collect(),
            completions: self.completions.clone(),
            summary: self.session.summary(),
            state_hash: self.world.state_hash(),
        }
    }

    fn place_scene(&mut self) -> Result<(), SessionError> {
        let placements: Vec<(BlockUri, BlockPos, Side)> = if self.defs.scene.is_empty() {
            self.defs
                .blocks
                .keys()
                .zip(0..)
                .map(|(block, i)| {
                    (block.clone(), IVec3::new(i * LAYOUT_SPACING, 0, 0), Side::Front)
                })
                .collect()
        } else {
            self.defs
                .scene
                .iter()
                .map(|p| (p.block.clone(), IVec3::from_array(p.pos), p.facing))
                .collect()
        };

        for (block, pos, facing) in placements {
            let entity = EntityId::new();
            self.world.attach_entity(pos, entity);
            self.world.set_block(pos, &block);
            self.facings.insert(entity, facing);
            if self.defs.behaviour(&block).is_some() {
                self.spawn(entity, pos)?;
            }
        }
        // The scene is the starting state, not a series of changes.
        self.world.drain_events();
        tracing::info!(blocks = self.world.block_count(), "scene placed");
        Ok(())
    }

    fn apply(&mut self, action: ScriptAction) {
        match action {
            ScriptAction::Place { block, pos } => {
                let pos = IVec3::from_array(pos);
                if let Some(old) = self.world.detach_entity(pos) {
                    self.send(WorldSignal::EntityRemoved(old));
                    self.facings.remove(&old);
                }
                let entity = EntityId::new();
                self.world.attach_entity(pos, entity);
                self.facings.insert(entity, Side::Front);
                self.world.set_block(pos, &block);
                tracing::debug!(%block, ?pos, "script placed block");
            }
            ScriptAction::Move {
                name,
                category,
                pos,
            } => {
                let id = *self.movers.entry(name).or_insert_with(EntityId::new);
                self.world.move_entity(id, category, Vec3::from_array(pos));
            }
            ScriptAction::Despawn { name } => match self.movers.remove(&name) {
                Some(id) => {
                    self.world.despawn_entity(id);
                }
                None => tracing::warn!(%name, "despawn of unknown entity"),
            },
        }
    }

    /// Feed world events back as signals until the world settles.
    fn pump(&mut self) -> Result<(), SessionError> {
        for _ in 0..MAX_ROUNDS {
            let events = self.world.drain_events();
            if events.is_empty() {
                return Ok(());
            }
            for event in events {
                let respawn = match &event {
                    WorldEvent::BlockChanged {
                        pos,
                        entity: Some(entity),
                        ..
                    } => Some((*entity, *pos)),
                    _ => None,
                };
                if let Some(signal) = WorldSignal::from_world_event(event) {
                    self.send(signal);
                }
                if let Some((entity, pos)) = respawn {
                    self.respawn(entity, pos)?;
                }
            }
        }
        tracing::warn!(rounds = MAX_ROUNDS, "block changes did not settle");
        Ok(())
    }

    /// A block entity whose block changed takes on the new block's behaviour,
    /// unless it is still walking a sequence. A finished sequence gives way
    /// to whatever its final block defines.
    fn respawn(&mut self, entity: EntityId, pos: BlockPos) -> Result<(), SessionError> {
        let walking = self
            .session
            .animator()
            .get(entity)
            .map(|animated| !animated.sequence.is_stopped());
        if walking == Some(true) || self.session.holders().contains(entity) {
            return Ok(());
        }
        if self.defs.behaviour(&self.world.block_at(pos)).is_none() {
            return Ok(());
        }
        if walking == Some(false) {
            self.send(WorldSignal::SequenceRemoved(entity));
        }
        self.spawn(entity, pos)
    }

    fn spawn(&mut self, entity: EntityId, pos: BlockPos) -> Result<(), SessionError> {
        let facing = self.facings.get(&entity).copied().unwrap_or_default();
        let mut host = Host {
            world: &mut self.world,
            catalog: &self.catalog,
            clock: &self.clock,
            sink: &mut self.sink,
        };
        self.session
            .spawn_block(&self.defs, entity, pos, facing, &mut host)?;
        Ok(())
    }

    fn send(&mut self, signal: WorldSignal) {
        let mut host = Host {
            world: &mut self.world,
            catalog: &self.catalog,
            clock: &self.clock,
            sink: &mut self.sink,
        };
        self.session.handle(signal, &mut host);
    }
}
