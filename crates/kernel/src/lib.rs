//! World Kernel: the collaborator ports the rule engines consume, plus
//! deterministic in-memory implementations of each.
//!
//! # Invariants
//! - Writes through [`BlockWorld::set_block`] are visible to the next read.
//! - [`SeededRandom`] produces the same stream for the same seed on every platform.
//! - All state mutations of [`VoxelWorld`] are recorded in its event log.

pub mod catalog;
pub mod clock;
pub mod ports;
pub mod random;
pub mod sink;
pub mod world;

pub use catalog::BlockRegistry;
pub use clock::ManualClock;
pub use ports::{
    BlockCatalog, BlockWorld, Clock, CollisionFilter, EventSink, RandomSource, Raycast,
    WorldAdapter,
};
pub use random::SeededRandom;
pub use sink::{RecordingSink, SequenceComplete};
pub use world::{VoxelWorld, WorldEvent};

pub fn crate_info() -> &'static str {
    "blockshift-kernel v0.1.0"
}
