//! Sequence animation: blocks that cycle through an ordered list of stages,
//! one stage per elapsed dwell time.
//!
//! # Invariants
//! - Stage order is the order stages were given in, never a sort order.
//! - A freshly inserted sequence never transitions on its first poll.
//! - A stopped sequence is never advanced and never written again.
//! - One bad entity never aborts a poll sweep.

mod animator;
mod sequence;

pub use animator::{AnimatedBlock, AnimatorConfig, PollStats, SequenceAnimator};
pub use sequence::{Stage, StageSequence};

pub fn crate_info() -> &'static str {
    "blockshift-animate v0.1.0"
}
