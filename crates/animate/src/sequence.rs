use blockshift_common::BlockUri;
use serde::{Deserialize, Serialize};

/// One named block state and how long a block stays in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub block: BlockUri,
    pub dwell_ms: u64,
}

impl Stage {
    pub fn new(block: impl Into<BlockUri>, dwell_ms: u64) -> Self {
        Self {
            block: block.into(),
            dwell_ms,
        }
    }
}

/// Ordered stages plus the per-entity timer state that walks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSequence {
    stages: Vec<Stage>,
    loops: bool,
    stopped: bool,
    /// Dwell time of the stage the block is currently in.
    dwell_ms: u64,
    /// `None` until the first poll has seen this sequence.
    last_polled: Option<u64>,
}

impl StageSequence {
    /// A sequence over `stages` in the given order, not yet started.
    pub fn new(stages: Vec<Stage>, loops: bool) -> Self {
        Self {
            stages,
            loops,
            stopped: false,
            dwell_ms: 0,
            last_polled: None,
        }
    }

    /// Build from `(block, dwell_ms)` pairs, keeping their order.
    pub fn from_pairs<I, U>(pairs: I, loops: bool) -> Self
    where
        I: IntoIterator<Item = (U, u64)>,
        U: Into<BlockUri>,
    {
        let stages = pairs
            .into_iter()
            .map(|(block, dwell)| Stage::new(block, dwell))
            .collect();
        Self::new(stages, loops)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn loops(&self) -> bool {
        self.loops
    }

    /// Set once a non-looping sequence has reached its last stage.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Time of the last transition or timer start. `None` before the first poll.
    pub fn last_polled(&self) -> Option<u64> {
        self.last_polled
    }

    pub fn current_dwell(&self) -> u64 {
        self.dwell_ms
    }

    /// Earliest time the next transition can happen, once the timer runs.
    pub fn next_deadline(&self) -> Option<u64> {
        self.last_polled.map(|t| t.saturating_add(self.dwell_ms))
    }

    /// Position of `block` in the stage order.
    pub fn index_of(&self, block: &BlockUri) -> Option<usize> {
        self.stages.iter().position(|s| &s.block == block)
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Dwell time of the stage named by `block`, if it is one.
    pub fn dwell_for(&self, block: &BlockUri) -> Option<u64> {
        self.index_of(block).map(|i| self.stages[i].dwell_ms)
    }

    /// Clear the stopped flag and return the timer to its unset state.
    pub fn reset(&mut self) {
        self.stopped = false;
        self.dwell_ms = 0;
        self.last_polled = None;
    }

    pub(crate) fn start_timer(&mut self, now: u64, dwell_ms: u64) {
        self.last_polled = Some(now);
        self.dwell_ms = dwell_ms;
    }

    pub(crate) fn touch(&mut self, now: u64) {
        self.last_polled = Some(now);
    }

    pub(crate) fn set_dwell(&mut self, dwell_ms: u64) {
        self.dwell_ms = dwell_ms;
    }

    pub(crate) fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether more than the current dwell has passed since the last poll.
    pub(crate) fn is_due(&self, now: u64) -> bool {
        match self.last_polled {
            Some(last) => now.saturating_sub(last) > self.dwell_ms,
            None => false,
        }
    }
}
