use crate::EventSink;
use blockshift_common::{BlockPos, EntityId};

/// A completion signal captured by [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceComplete {
    pub entity: EntityId,
    pub location: BlockPos,
}

/// Event sink that keeps every signal it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    completed: Vec<SequenceComplete>,
}

impl RecordingSink {
    /// Create a sink with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions recorded since the last [`drain`](Self::drain), oldest first.
    pub fn completed(&self) -> &[SequenceComplete] {
        &self.completed
    }

    /// Take every recorded completion, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<SequenceComplete> {
        std::mem::take(&mut self.completed)
    }
}

impl EventSink for RecordingSink {
    fn sequence_complete(&mut self, entity: EntityId, location: BlockPos) {
        tracing::debug!(%entity, ?location, "sequence complete");
        self.completed.push(SequenceComplete { entity, location });
    }
}
