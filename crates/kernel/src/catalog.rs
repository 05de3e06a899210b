use crate::BlockCatalog;
use blockshift_common::BlockUri;
use std::collections::BTreeSet;

/// In-memory block catalog. Air is always known.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: BTreeSet<BlockUri>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Create a catalog that knows only air.
    pub fn new() -> Self {
        let mut blocks = BTreeSet::new();
        blocks.insert(BlockUri::air());
        Self { blocks }
    }

    /// Create a catalog that knows air plus `blocks`, normalized through
    /// [`BlockUri`].
    pub fn with_blocks<I, U>(blocks: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<BlockUri>,
    {
        let mut registry = Self::new();
        for block in blocks {
            registry.register(block);
        }
        registry
    }

    /// Add a block type. Returns false if it was already known.
    pub fn register(&mut self, block: impl Into<BlockUri>) -> bool {
        self.blocks.insert(block.into())
    }

    /// Number of known block types, air included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: air is known from the start.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Known block types in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockUri> {
        self.blocks.iter()
    }
}

impl BlockCatalog for BlockRegistry {
    fn resolve(&self, uri: &BlockUri) -> Option<BlockUri> {
        self.blocks.get(uri).cloned()
    }
}
