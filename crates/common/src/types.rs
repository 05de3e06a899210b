use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Integer block coordinate in the voxel grid.
pub type BlockPos = IVec3;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an id from a fixed number. Used where ids must be reproducible.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block type identifier, e.g. `core:water` or `plants:sapling.stage1`.
///
/// Stored lower-cased so that `Core:Water` and `core:water` name the same block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BlockUri(String);

impl BlockUri {
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(uri.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The air block: the value of any unset world position.
    pub fn air() -> Self {
        Self("engine:air".into())
    }

    pub fn is_air(&self) -> bool {
        self.0 == "engine:air"
    }
}

impl From<String> for BlockUri {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for BlockUri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<BlockUri> for String {
    fn from(value: BlockUri) -> Self {
        value.0
    }
}

impl fmt::Display for BlockUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reserved categories of mobile entities that can trigger rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EntityCategory {
    Item,
    Npc,
    Player,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 3] = [Self::Item, Self::Npc, Self::Player];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Npc => "npc",
            Self::Player => "player",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity category {0:?} (expected item, npc or player)")]
pub struct ParseCategoryError(pub String);

impl FromStr for EntityCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "item" => Ok(Self::Item),
            "npc" => Ok(Self::Npc),
            "player" => Ok(Self::Player),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

impl TryFrom<String> for EntityCategory {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Normalized key under which rule holders subscribe to triggers.
///
/// A block key and an entity key never compare equal, even when a block
/// happens to be called `player`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerKey {
    Block(BlockUri),
    Entity(EntityCategory),
}

impl TriggerKey {
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

impl From<BlockUri> for TriggerKey {
    fn from(value: BlockUri) -> Self {
        Self::Block(value)
    }
}

impl From<EntityCategory> for TriggerKey {
    fn from(value: EntityCategory) -> Self {
        Self::Entity(value)
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(uri) => write!(f, "{uri}"),
            Self::Entity(category) => write!(f, "{category}"),
        }
    }
}
