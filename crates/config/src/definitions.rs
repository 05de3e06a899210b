use crate::ConfigError;
use blockshift_animate::{Stage, StageSequence};
use blockshift_common::{BlockUri, EntityCategory, Side};
use blockshift_rules::{ConditionRule, DistanceRange, Facing, RuleKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum game time between animator sweeps.
    pub check_interval_ms: u64,
    /// World seed for the probability gate's random stream.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            seed: 0,
        }
    }
}

/// Rule kind tag as written in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKindDef {
    BlockNearby,
    BlockDirected,
    EntityNearby,
    EntityDirected,
}

impl RuleKindDef {
    fn is_directed(self) -> bool {
        matches!(self, Self::BlockDirected | Self::EntityDirected)
    }
}

fn default_chance() -> f32 {
    1.0
}

/// One conditional rule as written in a document. Missing fields take the
/// defaults of the rule kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub kind: RuleKindDef,
    /// Block uri for block kinds; `item`, `npc` or `player` for entity kinds.
    pub trigger: String,
    pub target: BlockUri,
    #[serde(default = "default_chance")]
    pub chance: f32,
    #[serde(default)]
    pub min_distance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
    #[serde(default)]
    pub adjacent: bool,
    #[serde(default)]
    pub ignore_occlusion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default)]
    pub field_of_view: f32,
}

/// Finite and at least zero. Rejects NaN, which fails every comparison.
fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

impl RuleDef {
    fn max_distance(&self) -> f32 {
        self.max_distance.unwrap_or(if self.kind.is_directed() {
            ConditionRule::DIRECTED_RANGE.max
        } else {
            ConditionRule::NEARBY_RANGE.max
        })
    }

    /// Check this rule and turn it into its engine form.
    pub fn to_rule(&self, block: &BlockUri, index: usize) -> Result<ConditionRule, ConfigError> {
        if !(0.0..=1.0).contains(&self.chance) {
            return Err(ConfigError::InvalidChance {
                block: block.clone(),
                index,
                chance: self.chance,
            });
        }
        let max = self.max_distance();
        if !non_negative(self.min_distance) || !non_negative(max) {
            return Err(ConfigError::NegativeDistance {
                block: block.clone(),
                index,
            });
        }
        if self.min_distance > max {
            return Err(ConfigError::InvertedRange {
                block: block.clone(),
                index,
                min: self.min_distance,
                max,
            });
        }
        if !non_negative(self.field_of_view) {
            return Err(ConfigError::NegativeFieldOfView {
                block: block.clone(),
                index,
            });
        }
        let range = DistanceRange::new(self.min_distance, max);
        let facing = if self.kind.is_directed() {
            let side = self.side.ok_or_else(|| ConfigError::MissingSide {
                block: block.clone(),
                index,
            })?;
            Some(Facing {
                side,
                field_of_view: self.field_of_view,
            })
        } else {
            None
        };
        let category = || {
            self.trigger
                .parse::<EntityCategory>()
                .map_err(|source| ConfigError::UnknownCategory {
                    block: block.clone(),
                    index,
                    source,
                })
        };
        let ignore_occlusion = self.ignore_occlusion;

        let kind = match (self.kind, facing) {
            (RuleKindDef::BlockNearby, _) => RuleKind::BlockNearby {
                trigger: BlockUri::new(&self.trigger),
                range,
                adjacent: self.adjacent,
                ignore_occlusion,
            },
            (RuleKindDef::BlockDirected, Some(facing)) => RuleKind::BlockDirected {
                trigger: BlockUri::new(&self.trigger),
                range,
                facing,
                ignore_occlusion,
            },
            (RuleKindDef::EntityNearby, _) => RuleKind::EntityNearby {
                trigger: category()?,
                range,
                ignore_occlusion,
            },
            (RuleKindDef::EntityDirected, Some(facing)) => RuleKind::EntityDirected {
                trigger: category()?,
                range,
                facing,
                ignore_occlusion,
            },
            (_, None) => {
                return Err(ConfigError::MissingSide {
                    block: block.clone(),
                    index,
                });
            }
        };
        Ok(ConditionRule {
            chance: self.chance,
            target: self.target.clone(),
            kind,
        })
    }
}

/// A stage sequence as written in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
    #[serde(default)]
    pub loops: bool,
    pub stages: Vec<Stage>,
}

impl SequenceDef {
    pub fn to_sequence(&self, block: &BlockUri) -> Result<StageSequence, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptySequence {
                block: block.clone(),
            });
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|s| s.block == stage.block) {
                return Err(ConfigError::DuplicateStage {
                    block: block.clone(),
                    stage: stage.block.clone(),
                });
            }
        }
        Ok(StageSequence::new(self.stages.clone(), self.loops))
    }
}

/// Everything a block entity of one block type carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockBehaviour {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleDef>,
}

/// A block placed in the world before a scripted run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlacement {
    pub block: BlockUri,
    pub pos: [i32; 3],
    #[serde(default)]
    pub facing: Side,
}

/// Something that happens at a fixed time during a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    /// Set a block, as a player or world generator would.
    Place { block: BlockUri, pos: [i32; 3] },
    /// Move (or spawn) a mobile entity, identified by `name` across steps.
    Move {
        name: String,
        category: EntityCategory,
        pos: [f32; 3],
    },
    /// Remove a mobile entity.
    Despawn { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

/// A full definitions document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub blocks: BTreeMap<BlockUri, BlockBehaviour>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scene: Vec<ScenePlacement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<ScriptStep>,
}

impl Definitions {
    /// Read, parse and validate a document. The format follows the file
    /// extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let defs = Self::read(path)?;
        defs.validate()?;
        tracing::info!(
            path = %path.display(),
            blocks = defs.blocks.len(),
            "loaded block definitions"
        );
        Ok(defs)
    }

    /// Read and parse a document without validating it.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let defs = match ext.as_deref() {
            Some("yaml" | "yml") => Self::parse_yaml(&text)?,
            Some("json") => Self::parse_json(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        Ok(defs)
    }

    /// Parse YAML without validating.
    pub fn parse_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse JSON without validating.
    pub fn parse_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// First problem found, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.problems().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every problem in the document, in block order.
    pub fn problems(&self) -> Vec<ConfigError> {
        let mut problems = Vec::new();
        if self.session.check_interval_ms == 0 {
            problems.push(ConfigError::ZeroCheckInterval);
        }
        for (block, behaviour) in &self.blocks {
            if let Some(seq) = &behaviour.sequence {
                if let Err(err) = seq.to_sequence(block) {
                    problems.push(err);
                }
            }
            for (index, rule) in behaviour.rules.iter().enumerate() {
                if let Err(err) = rule.to_rule(block, index) {
                    problems.push(err);
                }
            }
        }
        problems
    }

    pub fn behaviour(&self, block: &BlockUri) -> Option<&BlockBehaviour> {
        self.blocks.get(block)
    }

    /// Stage sequence a block entity of this type starts with.
    pub fn sequence_for(&self, block: &BlockUri) -> Option<StageSequence> {
        self.behaviour(block)?
            .sequence
            .as_ref()?
            .to_sequence(block)
            .ok()
    }

    /// Conditional rules of this block type. Rules that fail validation are
    /// left out.
    pub fn rules_for(&self, block: &BlockUri) -> Vec<ConditionRule> {
        let Some(behaviour) = self.behaviour(block) else {
            return Vec::new();
        };
        behaviour
            .rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| match rule.to_rule(block, index) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    tracing::warn!(%err, "skipping invalid rule");
                    None
                }
            })
            .collect()
    }

    /// Every block type the document mentions: behaviour keys, stages and
    /// rule targets. Useful to seed a catalog.
    pub fn known_blocks(&self) -> Vec<BlockUri> {
        let mut blocks: Vec<BlockUri> = Vec::new();
        let mut add = |b: &BlockUri| {
            if !blocks.contains(b) {
                blocks.push(b.clone());
            }
        };
        for (block, behaviour) in &self.blocks {
            add(block);
            if let Some(seq) = &behaviour.sequence {
                seq.stages.iter().for_each(|s| add(&s.block));
            }
            behaviour.rules.iter().for_each(|r| add(&r.target));
        }
        for placement in &self.scene {
            add(&placement.block);
        }
        for step in &self.script {
            if let ScriptAction::Place { block, .. } = &step.action {
                add(block);
            }
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
session:
  check_interval_ms: 500
  seed: 42
blocks:
  plant:sapling:
    sequence:
      stages:
        - block: plant:sapling
          dwell_ms: 1000
        - block: plant:young
          dwell_ms: 2000
        - block: plant:tree
          dwell_ms: 0
  core:dirt:
    rules:
      - kind: block_nearby
        trigger: Core:Water
        target: core:mud
        chance: 0.5
        max_distance: 3
      - kind: entity_directed
        trigger: Player
        target: core:trampled
        side: top
        field_of_view: 1.0
scene:
  - block: core:dirt
    pos: [0, 0, 0]
script:
  - at_ms: 1500
    place:
      block: core:water
      pos: [0, 0, 2]
  - at_ms: 2000
    move:
      name: alice
      category: player
      pos: [0.0, 1.0, 0.0]
"#;

    #[test]
    fn parses_sample_document() {
        let defs = Definitions::parse_yaml(SAMPLE).unwrap();
        defs.validate().unwrap();
        assert_eq!(defs.session.check_interval_ms, 500);
        assert_eq!(defs.session.seed, 42);
        assert_eq!(defs.scene.len(), 1);
        assert_eq!(defs.script.len(), 2);
        assert!(matches!(defs.script[1].action, ScriptAction::Move { .. }));
    }

    #[test]
    fn sequence_keeps_document_order() {
        let defs = Definitions::parse_yaml(SAMPLE).unwrap();
        let seq = defs.sequence_for(&"plant:sapling".into()).unwrap();
        let names: Vec<&str> = seq.stages().iter().map(|s| s.block.as_str()).collect();
        assert_eq!(names, ["plant:sapling", "plant:young", "plant:tree"]);
        assert!(!seq.loops());
    }

    #[test]
    fn rules_take_kind_defaults() {
        let defs = Definitions::parse_yaml(SAMPLE).unwrap();
        let rules = defs.rules_for(&"core:dirt".into());
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].range(), DistanceRange::new(0.0, 3.0));
        assert_eq!(rules[0].chance, 0.5);
        assert!(rules[0].listens_for(&BlockUri::new("core:water").into()));
        assert_eq!(rules[1].range(), ConditionRule::DIRECTED_RANGE);
        assert_eq!(rules[1].chance, 1.0);
        assert_eq!(
            rules[1].facing(),
            Some(Facing {
                side: Side::Top,
                field_of_view: 1.0
            })
        );
    }

    #[test]
    fn json_shares_the_schema() {
        let json = r#"{
            "blocks": {
                "core:torch": {
                    "rules": [
                        { "kind": "entity_nearby", "trigger": "npc", "target": "core:torch_lit" }
                    ]
                }
            }
        }"#;
        let defs = Definitions::parse_json(json).unwrap();
        defs.validate().unwrap();
        assert_eq!(defs.session, SessionConfig::default());
        let rules = defs.rules_for(&"core:torch".into());
        assert_eq!(rules[0].range(), ConditionRule::NEARBY_RANGE);
    }

    fn single_rule(rule: &str) -> Definitions {
        let doc = format!("blocks:\n  core:dirt:\n    rules:\n      - {rule}\n");
        Definitions::parse_yaml(&doc).unwrap()
    }

    #[test]
    fn rejects_bad_rules() {
        let cases = [
            ("{ kind: block_nearby, trigger: a, target: b, chance: 1.5 }", "chance"),
            ("{ kind: block_nearby, trigger: a, target: b, min_distance: 4, max_distance: 2 }", "exceeds"),
            ("{ kind: block_nearby, trigger: a, target: b, min_distance: -1 }", "negative"),
            ("{ kind: block_directed, trigger: a, target: b }", "side"),
            ("{ kind: entity_nearby, trigger: zombie, target: b }", "zombie"),
            ("{ kind: block_directed, trigger: a, target: b, side: top, field_of_view: -0.5 }", "field_of_view"),
            ("{ kind: block_nearby, trigger: a, target: b, max_distance: .nan }", "finite"),
            ("{ kind: block_nearby, trigger: a, target: b, min_distance: .nan }", "finite"),
            ("{ kind: block_nearby, trigger: a, target: b, max_distance: .inf }", "finite"),
            ("{ kind: block_directed, trigger: a, target: b, side: top, field_of_view: .nan }", "field_of_view"),
        ];
        for (rule, needle) in cases {
            let defs = single_rule(rule);
            let err = defs.validate().unwrap_err().to_string();
            assert!(err.contains(needle), "{rule}: {err}");
            assert!(defs.rules_for(&"core:dirt".into()).is_empty());
        }
    }

    #[test]
    fn script_categories_parse_any_case() {
        let doc = "script:\n  - at_ms: 1\n    move: { name: a, category: Player, pos: [0.0, 0.0, 0.0] }\n";
        let defs = Definitions::parse_yaml(doc).unwrap();
        assert!(matches!(
            defs.script[0].action,
            ScriptAction::Move {
                category: EntityCategory::Player,
                ..
            }
        ));
        assert!(Definitions::parse_yaml(&doc.replace("Player", "zombie")).is_err());
    }

    #[test]
    fn rejects_bad_sequences() {
        let empty = Definitions::parse_yaml("blocks:\n  a:\n    sequence: { stages: [] }\n").unwrap();
        assert!(matches!(empty.validate(), Err(ConfigError::EmptySequence { .. })));

        let dup = Definitions::parse_yaml(
            "blocks:\n  a:\n    sequence:\n      stages:\n        - { block: A, dwell_ms: 1 }\n        - { block: a, dwell_ms: 2 }\n",
        )
        .unwrap();
        assert!(matches!(dup.validate(), Err(ConfigError::DuplicateStage { .. })));
        assert!(dup.sequence_for(&"a".into()).is_none());
    }

    #[test]
    fn problems_lists_everything() {
        let doc = r#"
session: { check_interval_ms: 0 }
blocks:
  a:
    sequence: { stages: [] }
    rules:
      - { kind: block_nearby, trigger: x, target: y, chance: 2 }
"#;
        let defs = Definitions::parse_yaml(doc).unwrap();
        assert_eq!(defs.problems().len(), 3);
    }

    #[test]
    fn known_blocks_covers_every_mention() {
        let defs = Definitions::parse_yaml(SAMPLE).unwrap();
        let known = defs.known_blocks();
        for b in ["plant:sapling", "plant:young", "plant:tree", "core:dirt", "core:mud", "core:trampled", "core:water"] {
            assert!(known.contains(&BlockUri::new(b)), "{b}");
        }
    }

    #[test]
    fn yaml_round_trip_keeps_meaning() {
        let defs = Definitions::parse_yaml(SAMPLE).unwrap();
        let again = Definitions::parse_yaml(&defs.to_yaml().unwrap()).unwrap();
        assert_eq!(defs, again);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let err = Definitions::load("defs.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. } | ConfigError::UnsupportedFormat(_)));
    }
}
