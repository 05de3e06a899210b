//! Block behaviour definitions.
//!
//! A definitions document maps block types to the behaviour their block
//! entities carry: a stage sequence, conditional rules, or both. Documents
//! are YAML or JSON; both formats share one schema.
//!
//! # Invariants
//! - A loaded [`Definitions`] has passed [`Definitions::validate`].
//! - Stage order is document order.

mod definitions;
mod error;

pub use definitions::{
    BlockBehaviour, Definitions, RuleDef, RuleKindDef, ScenePlacement, ScriptAction, ScriptStep,
    SequenceDef, SessionConfig,
};
pub use error::ConfigError;

pub fn crate_info() -> &'static str {
    "blockshift-config v0.1.0"
}
