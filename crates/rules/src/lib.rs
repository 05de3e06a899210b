//! Conditional block replacement.
//!
//! Rule holders are blocks that carry [`ConditionRule`]s. The
//! [`TriggerRegistry`] indexes holders by the trigger keys their rules name,
//! and [`RuleEvaluator`] runs the gate chain for every holder subscribed to
//! a trigger, replacing the holder's block when a rule fires.
//!
//! # Invariants
//! - A holder appears at most once under any trigger key.
//! - A rule fires at most once per evaluation call.
//! - A misconfigured rule never aborts a sweep; it just does not fire.

pub mod condition;
pub mod evaluator;
pub mod holder;
pub mod registry;

pub use condition::{ConditionRule, DistanceRange, Facing, RuleKind};
pub use evaluator::{ADJACENT_DISTANCE, RuleEvaluator, RuleFired, SweepReport, Trigger};
pub use holder::{HolderStore, RuleHolder};
pub use registry::TriggerRegistry;

pub fn crate_info() -> &'static str {
    "blockshift-rules v0.1.0"
}
