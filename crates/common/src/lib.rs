//! Shared types for the blockshift rule engines.
//!
//! # Invariants
//! - Identifiers compare case-insensitively; they are stored lower-cased.
//! - Geometry helpers are pure and never fail.

pub mod geometry;
pub mod side;
pub mod types;

pub use side::Side;
pub use types::{BlockPos, BlockUri, EntityCategory, EntityId, ParseCategoryError, TriggerKey};

pub fn crate_info() -> &'static str {
    "blockshift-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
