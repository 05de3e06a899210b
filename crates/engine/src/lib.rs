//! Session wiring for the blockshift engines.
//!
//! A [`Session`] owns the trigger registry, the rule holders, the sequence
//! animator and the seeded random stream. Hosts translate what happens in
//! their world into [`WorldSignal`]s and hand them to
//! [`Session::handle`] together with a [`Host`] bundle of collaborators.
//!
//! # Invariants
//! - A holder whose rule fired is retired once the sweep that fired it ends,
//!   never during it.
//! - Signals for trigger keys nobody listens to never start a sweep.
//! - The same definitions, seed and signal stream produce the same world.

mod error;
mod session;
mod signal;
mod summary;

pub use error::SessionError;
pub use session::{Host, Session, SignalOutcome, SpawnReport};
pub use signal::WorldSignal;
pub use summary::SessionSummary;

pub fn crate_info() -> &'static str {
    "blockshift-engine v0.1.0"
}
