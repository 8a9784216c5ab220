//! Evaluation of the primary graph and its hints.
pub mod engine;
pub mod ledger;

pub use engine::{Readiness, Solver};
pub use ledger::Ledger;
