//! Hint system.
//!
//! Hints supply values the primary graph cannot compute itself (division,
//! square roots). The solver trusts them blindly; their correctness has to be
//! pinned down with equality assertions in the primary graph.

pub mod node;
pub mod program;
pub mod registry;

pub use node::{HintBuilder, HintKind, HintNode, HintOp};
pub use program::{HintProgram, Instr};
pub use registry::{Hint, HintRegistry};
