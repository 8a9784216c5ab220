//! Node table, identifiers and the free-variable assignment store.
pub mod assignment;
pub mod counter;
pub mod registry;
pub mod types;

pub use assignment::Assignment;
pub use counter::{Counter, IdSource};
pub use registry::Registry;
pub use types::{Ident, NodeId, NodeKind, NodeMetadata, Op};
