//! Arithmetic circuits over `f64` with a hint sidecar.
//!
//! The primary graph only knows constants, free variables, addition and
//! multiplication. Values it cannot compute directly (quotients, square roots)
//! come from hints: small expression trees evaluated on demand. Equality
//! assertions in the primary graph pin the hinted values down.
//!
//! ```
//! use succinct_core::{Assignment, NodeBuilder};
//!
//! let mut n = NodeBuilder::new();
//! let h = n.hint();
//! let x = n.variable();
//! let y = n.build_hint(h.sqrt(h.value_of(x)).unwrap());
//! let y_sq = n.mul(y, y);
//! n.assert_equal(y_sq, x);
//!
//! n.bind(&Assignment::new().with(n.ident(x).unwrap(), 9.0)).unwrap();
//! assert!(n.verify(y_sq).unwrap());
//! assert_eq!(n.value(y), Some(3.0));
//! ```

pub mod analysis;
pub mod builder;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod hint;
pub mod store;

pub use builder::{Assertion, NodeBuilder, Snapshot};
pub use config::{Equality, SolverConfig};
pub use error::{CircuitError, Result};
pub use hint::{HintBuilder, HintNode};
pub use store::{Assignment, Counter, IdSource, Ident, NodeId};
