use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense handle into a builder's node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier drawn from an `IdSource`. Free variables and hints share
/// one namespace so the assignment store and hint registry never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ident(pub u64);

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub name: String,
}

/// Operations the primary graph evaluates natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Add,
    Mul,
}

impl Op {
    #[inline(always)]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Op::Add => lhs + rhs,
            Op::Mul => lhs * rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Mul => "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Filled eagerly when created.
    Constant(f64),
    /// Resolved from the assignment store.
    Variable(Ident),
    Operation { op: Op, operands: [NodeId; 2] },
    /// Placeholder whose value comes from the hint registered under `Ident`.
    Hinted(Ident),
}

impl NodeKind {
    /// Structural children. Hint dependencies are lookups, not operands.
    pub fn operands(&self) -> &[NodeId] {
        match self {
            NodeKind::Operation { operands, .. } => operands,
            _ => &[],
        }
    }
}
