//! Hint expression trees and the builder that constructs them.

use crate::error::{CircuitError, Result};
use crate::store::NodeId;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;

/// Operators available inside a hint. A superset of what the primary graph can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintOp {
    Add,
    Sub,
    Mul,
    Div,
    Square,
    Sqrt,
}

impl HintOp {
    pub fn arity(self) -> usize {
        match self {
            HintOp::Square | HintOp::Sqrt => 1,
            _ => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            HintOp::Add => "+",
            HintOp::Sub => "-",
            HintOp::Mul => "*",
            HintOp::Div => "/",
            HintOp::Square => "sq",
            HintOp::Sqrt => "sqrt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HintKind {
    Constant(f64),
    /// Back-reference to a primary-graph node; never owned by the hint.
    ValueOf(NodeId),
    Operation(HintOp),
}

/// A vertex of a hint's private expression tree.
///
/// The dependency set is fixed at construction: the union of the children's
/// sets, plus the referenced node for `ValueOf`.
#[derive(Debug, Clone, PartialEq)]
pub struct HintNode {
    kind: HintKind,
    pub(crate) children: SmallVec<[Box<HintNode>; 2]>,
    dependencies: BTreeSet<NodeId>,
}

impl HintNode {
    fn leaf(kind: HintKind, dependencies: BTreeSet<NodeId>) -> Self {
        Self { kind, children: SmallVec::new(), dependencies }
    }

    fn operation(op: HintOp, children: SmallVec<[Box<HintNode>; 2]>) -> Self {
        let mut dependencies = BTreeSet::new();
        for child in &children {
            dependencies.extend(child.dependencies.iter().copied());
        }
        Self { kind: HintKind::Operation(op), children, dependencies }
    }

    pub fn kind(&self) -> &HintKind { &self.kind }
    pub fn children(&self) -> impl Iterator<Item = &HintNode> { self.children.iter().map(|c| c.as_ref()) }
    pub fn dependencies(&self) -> &BTreeSet<NodeId> { &self.dependencies }

    pub fn as_constant(&self) -> Option<f64> {
        match self.kind {
            HintKind::Constant(v) => Some(v),
            _ => None,
        }
    }
}

// Long chains would otherwise recurse once per level when dropped.
impl Drop for HintNode {
    fn drop(&mut self) {
        let mut stack: Vec<Box<HintNode>> = self.children.drain(..).collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.children.drain(..));
        }
    }
}

impl fmt::Display for HintNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HintKind::Constant(v) => write!(f, "{}", v),
            HintKind::ValueOf(id) => write!(f, "val({})", id),
            HintKind::Operation(op) if op.arity() == 1 => write!(f, "{}({})", op.symbol(), self.children[0]),
            HintKind::Operation(op) => write!(f, "({} {} {})", self.children[0], op.symbol(), self.children[1]),
        }
    }
}

/// Stateless constructor set for hint trees.
///
/// `div` and `sqrt` reject misuse that is visible in a literal constant operand.
/// Operands that only turn bad once variables are bound are caught by the solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintBuilder;

impl HintBuilder {
    pub fn new() -> Self { Self }

    pub fn constant(&self, value: f64) -> HintNode {
        HintNode::leaf(HintKind::Constant(value), BTreeSet::new())
    }

    /// Placeholder for the value `node` will have once solved.
    pub fn value_of(&self, node: NodeId) -> HintNode {
        HintNode::leaf(HintKind::ValueOf(node), BTreeSet::from([node]))
    }

    pub fn add(&self, lhs: HintNode, rhs: HintNode) -> HintNode {
        self.binary(HintOp::Add, lhs, rhs)
    }

    pub fn sub(&self, lhs: HintNode, rhs: HintNode) -> HintNode {
        self.binary(HintOp::Sub, lhs, rhs)
    }

    pub fn mul(&self, lhs: HintNode, rhs: HintNode) -> HintNode {
        self.binary(HintOp::Mul, lhs, rhs)
    }

    pub fn div(&self, lhs: HintNode, rhs: HintNode) -> Result<HintNode> {
        if rhs.as_constant() == Some(0.0) {
            return Err(CircuitError::ConstantDivisorZero);
        }
        Ok(self.binary(HintOp::Div, lhs, rhs))
    }

    pub fn square(&self, operand: HintNode) -> HintNode {
        self.unary(HintOp::Square, operand)
    }

    pub fn sqrt(&self, operand: HintNode) -> Result<HintNode> {
        if let Some(value) = operand.as_constant() {
            if value < 0.0 {
                return Err(CircuitError::NegativeConstantSqrt { value });
            }
        }
        Ok(self.unary(HintOp::Sqrt, operand))
    }

    fn unary(&self, op: HintOp, operand: HintNode) -> HintNode {
        let mut children = SmallVec::new();
        children.push(Box::new(operand));
        HintNode::operation(op, children)
    }

    fn binary(&self, op: HintOp, lhs: HintNode, rhs: HintNode) -> HintNode {
        let mut children = SmallVec::new();
        children.push(Box::new(lhs));
        children.push(Box::new(rhs));
        HintNode::operation(op, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_dependency_sets_union_bottom_up() {
        let h = HintBuilder::new();
        let (a, b, c) = (NodeId(1), NodeId(2), NodeId(5));

        let left = h.add(h.value_of(a), h.constant(3.0));
        assert_eq!(left.dependencies(), &BTreeSet::from([a]));

        let right = h.mul(h.value_of(b), h.value_of(c));
        assert_eq!(right.dependencies(), &BTreeSet::from([b, c]));

        let root = h.sub(left, h.square(right));
        assert_eq!(root.dependencies(), &BTreeSet::from([a, b, c]));

        // Repeated references collapse into one entry.
        let twice = h.add(h.value_of(a), h.value_of(a));
        assert_eq!(twice.dependencies().len(), 1);
    }

    #[test]
    fn test_constants_have_no_dependencies() {
        let h = HintBuilder::new();
        let n = h.sqrt(h.add(h.constant(1.0), h.constant(3.0))).unwrap();
        assert!(n.dependencies().is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.0)]
    fn test_constant_zero_divisor_is_rejected(#[case] divisor: f64) {
        let h = HintBuilder::new();
        let err = h.div(h.constant(8.0), h.constant(divisor)).unwrap_err();
        assert_eq!(err, CircuitError::ConstantDivisorZero);
    }

    #[test]
    fn test_negative_constant_sqrt_is_rejected() {
        let h = HintBuilder::new();
        let err = h.sqrt(h.constant(-23.0)).unwrap_err();
        assert_eq!(err, CircuitError::NegativeConstantSqrt { value: -23.0 });
    }

    #[test]
    fn test_non_literal_operands_pass_construction() {
        // Only literal constants are inspected here.
        let h = HintBuilder::new();
        assert!(h.div(h.constant(1.0), h.value_of(NodeId(0))).is_ok());
        assert!(h.sqrt(h.value_of(NodeId(0))).is_ok());
        assert!(h.div(h.constant(1.0), h.sub(h.constant(2.0), h.constant(2.0))).is_ok());
        assert!(h.sqrt(h.constant(0.0)).is_ok());
    }

    #[test]
    fn test_display_renders_expression() {
        let h = HintBuilder::new();
        let n = h.sub(h.sqrt(h.value_of(NodeId(3))).unwrap(), h.constant(4.0));
        assert_eq!(n.to_string(), "(sqrt(val(#3)) - 4)");
    }

    #[test]
    fn test_deep_chain_drops_without_recursion() {
        let h = HintBuilder::new();
        let mut n = h.constant(0.0);
        for _ in 0..200_000 {
            n = h.add(n, h.constant(1.0));
        }
        drop(n);
    }
}
