use super::node::HintNode;
use super::program::HintProgram;
use crate::store::{Ident, NodeId};
use std::collections::{BTreeSet, HashMap};

/// A registered hint: the compiled equation, what it needs, and where its result goes.
#[derive(Debug, Clone)]
pub struct Hint {
    pub(crate) ident: Ident,
    /// Rendered form of the equation, kept for traces.
    pub(crate) expression: String,
    pub(crate) program: HintProgram,
    pub(crate) dependencies: BTreeSet<NodeId>,
    /// The `Hinted` node that exposes this hint's value.
    pub(crate) output: NodeId,
    pub(crate) solved: Option<f64>,
}

impl Hint {
    pub(crate) fn new(ident: Ident, equation: &HintNode, output: NodeId) -> Self {
        Self {
            ident,
            expression: equation.to_string(),
            program: HintProgram::compile(equation),
            dependencies: equation.dependencies().clone(),
            output,
            solved: None,
        }
    }

    pub fn ident(&self) -> Ident { self.ident }
    pub fn expression(&self) -> &str { &self.expression }
    pub fn dependencies(&self) -> &BTreeSet<NodeId> { &self.dependencies }
    pub fn output(&self) -> NodeId { self.output }

    /// Memoized result, if the hint has been solved under the current binding.
    pub fn solved(&self) -> Option<f64> { self.solved }
}

#[derive(Debug, Clone, Default)]
pub struct HintRegistry {
    hints: HashMap<Ident, Hint>,
}

impl HintRegistry {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn register(&mut self, hint: Hint) {
        self.hints.insert(hint.ident, hint);
    }

    pub fn get(&self, ident: Ident) -> Option<&Hint> { self.hints.get(&ident) }
    pub(crate) fn get_mut(&mut self, ident: Ident) -> Option<&mut Hint> { self.hints.get_mut(&ident) }
    pub fn iter(&self) -> impl Iterator<Item = &Hint> { self.hints.values() }

    /// Forgets every memoized result.
    pub(crate) fn invalidate(&mut self) {
        for hint in self.hints.values_mut() {
            hint.solved = None;
        }
    }
}
