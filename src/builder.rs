//! The user-facing circuit builder.

use crate::compute::{Ledger, Solver};
use crate::config::SolverConfig;
use crate::error::{CircuitError, Result};
use crate::hint::{Hint, HintBuilder, HintNode, HintRegistry};
use crate::store::{Assignment, Counter, IdSource, Ident, NodeId, NodeKind, NodeMetadata, Op, Registry};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Two nodes that must evaluate to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub lhs: NodeId,
    pub rhs: NodeId,
}

/// Builds a DAG of constants, free variables and add/mul operations, plus
/// hinted leaves whose values come from the hint system.
///
/// Usage: create nodes, record assertions with [`assert_equal`](Self::assert_equal),
/// [`bind`](Self::bind) a value for every variable, then [`verify`](Self::verify).
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    registry: Registry,
    hints: HintRegistry,
    ledger: Ledger,
    assertions: Vec<Assertion>,
    ids: Arc<dyn IdSource>,
    config: SolverConfig,
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeBuilder {
    /// A builder with its own private identifier counter.
    pub fn new() -> Self {
        Self::with_id_source(Arc::new(Counter::new()))
    }

    /// A builder drawing identifiers from `ids`, which may be shared with other builders.
    pub fn with_id_source(ids: Arc<dyn IdSource>) -> Self {
        Self {
            registry: Registry::new(),
            hints: HintRegistry::new(),
            ledger: Ledger::new(),
            assertions: Vec::new(),
            ids,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &SolverConfig { &self.config }

    // --- Construction ---

    pub fn constant(&mut self, value: f64) -> NodeId {
        let id = self.push(NodeKind::Constant(value), "const");
        self.ledger.insert(id, value);
        id
    }

    /// A free variable. Its slot in the assignment store stays empty until `bind`.
    pub fn variable(&mut self) -> NodeId {
        let ident = self.ids.next_id();
        self.push(NodeKind::Variable(ident), "var")
    }

    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(NodeKind::Operation { op: Op::Add, operands: [lhs, rhs] }, "add")
    }

    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(NodeKind::Operation { op: Op::Mul, operands: [lhs, rhs] }, "mul")
    }

    pub fn assert_equal(&mut self, lhs: NodeId, rhs: NodeId) {
        self.assertions.push(Assertion { lhs, rhs });
    }

    /// Constructors for hint expressions.
    pub fn hint(&self) -> HintBuilder {
        HintBuilder::new()
    }

    /// Registers `equation` and returns the node that exposes its result.
    pub fn build_hint(&mut self, equation: HintNode) -> NodeId {
        let ident = self.ids.next_id();
        let output = self.push(NodeKind::Hinted(ident), "hint");
        let hint = Hint::new(ident, &equation, output);
        tracing::debug!(hint = %ident, node = %output, expression = %hint.expression, "hint registered");
        self.hints.register(hint);
        output
    }

    fn push(&mut self, kind: NodeKind, name: &str) -> NodeId {
        self.registry.add_node(kind, NodeMetadata { name: name.to_string() })
    }

    pub fn set_name(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.registry.rename(node, name)
    }

    // --- Binding & verification ---

    /// Supplies a value for every free variable.
    ///
    /// Fails without changing anything if `assignment` omits a variable of this
    /// builder. Values for unknown identifiers are ignored. Previously solved
    /// values are discarded, so the builder can be verified again.
    pub fn bind(&mut self, assignment: &Assignment) -> Result<()> {
        if let Some(&ident) = self.registry.assignments.keys().find(|id| !assignment.contains(**id)) {
            return Err(CircuitError::MissingBinding { ident });
        }
        for (ident, value) in assignment.iter() {
            match self.registry.assignments.get_mut(&ident) {
                Some(slot) => *slot = Some(value),
                None => tracing::warn!(ident = %ident, "ignoring value for unknown variable"),
            }
        }
        self.invalidate_derived();
        tracing::debug!(variables = self.registry.assignments.len(), "assignment bound");
        Ok(())
    }

    fn invalidate_derived(&mut self) {
        let derived = self
            .registry
            .kinds
            .iter()
            .enumerate()
            .filter(|(_, kind)| !matches!(kind, NodeKind::Constant(_)))
            .map(|(i, _)| NodeId::new(i));
        self.ledger.invalidate(derived);
        self.hints.invalidate();
    }

    /// Evaluates `node` (and whatever it needs) under the current binding.
    pub fn solve(&mut self, node: NodeId) -> Result<f64> {
        self.ensure_bound()?;
        Solver::new(&self.registry, &mut self.hints, &mut self.ledger, &self.config).solve(node)
    }

    /// Solves `target`, then checks every assertion in registration order.
    ///
    /// Returns `Ok(false)` at the first pair that differs. Errors are reserved
    /// for configuration mistakes and graphs that cannot be evaluated.
    pub fn verify(&mut self, target: NodeId) -> Result<bool> {
        let _span = tracing::debug_span!("verify", target = %target).entered();
        self.ensure_bound()?;

        let mut solver = Solver::new(&self.registry, &mut self.hints, &mut self.ledger, &self.config);
        solver.solve(target)?;

        for (i, assertion) in self.assertions.iter().enumerate() {
            let lhs = solver.solve(assertion.lhs)?;
            let rhs = solver.solve(assertion.rhs)?;
            tracing::trace!(assertion = i, lhs, rhs, "comparing");
            if !self.config.equality.holds(lhs, rhs) {
                tracing::debug!(
                    assertion = i,
                    lhs_node = %assertion.lhs,
                    rhs_node = %assertion.rhs,
                    lhs,
                    rhs,
                    "assertion failed"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn ensure_bound(&self) -> Result<()> {
        match self.registry.first_unbound() {
            Some(ident) => Err(CircuitError::UnboundVariable { ident }),
            None => Ok(()),
        }
    }

    /// Verifies `target` once per assignment, each on an independent copy of
    /// this builder, in parallel. `self` is left untouched.
    pub fn verify_scenarios(&self, target: NodeId, assignments: &[Assignment]) -> Vec<Result<bool>> {
        assignments
            .par_iter()
            .map(|assignment| {
                let mut scenario = self.clone();
                scenario.bind(assignment)?;
                scenario.verify(target)
            })
            .collect()
    }

    // --- Accessors ---

    /// Identifier of a variable or hinted node.
    pub fn ident(&self, node: NodeId) -> Option<Ident> {
        match self.registry.kinds.get(node.index())? {
            NodeKind::Variable(ident) | NodeKind::Hinted(ident) => Some(*ident),
            _ => None,
        }
    }

    /// The node's value, if it has been filled.
    pub fn value(&self, node: NodeId) -> Option<f64> { self.ledger.get(node) }
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> { self.registry.kinds.get(node.index()) }
    pub fn name(&self, node: NodeId) -> Option<&str> { self.registry.name(node) }
    pub fn node_count(&self) -> usize { self.registry.count() }
    pub fn assertions(&self) -> &[Assertion] { &self.assertions }
    pub fn variables(&self) -> impl Iterator<Item = Ident> + '_ { self.registry.assignments.keys().copied() }
    pub fn hint_registry(&self) -> &HintRegistry { &self.hints }

    /// The hint behind a `Hinted` node.
    pub fn hint_for(&self, node: NodeId) -> Option<&Hint> {
        match self.kind(node)? {
            NodeKind::Hinted(ident) => self.hints.get(*ident),
            _ => None,
        }
    }

    pub(crate) fn registry(&self) -> &Registry { &self.registry }

    pub fn snapshot(&self) -> Snapshot {
        let mut hints: Vec<HintSummary> = self
            .hints
            .iter()
            .map(|h| HintSummary {
                ident: h.ident(),
                output: h.output(),
                expression: h.expression().to_string(),
                solved: h.solved(),
            })
            .collect();
        hints.sort_by_key(|h| h.ident);

        Snapshot {
            nodes: self.registry.kinds.clone(),
            names: self.registry.meta.iter().map(|m| m.name.clone()).collect(),
            values: (0..self.registry.count()).map(|i| self.ledger.get(NodeId::new(i))).collect(),
            assertions: self.assertions.clone(),
            variables: self.registry.assignments.iter().map(|(k, v)| (*k, *v)).collect(),
            hints,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintSummary {
    pub ident: Ident,
    pub output: NodeId,
    pub expression: String,
    pub solved: Option<f64>,
}

/// Point-in-time, serializable view of a builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeKind>,
    pub names: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub assertions: Vec<Assertion>,
    pub variables: Vec<(Ident, Option<f64>)>,
    pub hints: Vec<HintSummary>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
