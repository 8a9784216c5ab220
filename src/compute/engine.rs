//! A synchronous, single-threaded solver for the primary graph and its hints.
use crate::compute::ledger::Ledger;
use crate::config::SolverConfig;
use crate::error::{CircuitError, Result};
use crate::hint::{HintOp, HintRegistry};
use crate::store::{Ident, NodeId, NodeKind, Registry};
use std::collections::HashSet;

/// Outcome of trying to solve a hint.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready(f64),
    /// Dependencies that could not be resolved yet. Retry after more progress.
    Pending(Vec<NodeId>),
}

pub struct Solver<'a> {
    registry: &'a Registry,
    hints: &'a mut HintRegistry,
    ledger: &'a mut Ledger,
    config: &'a SolverConfig,
    /// Hints currently on the recursion stack of `solve_hint`.
    in_progress: HashSet<Ident>,
    fills: usize,
}

impl<'a> Solver<'a> {
    pub fn new(
        registry: &'a Registry,
        hints: &'a mut HintRegistry,
        ledger: &'a mut Ledger,
        config: &'a SolverConfig,
    ) -> Self {
        ledger.ensure_capacity(registry.count());
        Self { registry, hints, ledger, config, in_progress: HashSet::new(), fills: 0 }
    }

    /// Number of ledger slots this solver has written.
    pub fn fills(&self) -> usize { self.fills }

    /// Evaluates `head` and everything it needs, memoizing into the ledger.
    ///
    /// Nodes that cannot be evaluated yet are deferred and retried in further
    /// passes. A pass that neither fills a slot nor schedules a new hint
    /// dependency ends the loop with `CircuitError::Unsolvable`.
    pub fn solve(&mut self, head: NodeId) -> Result<f64> {
        self.registry.check(head)?;
        if let Some(v) = self.ledger.get(head) {
            return Ok(v);
        }

        let registry = self.registry;
        let mut work = self.linearize(head)?;
        let mut scheduled: HashSet<NodeId> = HashSet::new();
        let mut pass = 0usize;

        loop {
            pass += 1;
            let fills_before = self.fills;
            let mut newly_scheduled = 0usize;
            let mut deferred = Vec::new();

            for &id in &work {
                if self.ledger.is_filled(id) {
                    continue;
                }
                match registry.kind(id)? {
                    NodeKind::Constant(v) => self.fill(id, *v),
                    NodeKind::Variable(ident) => {
                        let v = self.assigned(*ident)?;
                        self.fill(id, v);
                    }
                    NodeKind::Operation { op, operands: [lhs, rhs] } => {
                        match (self.ledger.get(*lhs), self.ledger.get(*rhs)) {
                            (Some(a), Some(b)) => self.fill(id, op.apply(a, b)),
                            _ => deferred.push(id),
                        }
                    }
                    NodeKind::Hinted(ident) => match self.solve_hint(*ident)? {
                        Readiness::Ready(_) => {}
                        Readiness::Pending(missing) => {
                            for dep in missing {
                                if scheduled.insert(dep) {
                                    newly_scheduled += 1;
                                    deferred.extend(self.linearize(dep)?);
                                }
                            }
                            deferred.push(id);
                        }
                    },
                }
            }

            tracing::debug!(
                pass,
                work = work.len(),
                filled = self.fills - fills_before,
                deferred = deferred.len(),
                "solver pass"
            );

            if deferred.is_empty() {
                break;
            }
            if self.fills == fills_before && newly_scheduled == 0 {
                deferred.sort_unstable();
                deferred.dedup();
                tracing::debug!(pending = ?deferred, "solver stalled");
                return Err(CircuitError::Unsolvable { pending: deferred });
            }
            work = deferred;
        }

        self.ledger
            .get(head)
            .ok_or(CircuitError::Unsolvable { pending: vec![head] })
    }

    /// Post-order over the unfilled part of the subgraph below `head`.
    /// Explicit stack, so graph depth is bounded by heap rather than call stack.
    fn linearize(&self, head: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut expanded: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<(NodeId, bool)> = vec![(head, false)];

        while let Some((id, children_done)) = stack.pop() {
            if children_done {
                order.push(id);
                continue;
            }
            if self.ledger.is_filled(id) || !expanded.insert(id) {
                continue;
            }
            stack.push((id, true));
            // Right before left so the left operand is evaluated first.
            for &child in self.registry.kind(id)?.operands().iter().rev() {
                self.registry.check(child)?;
                stack.push((child, false));
            }
        }
        Ok(order)
    }

    /// Solves the hint registered under `ident`, recursing into nested hints.
    pub fn solve_hint(&mut self, ident: Ident) -> Result<Readiness> {
        let hint = self.hints.get(ident).ok_or(CircuitError::MissingHint { ident })?;
        if let Some(v) = hint.solved {
            let output = hint.output;
            if !self.ledger.is_filled(output) {
                self.fill(output, v);
            }
            return Ok(Readiness::Ready(v));
        }
        let output = hint.output;
        let dependencies: Vec<NodeId> = hint.dependencies.iter().copied().collect();

        self.in_progress.insert(ident);
        let resolved = self.resolve_dependencies(&dependencies);
        self.in_progress.remove(&ident);
        let missing = resolved?;
        if !missing.is_empty() {
            return Ok(Readiness::Pending(missing));
        }

        let checks = self.config.runtime_domain_checks;
        let ledger: &Ledger = self.ledger;
        let hint = self.hints.get(ident).ok_or(CircuitError::MissingHint { ident })?;
        let value = hint.program.execute(
            |id| ledger.get(id).ok_or(CircuitError::Unsolvable { pending: vec![id] }),
            |op, a, b| apply_hint_op(ident, checks, op, a, b),
        )?;

        if let Some(hint) = self.hints.get_mut(ident) {
            hint.solved = Some(value);
        }
        self.fill(output, value);
        tracing::trace!(hint = %ident, value, "hint solved");
        Ok(Readiness::Ready(value))
    }

    /// Returns the dependencies that are not ready yet. Constant and variable
    /// leaves are written to the ledger only when nothing is missing, so a
    /// pending hint leaves the ledger as it found it apart from nested hint
    /// results.
    fn resolve_dependencies(&mut self, dependencies: &[NodeId]) -> Result<Vec<NodeId>> {
        let registry = self.registry;
        let mut missing = Vec::new();
        let mut leaves: Vec<(NodeId, f64)> = Vec::new();
        for &dep in dependencies {
            if self.ledger.is_filled(dep) {
                continue;
            }
            match registry.kind(dep)? {
                NodeKind::Constant(v) => leaves.push((dep, *v)),
                NodeKind::Variable(var) => leaves.push((dep, self.assigned(*var)?)),
                NodeKind::Hinted(inner) => {
                    if self.in_progress.contains(inner) {
                        missing.push(dep);
                    } else if let Readiness::Pending(_) = self.solve_hint(*inner)? {
                        missing.push(dep);
                    }
                }
                NodeKind::Operation { .. } => missing.push(dep),
            }
        }
        if missing.is_empty() {
            for (dep, v) in leaves {
                self.fill(dep, v);
            }
        }
        Ok(missing)
    }

    fn assigned(&self, ident: Ident) -> Result<f64> {
        self.registry
            .assignments
            .get(&ident)
            .copied()
            .flatten()
            .ok_or(CircuitError::UnboundVariable { ident })
    }

    #[inline(always)]
    fn fill(&mut self, id: NodeId, value: f64) {
        self.ledger.insert(id, value);
        self.fills += 1;
    }
}

fn apply_hint_op(hint: Ident, checks: bool, op: HintOp, a: f64, b: f64) -> Result<f64> {
    Ok(match op {
        HintOp::Add => a + b,
        HintOp::Sub => a - b,
        HintOp::Mul => a * b,
        HintOp::Div => {
            if checks && b == 0.0 {
                return Err(CircuitError::DivisionByZero { hint });
            }
            a / b
        }
        HintOp::Square => a * a,
        HintOp::Sqrt => {
            if checks && a < 0.0 {
                return Err(CircuitError::NegativeSqrt { hint, value: a });
            }
            a.sqrt()
        }
    })
}
