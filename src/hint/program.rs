use super::node::{HintKind, HintNode, HintOp};
use crate::store::NodeId;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instr {
    Const(f64),
    Load(NodeId),
    Unary(HintOp),
    Binary(HintOp),
}

/// A hint tree flattened into evaluation order.
///
/// Executing the tape against a value stack evaluates every child before
/// its parent. For a binary op the left operand is on top of the stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintProgram {
    pub tape: Vec<Instr>,
    /// Deepest the value stack gets while executing `tape`.
    pub max_depth: usize,
}

impl HintProgram {
    /// Two-stack linearization: pre-order onto `order` (right pushed before left),
    /// then reversed so children precede their parent.
    pub fn compile(root: &HintNode) -> Self {
        let mut work: Vec<&HintNode> = vec![root];
        let mut order: Vec<&HintNode> = Vec::new();

        while let Some(node) = work.pop() {
            order.push(node);
            for child in node.children.iter().rev() {
                work.push(child);
            }
        }

        let mut tape = Vec::with_capacity(order.len());
        let mut depth: usize = 0;
        let mut max_depth = 0;
        for node in order.into_iter().rev() {
            let instr = match node.kind() {
                HintKind::Constant(v) => Instr::Const(*v),
                HintKind::ValueOf(id) => Instr::Load(*id),
                HintKind::Operation(op) if op.arity() == 1 => Instr::Unary(*op),
                HintKind::Operation(op) => Instr::Binary(*op),
            };
            match instr {
                Instr::Const(_) | Instr::Load(_) => depth += 1,
                Instr::Binary(_) => depth -= 1,
                Instr::Unary(_) => {}
            }
            max_depth = max_depth.max(depth);
            tape.push(instr);
        }

        Self { tape, max_depth }
    }

    /// Runs the tape. `load` supplies primary-graph values; `apply` performs
    /// each operation and may reject it.
    pub fn execute<E>(
        &self,
        mut load: impl FnMut(NodeId) -> Result<f64, E>,
        mut apply: impl FnMut(HintOp, f64, f64) -> Result<f64, E>,
    ) -> Result<f64, E> {
        let mut stack: SmallVec<[f64; 16]> = SmallVec::with_capacity(self.max_depth);
        for instr in &self.tape {
            match *instr {
                Instr::Const(v) => stack.push(v),
                Instr::Load(id) => stack.push(load(id)?),
                Instr::Unary(op) => {
                    let operand = stack.pop().unwrap_or(f64::NAN);
                    stack.push(apply(op, operand, f64::NAN)?);
                }
                Instr::Binary(op) => {
                    let lhs = stack.pop().unwrap_or(f64::NAN);
                    let rhs = stack.pop().unwrap_or(f64::NAN);
                    stack.push(apply(op, lhs, rhs)?);
                }
            }
        }
        Ok(stack.pop().unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::HintBuilder;

    fn ieee(op: HintOp, a: f64, b: f64) -> Result<f64, ()> {
        Ok(match op {
            HintOp::Add => a + b,
            HintOp::Sub => a - b,
            HintOp::Mul => a * b,
            HintOp::Div => a / b,
            HintOp::Square => a * a,
            HintOp::Sqrt => a.sqrt(),
        })
    }

    #[test]
    fn test_tape_places_children_before_parents() {
        let h = HintBuilder::new();
        // (val(#0) - 4) / 2
        let tree = h.div(h.sub(h.value_of(NodeId(0)), h.constant(4.0)), h.constant(2.0)).unwrap();
        let program = HintProgram::compile(&tree);
        assert_eq!(
            program.tape,
            vec![
                Instr::Const(2.0),
                Instr::Const(4.0),
                Instr::Load(NodeId(0)),
                Instr::Binary(HintOp::Sub),
                Instr::Binary(HintOp::Div),
            ]
        );
        assert_eq!(program.max_depth, 3);
    }

    #[test]
    fn test_non_commutative_operands_keep_their_order() {
        let h = HintBuilder::new();
        let tree = h.sub(h.constant(10.0), h.div(h.constant(9.0), h.constant(3.0)).unwrap());
        let program = HintProgram::compile(&tree);
        let v = program.execute(|_| Ok::<_, ()>(0.0), ieee).unwrap();
        assert_eq!(v, 7.0);
    }

    #[test]
    fn test_loads_come_from_the_callback() {
        let h = HintBuilder::new();
        let tree = h.sqrt(h.add(h.value_of(NodeId(4)), h.constant(7.0))).unwrap();
        let program = HintProgram::compile(&tree);
        let v = program.execute(|id| if id == NodeId(4) { Ok(9.0) } else { Err(()) }, ieee).unwrap();
        assert_eq!(v, 4.0);
    }

    #[test]
    fn test_deep_left_chain_compiles_iteratively() {
        let h = HintBuilder::new();
        let mut tree = h.constant(0.0);
        for _ in 0..100_000 {
            tree = h.add(tree, h.constant(1.0));
        }
        let program = HintProgram::compile(&tree);
        assert_eq!(program.tape.len(), 200_001);
        assert_eq!(program.execute(|_| Ok::<_, ()>(0.0), ieee).unwrap(), 100_000.0);
    }
}
