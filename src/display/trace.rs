use crate::builder::NodeBuilder;
use crate::store::{NodeId, NodeKind};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the computation behind `target` as an indented tree, using
/// whatever values the builder currently holds. Subtrees already shown are
/// printed once and then referenced by level.
pub fn format_trace(builder: &NodeBuilder, target: NodeId) -> String {
    let mut tracer = Tracer { builder, visited_at_level: HashMap::new(), output: String::new() };

    match builder.name(target) {
        Some(name) => {
            let _ = writeln!(tracer.output, "AUDIT TRACE for node '{}':", name);
            let _ = writeln!(tracer.output, "--------------------------------------------------");
            tracer.trace_node(target, 1, "");
        }
        None => {
            let _ = writeln!(tracer.output, "Error: Invalid Node ID {}", target);
        }
    }
    tracer.output
}

/// Indentation stops growing past this depth; deeper lines keep the stem of
/// their parent and rely on the `[L<n>]` tag for depth.
const MAX_INDENT: usize = 32;
const CONNECTOR_WIDTH: usize = 3;

struct Tracer<'a> {
    builder: &'a NodeBuilder,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    /// Depth-first, pre-order walk on an explicit stack.
    fn trace_node(&mut self, root: NodeId, root_level: usize, root_prefix: &str) {
        let mut stack: Vec<(NodeId, usize, String)> = vec![(root, root_level, root_prefix.to_string())];

        while let Some((node_id, level, prefix)) = stack.pop() {
            if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
                let _ = writeln!(self.output, "{}-> (Ref to L{})", prefix, first_seen);
                continue;
            }
            self.visited_at_level.insert(node_id, level);

            let builder = self.builder;
            let Some(kind) = builder.kind(node_id) else {
                let _ = writeln!(self.output, "{}[L{}] {} (unknown)", prefix, level, node_id);
                continue;
            };
            let line_header = format!("[L{}] {}", level, self.format_ref(node_id));

            match kind {
                NodeKind::Constant(_) => {
                    let _ = writeln!(self.output, "{}{} -> Const", prefix, line_header);
                }
                NodeKind::Variable(ident) => {
                    let _ = writeln!(self.output, "{}{} -> Var({})", prefix, line_header, ident);
                }
                NodeKind::Operation { op, operands } => {
                    let lhs = self.format_ref(operands[0]);
                    let rhs = self.format_ref(operands[1]);
                    let _ = writeln!(self.output, "{}{} = {} {} {}", prefix, line_header, lhs, op.symbol(), rhs);
                    self.push_children(&mut stack, &prefix, operands.iter().copied(), level);
                }
                NodeKind::Hinted(ident) => match builder.hint_for(node_id) {
                    Some(hint) => {
                        let _ = writeln!(self.output, "{}{} = hint {}: {}", prefix, line_header, ident, hint.expression());
                        self.push_children(&mut stack, &prefix, hint.dependencies().iter().copied(), level);
                    }
                    None => {
                        let _ = writeln!(self.output, "{}{} = hint {}: <missing>", prefix, line_header, ident);
                    }
                },
            }
        }
    }

    /// Pushes children in reverse so the first child is printed first.
    fn push_children(
        &self,
        stack: &mut Vec<(NodeId, usize, String)>,
        prefix: &str,
        children: impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator,
        level: usize,
    ) {
        let stem = self.build_child_stem(prefix, level);
        let last = children.len().saturating_sub(1);
        for (i, child) in children.enumerate().rev() {
            let connector = if i == last { "`--" } else { "|--" };
            stack.push((child, level + 1, format!("{}{}", stem, connector)));
        }
    }

    fn format_ref(&self, id: NodeId) -> String {
        let name = self.builder.name(id).unwrap_or("?");
        match self.builder.value(id) {
            Some(v) => format!("{}[{:.3}]", name, v),
            None => format!("{}[?]", name),
        }
    }

    fn build_child_stem(&self, current_prefix: &str, level: usize) -> String {
        if level >= MAX_INDENT {
            let keep = current_prefix.len().saturating_sub(CONNECTOR_WIDTH);
            return current_prefix[..keep].to_string();
        }
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}
