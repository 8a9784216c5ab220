use super::types::*;
use crate::error::{CircuitError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Columnar node table plus the assignment store for free variables.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub kinds: Vec<NodeKind>,
    pub meta: Vec<NodeMetadata>,

    /// Every identifier ever handed out by `variable()`; `None` until bound.
    pub assignments: BTreeMap<Ident, Option<f64>>,

    used_names: HashSet<String>,
    /// Last suffix handed out per requested base name.
    name_suffixes: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.kinds.len() }

    pub fn add_node(&mut self, kind: NodeKind, mut meta: NodeMetadata) -> NodeId {
        let id = NodeId::new(self.kinds.len());
        meta.name = self.claim_name(&meta.name);
        if let NodeKind::Variable(ident) = kind {
            self.assignments.insert(ident, None);
        }
        self.kinds.push(kind);
        self.meta.push(meta);
        id
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.check(id)?;
        let old = std::mem::take(&mut self.meta[id.index()].name);
        self.used_names.remove(&old);
        self.meta[id.index()].name = self.claim_name(name);
        Ok(())
    }

    fn claim_name(&mut self, requested: &str) -> String {
        let mut candidate = requested.to_string();
        let suffix = self.name_suffixes.entry(candidate.clone()).or_insert(0);
        while self.used_names.contains(&candidate) {
            *suffix += 1;
            candidate = format!("{}_{}", requested, suffix);
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    #[inline(always)]
    pub fn check(&self, id: NodeId) -> Result<()> {
        if id.index() < self.kinds.len() {
            Ok(())
        } else {
            Err(CircuitError::UnknownNode { node: id })
        }
    }

    #[inline(always)]
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        self.kinds.get(id.index()).ok_or(CircuitError::UnknownNode { node: id })
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.meta.get(id.index()).map(|m| m.name.as_str())
    }

    /// The first variable still waiting for a value, if any.
    pub fn first_unbound(&self) -> Option<Ident> {
        self.assignments
            .iter()
            .find_map(|(ident, v)| if v.is_none() { Some(*ident) } else { None })
    }
}
