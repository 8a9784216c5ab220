use crate::store::NodeId;

/// Resolved node values, indexed by `NodeId`. A `Some` slot is "filled".
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    values: Vec<Option<f64>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn ensure_capacity(&mut self, size: usize) {
        if self.values.len() < size {
            self.values.resize(size, None);
        }
    }

    #[inline(always)]
    pub fn get(&self, node_id: NodeId) -> Option<f64> {
        self.values.get(node_id.index()).copied().flatten()
    }

    #[inline(always)]
    pub fn is_filled(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_some()
    }

    #[inline(always)]
    pub fn insert(&mut self, node_id: NodeId, value: f64) {
        let idx = node_id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }

    pub fn invalidate(&mut self, node_ids: impl IntoIterator<Item = NodeId>) {
        for id in node_ids {
            if let Some(slot) = self.values.get_mut(id.index()) {
                *slot = None;
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_grows_and_invalidate_clears() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.get(NodeId(3)), None);

        ledger.insert(NodeId(3), 1.5);
        ledger.insert(NodeId(0), -2.0);
        assert_eq!(ledger.get(NodeId(3)), Some(1.5));
        assert!(!ledger.is_filled(NodeId(1)));
        assert!(ledger.is_filled(NodeId(0)));

        ledger.invalidate([NodeId(3), NodeId(42)]);
        assert_eq!(ledger.get(NodeId(3)), None);
        assert_eq!(ledger.get(NodeId(0)), Some(-2.0));
    }
}
