//! Identifier sources for variables and hints.

use super::types::Ident;
use std::sync::Mutex;

/// Anything that can hand out unique, strictly increasing identifiers.
pub trait IdSource: Send + Sync + std::fmt::Debug {
    fn next_id(&self) -> Ident;
}

/// Incrementing counter that can be shared between threads.
#[derive(Debug)]
pub struct Counter {
    next: Mutex<u64>,
}

impl Counter {
    pub const BASE: u64 = 1;

    pub fn new() -> Self {
        Self::starting_at(Self::BASE)
    }

    pub fn starting_at(base: u64) -> Self {
        Self { next: Mutex::new(base) }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for Counter {
    fn next_id(&self) -> Ident {
        // A panic elsewhere cannot leave the counter half-updated.
        let mut guard = self.next.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *guard;
        *guard += 1;
        Ident(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counter_starts_at_base_and_increments() {
        let c = Counter::new();
        assert_eq!(c.next_id(), Ident(1));
        assert_eq!(c.next_id(), Ident(2));
        assert_eq!(c.next_id(), Ident(3));
    }

    #[test]
    fn test_concurrent_callers_never_share_an_id() {
        let c = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    let mut seen = Vec::with_capacity(500);
                    let mut last = 0;
                    for _ in 0..500 {
                        let id = c.next_id().0;
                        // Per-thread view must be strictly increasing.
                        assert!(id > last);
                        last = id;
                        seen.push(id);
                    }
                    seen
                })
            })
            .collect();

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(all.len(), 8 * 500);
        assert_eq!(c.next_id(), Ident(8 * 500 + 1));
    }
}
