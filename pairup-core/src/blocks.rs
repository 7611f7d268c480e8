//! Per-identifier block set cache

use std::collections::{HashMap, HashSet};

use crate::participant::Identifier;

/// Cached sets of identifiers each user must never be paired with
///
/// Refetched from the moderation service on every queue join; the cache is
/// only as fresh as the last join.
#[derive(Debug, Default)]
pub struct BlockFilter {
    sets: HashMap<Identifier, HashSet<Identifier>>,
}

impl BlockFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached set for `identifier`
    pub fn refresh(&mut self, identifier: &str, blocked: HashSet<Identifier>) {
        self.sets.insert(identifier.to_string(), blocked);
    }

    /// True if either side's cached set names the other
    pub fn blocks_either(&self, a: &str, b: &str) -> bool {
        let a_blocks_b = self.sets.get(a).is_some_and(|set| set.contains(b));
        let b_blocks_a = self.sets.get(b).is_some_and(|set| set.contains(a));
        a_blocks_b || b_blocks_a
    }

    pub fn evict(&mut self, identifier: &str) {
        self.sets.remove(identifier);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
