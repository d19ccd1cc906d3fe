//! Chronological orders produced by dating.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rank of every node in a dated reconciliation.
///
/// Rank 0 is the earliest event (the root side); ranks grow toward the
/// present. Leaves all share the maximal rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct ChronologicalOrder<K> {
    ranks: BTreeMap<K, usize>,
}

impl<K: Ord + Clone> ChronologicalOrder<K> {
    /// Create an empty order.
    pub fn new() -> Self {
        Self {
            ranks: BTreeMap::new(),
        }
    }

    /// Assign `rank` to `node`.
    pub fn insert(&mut self, node: K, rank: usize) {
        self.ranks.insert(node, rank);
    }

    /// Rank of `node`, if dated.
    pub fn rank(&self, node: &K) -> Option<usize> {
        self.ranks.get(node).copied()
    }

    /// Whether `node` is dated.
    pub fn contains(&self, node: &K) -> bool {
        self.ranks.contains_key(node)
    }

    /// Nodes sorted by rank, ties broken by node order.
    pub fn by_rank(&self) -> Vec<(&K, usize)> {
        let mut sorted: Vec<_> = self.ranks.iter().map(|(k, r)| (k, *r)).collect();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    /// Largest rank assigned.
    pub fn max_rank(&self) -> Option<usize> {
        self.ranks.values().copied().max()
    }

    /// Iterate `(node, rank)` in node order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.ranks.iter().map(|(k, r)| (k, *r))
    }

    /// Number of dated nodes.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// True if nothing is dated.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl<K: Ord + Clone> Default for ChronologicalOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> FromIterator<(K, usize)> for ChronologicalOrder<K> {
    fn from_iter<I: IntoIterator<Item = (K, usize)>>(iter: I) -> Self {
        Self {
            ranks: iter.into_iter().collect(),
        }
    }
}
