//! Relative branch lengths from a chronological order.

use std::collections::BTreeMap;

use crate::types::{Adjacency, ChronologicalOrder};

/// Relative ultrametric branch length for every child edge of `tree`.
///
/// The length of `parent -> child` is `|rank(child) - rank(parent)|`. An
/// edge touching an undated node gets length 0. Keyed by child.
pub fn branch_lengths<K: Ord + Clone>(
    tree: &Adjacency<K>,
    order: &ChronologicalOrder<K>,
) -> BTreeMap<K, usize> {
    tree.edges()
        .map(|(parent, child)| {
            let length = match (order.rank(parent), order.rank(child)) {
                (Some(p), Some(c)) => p.abs_diff(c),
                _ => 0,
            };
            (child.clone(), length)
        })
        .collect()
}

/// Restrict a reconciliation's order to the nodes of one tree.
///
/// The tree's internal nodes are re-ranked `0, 1, 2, ...` in their
/// reconciliation order; its leaves all share the next rank. Nodes of the
/// order that have no entry in `tree` are dropped.
pub fn project_order<K: Ord + Clone>(
    tree: &Adjacency<K>,
    order: &ChronologicalOrder<K>,
) -> ChronologicalOrder<K> {
    let mut projected = ChronologicalOrder::new();
    let mut leaves = Vec::new();
    let mut place = 0usize;

    for (node, _) in order.by_rank() {
        if tree.children(node).is_none() {
            continue;
        }
        if tree.is_leaf(node) {
            leaves.push(node.clone());
        } else {
            projected.insert(node.clone(), place);
            place += 1;
        }
    }
    for leaf in leaves {
        projected.insert(leaf, place);
    }

    projected
}
