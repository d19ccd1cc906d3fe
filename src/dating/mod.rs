//! Topological dating of a single resolved reconciliation.
//!
//! A resolved reconciliation is a plain child-adjacency structure. Dating
//! runs Kahn's algorithm over its internal nodes: every node is ranked
//! after all of its parents, and leaves share the final rank. If the
//! internal nodes contain a directed cycle, some event would have to
//! happen before its own prerequisite, and the outcome is
//! [`DatingOutcome::TimeTravel`] instead of an order.

pub mod branch;

use std::collections::{BTreeMap, VecDeque};

use crate::types::{Adjacency, ChronologicalOrder};

pub use branch::{branch_lengths, project_order};

/// Result of dating one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatingOutcome<K> {
    /// A valid chronological order.
    Ordered(ChronologicalOrder<K>),
    /// The reconciliation implies a cycle; retry with a revised one.
    TimeTravel,
}

impl<K> DatingOutcome<K> {
    /// True if a cycle was detected.
    pub fn is_time_travel(&self) -> bool {
        matches!(self, Self::TimeTravel)
    }

    /// The order, if dating succeeded.
    pub fn order(&self) -> Option<&ChronologicalOrder<K>> {
        match self {
            Self::Ordered(order) => Some(order),
            Self::TimeTravel => None,
        }
    }

    /// Consume into the order, if dating succeeded.
    pub fn into_order(self) -> Option<ChronologicalOrder<K>> {
        match self {
            Self::Ordered(order) => Some(order),
            Self::TimeTravel => None,
        }
    }
}

/// Date a resolved reconciliation.
///
/// Internal nodes get ranks `0, 1, 2, ...` in Kahn order (roots first);
/// every leaf gets the rank after the last internal one. Among nodes that
/// become ready together, the smaller node is ranked first.
pub fn date<K: Ord + Clone>(reconciliation: &Adjacency<K>) -> DatingOutcome<K> {
    let all = reconciliation.all_nodes();
    let (leaves, internal): (Vec<&K>, Vec<&K>) =
        all.into_iter().partition(|n| reconciliation.is_leaf(n));

    let mut in_degree: BTreeMap<&K, usize> = internal.iter().map(|&n| (n, 0)).collect();
    for &parent in &internal {
        for child in reconciliation.present_children(parent) {
            if let Some(d) = in_degree.get_mut(child) {
                *d += 1;
            }
        }
    }

    let mut ready: VecDeque<&K> = in_degree
        .iter()
        .filter(|&(_, &d)| d == 0)
        .map(|(&n, _)| n)
        .collect();
    for n in &ready {
        in_degree.remove(n);
    }

    let mut order = ChronologicalOrder::new();
    let mut next_rank = 0usize;
    while let Some(node) = ready.pop_front() {
        order.insert(node.clone(), next_rank);
        next_rank += 1;

        for child in reconciliation.present_children(node) {
            if let Some(d) = in_degree.get_mut(child) {
                *d -= 1;
                if *d == 0 {
                    in_degree.remove(child);
                    ready.push_back(child);
                }
            }
        }
    }

    if !in_degree.is_empty() {
        tracing::warn!(
            stuck = in_degree.len(),
            dated = next_rank,
            "time travel: reconciliation ordering contains a cycle"
        );
        return DatingOutcome::TimeTravel;
    }

    for leaf in leaves {
        order.insert(leaf.clone(), next_rank);
    }

    tracing::debug!(internal = next_rank, nodes = order.len(), "reconciliation dated");

    DatingOutcome::Ordered(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn path() -> Adjacency<&'static str> {
        // A -> B -> C, C a leaf
        let mut t = Adjacency::new();
        t.insert("A", vec![Some("B")]);
        t.insert("B", vec![Some("C")]);
        t.insert("C", vec![None]);
        t
    }

    #[test]
    fn test_path_is_ranked_root_first() {
        let order = date(&path()).into_order().unwrap();
        assert_eq!(order.rank(&"A"), Some(0));
        assert_eq!(order.rank(&"B"), Some(1));
        assert_eq!(order.rank(&"C"), Some(2));
    }

    #[test]
    fn test_leaves_share_maximal_rank() {
        //      r
        //     / \
        //    a   l1
        //   / \
        //  l2  l3
        let tree = Adjacency::new()
            .with_children("r", "a", "l1")
            .with_children("a", "l2", "l3")
            .with_leaf("l1")
            .with_leaf("l2")
            .with_leaf("l3");

        let order = date(&tree).into_order().unwrap();
        assert_eq!(order.rank(&"r"), Some(0));
        assert_eq!(order.rank(&"a"), Some(1));
        for leaf in ["l1", "l2", "l3"] {
            assert_eq!(order.rank(&leaf), Some(2));
        }
        assert_eq!(order.max_rank(), Some(2));
    }

    #[test]
    fn test_cycle_is_time_travel() {
        // Transfer makes x a prerequisite of y and y of x.
        let recon = Adjacency::new()
            .with_children("root", "x", "l0")
            .with_children("x", "y", "l1")
            .with_children("y", "x", "l2")
            .with_leaf("l0")
            .with_leaf("l1")
            .with_leaf("l2");

        let outcome = date(&recon);
        assert!(outcome.is_time_travel());
        assert_eq!(outcome.order(), None);
    }

    #[test]
    fn test_self_loop_is_time_travel() {
        let recon = Adjacency::new().with_children("x", "x", "l").with_leaf("l");
        assert_eq!(date(&recon), DatingOutcome::TimeTravel);
    }

    #[test]
    fn test_dag_with_transfer_edge_is_ordered() {
        // Donor edge d is dated before recipient t.
        let recon = Adjacency::new()
            .with_children("r", "d", "t")
            .with_children("d", "t", "l1")
            .with_children("t", "l2", "l3")
            .with_leaf("l1")
            .with_leaf("l2")
            .with_leaf("l3");

        let order = date(&recon).into_order().unwrap();
        assert!(order.rank(&"r") < order.rank(&"d"));
        assert!(order.rank(&"d") < order.rank(&"t"));
    }

    #[test]
    fn test_empty_reconciliation() {
        let empty: Adjacency<&str> = Adjacency::new();
        assert!(date(&empty).into_order().unwrap().is_empty());
    }

    /// Random DAG over `n` nodes: edges only go from lower to higher index.
    fn arb_dag() -> impl Strategy<Value = Adjacency<u32>> {
        (2u32..12).prop_flat_map(|n| {
            prop::collection::vec((0..n, 0..n), 0..30).prop_map(move |pairs| {
                let mut children: BTreeMap<u32, Vec<Option<u32>>> = BTreeMap::new();
                for (a, b) in pairs {
                    if a < b {
                        children.entry(a).or_default().push(Some(b));
                    }
                }
                // Highest node is always a leaf.
                children.insert(n - 1, vec![None, None]);
                children.into_iter().collect()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_parents_precede_children(dag in arb_dag()) {
            let order = date(&dag).into_order().expect("acyclic input must be ordered");
            for (parent, child) in dag.edges() {
                if dag.is_leaf(parent) && dag.is_leaf(child) {
                    continue;
                }
                prop_assert!(order.rank(parent) < order.rank(child));
            }
        }

        #[test]
        fn prop_back_edge_is_time_travel(dag in arb_dag()) {
            // Close a cycle between the first internal edge's endpoints.
            let edge = dag
                .edges()
                .find(|(p, c)| !dag.is_leaf(p) && !dag.is_leaf(c))
                .map(|(p, c)| (*p, *c));
            if let Some((p, c)) = edge {
                let mut cyclic = dag.clone();
                let mut kids: Vec<Option<u32>> = cyclic.children(&c).unwrap_or(&[]).to_vec();
                kids.push(Some(p));
                cyclic.insert(c, kids);
                prop_assert!(date(&cyclic).is_time_travel());
            }
        }
    }
}
