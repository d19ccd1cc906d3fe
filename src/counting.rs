//! Inside/outside counting over a reconciliation graph.
//!
//! For every node, the engine computes how the complete reconciliations
//! passing through it are distributed by signed distance from a
//! [`Template`]. It is an inside-outside dynamic program in which
//! convolution of [`DistanceFunction`]s plays the role of multiplication.
//!
//! ## Passes
//!
//! 1. **Subcounts** (postorder): childless events seed `kronicker(-1)`,
//!    event-less map nodes seed `kronicker(0)`; other map nodes sum their
//!    alternatives; event nodes convolve their children and shift by -1 if
//!    in the template, +1 otherwise
//! 2. **Supercounts** (preorder): roots seed `kronicker(0)`; map nodes sum,
//!    over parent events, the parent's supercount convolved with the
//!    sibling's subcount and shifted like the parent; event nodes inherit
//!    their parent's supercount
//! 3. **Counts**: `subcount * supercount`, shifted by the template size so
//!    the template itself lands at distance 0
//!
//! A childless event is seeded one unit left of zero in place of its shift,
//! so every event on a root-to-leaf path contributes exactly one -1/+1.
//! An event-less map node carries no event and contributes nothing. Events
//! with more than two children would break that bookkeeping.

use num::{BigUint, Zero};
use std::ops::Index;

use crate::graph::{NodeId, ReconGraph};
use crate::template::Template;
use crate::types::{kronicker, DistanceFunction};

/// Error type for counting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CountingError {
    /// A template id is not an event node of this graph.
    #[error("Template references {0}, which is not an event node of this graph")]
    UnknownTemplateEvent(NodeId),
    /// The template root is not a root map node of this graph.
    #[error("Template root {0} is not a root of this graph")]
    TemplateRootNotARoot(NodeId),
    /// The template was not counted at distance 0 from its own root.
    #[error("Root {root} has count {found} at distance 0; the template must be counted")]
    RootMassInvariant {
        /// Template root.
        root: NodeId,
        /// Count observed at distance 0.
        found: BigUint,
    },
}

/// One [`DistanceFunction`] per node, indexed by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTable {
    entries: Vec<DistanceFunction>,
}

impl NodeTable {
    fn new(len: usize) -> Self {
        Self {
            entries: vec![DistanceFunction::zero(); len],
        }
    }

    fn set(&mut self, id: NodeId, value: DistanceFunction) {
        self.entries[id.index()] = value;
    }

    /// Entry for `id`, if in range.
    pub fn get(&self, id: NodeId) -> Option<&DistanceFunction> {
        self.entries.get(id.index())
    }

    /// Iterate `(node, function)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DistanceFunction)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, f)| (NodeId::from_index(i), f))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<NodeId> for NodeTable {
    type Output = DistanceFunction;

    fn index(&self, id: NodeId) -> &DistanceFunction {
        &self.entries[id.index()]
    }
}

/// Output of the three counting passes.
#[derive(Debug, Clone)]
pub struct CountTables {
    /// Inside distributions.
    pub subcounts: NodeTable,
    /// Outside distributions.
    pub supercounts: NodeTable,
    /// Combined, template-centred distributions.
    pub counts: NodeTable,
    /// Number of events in the template.
    pub template_size: usize,
    roots: Vec<NodeId>,
}

impl CountTables {
    /// Distance distribution over every complete reconciliation, all roots.
    pub fn distribution_at_root(&self) -> DistanceFunction {
        self.roots
            .iter()
            .fold(DistanceFunction::zero(), |acc, &r| acc.sum(&self.counts[r]))
    }

    /// Total number of complete reconciliations.
    pub fn total_reconciliations(&self) -> BigUint {
        self.distribution_at_root().total()
    }
}

/// Counting engine bound to one graph and one template.
pub struct CountingEngine<'g> {
    graph: &'g ReconGraph,
    template: &'g Template,
}

impl<'g> CountingEngine<'g> {
    /// Create an engine, checking the template against the graph.
    pub fn new(graph: &'g ReconGraph, template: &'g Template) -> Result<Self, CountingError> {
        if !graph.roots().contains(&template.root()) {
            return Err(CountingError::TemplateRootNotARoot(template.root()));
        }
        if let Some(bad) = template
            .events()
            .find(|&e| !graph.get(e).is_some_and(|n| n.is_event()))
        {
            return Err(CountingError::UnknownTemplateEvent(bad));
        }
        Ok(Self { graph, template })
    }

    /// -1 for template events, +1 for everything else.
    fn shift_for(&self, event: NodeId) -> i64 {
        if self.template.contains(event) {
            -1
        } else {
            1
        }
    }

    /// Inside pass.
    pub fn subcounts(&self) -> NodeTable {
        let mut table = NodeTable::new(self.graph.len());

        for id in self.graph.postorder() {
            let node = self.graph.node(id);
            let value = if node.is_leaf() && node.is_map() {
                kronicker(0)
            } else if node.is_leaf() {
                kronicker(-1)
            } else if node.is_map() {
                node.children()
                    .iter()
                    .fold(DistanceFunction::zero(), |acc, &c| acc.sum(&table[c]))
            } else {
                node.children()
                    .iter()
                    .fold(kronicker(0), |acc, &c| acc.convolve(&table[c]))
                    .shift(self.shift_for(id))
            };
            table.set(id, value);
        }

        table
    }

    /// Outside pass; needs the inside table for sibling contributions.
    pub fn supercounts(&self, subcounts: &NodeTable) -> NodeTable {
        let mut table = NodeTable::new(self.graph.len());

        for id in self.graph.preorder() {
            let node = self.graph.node(id);
            let value = if node.is_root() {
                kronicker(0)
            } else if node.is_map() {
                node.parents().iter().fold(DistanceFunction::zero(), |acc, &parent| {
                    let outside = &table[parent];
                    let joined = match self.graph.other_child(parent, id) {
                        Some(sibling) => outside.convolve(&subcounts[sibling]),
                        None => outside.clone(),
                    };
                    acc.sum(&joined.shift(self.shift_for(parent)))
                })
            } else {
                // Event nodes have exactly one parent map node.
                table[node.parents()[0]].clone()
            };
            table.set(id, value);
        }

        table
    }

    /// Combine inside and outside tables, centred on the template.
    pub fn combine(&self, subcounts: &NodeTable, supercounts: &NodeTable) -> NodeTable {
        let offset = self.template.len() as i64;
        let mut table = NodeTable::new(self.graph.len());
        for id in self.graph.postorder() {
            table.set(id, subcounts[id].convolve(&supercounts[id]).shift(offset));
        }
        table
    }

    /// Run all three passes and check the root-mass invariant.
    pub fn run(&self) -> Result<CountTables, CountingError> {
        let subcounts = self.subcounts();
        let supercounts = self.supercounts(&subcounts);
        let counts = self.combine(&subcounts, &supercounts);

        let root = self.template.root();
        let at_zero = counts[root].evaluate(0);
        if at_zero.is_zero() {
            tracing::error!(
                root = %root,
                template_size = self.template.len(),
                "template not counted at distance 0"
            );
            return Err(CountingError::RootMassInvariant {
                root,
                found: at_zero,
            });
        }

        tracing::debug!(
            nodes = self.graph.len(),
            template_size = self.template.len(),
            at_zero = %at_zero,
            "counting passes complete"
        );

        Ok(CountTables {
            subcounts,
            supercounts,
            counts,
            template_size: self.template.len(),
            roots: self.graph.roots().to_vec(),
        })
    }
}

/// Convenience wrapper: build an engine and run it.
pub fn count(graph: &ReconGraph, template: &Template) -> Result<CountTables, CountingError> {
    CountingEngine::new(graph, template)?.run()
}
