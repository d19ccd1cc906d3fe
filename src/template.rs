//! Template reconciliations: the zero reference for distance counts.
//!
//! A template is one concrete reconciliation drawn from the graph by a
//! seeded random walk: pick a root, then at every map node pick one child
//! event uniformly and descend into all of that event's children.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::graph::{NodeId, ReconGraph};

/// The event nodes of one concrete reconciliation, by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    root: NodeId,
    events: BTreeSet<NodeId>,
}

impl Template {
    /// Build a template from an explicit root and event set.
    ///
    /// Membership in the graph is checked when counting, not here.
    pub fn from_events(root: NodeId, events: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            root,
            events: events.into_iter().collect(),
        }
    }

    /// Root map node the template starts from.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `event` is part of the template.
    pub fn contains(&self, event: NodeId) -> bool {
        self.events.contains(&event)
    }

    /// Template event nodes, in id order.
    pub fn events(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().copied()
    }

    /// Number of event nodes in the template.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the template holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Draw a template from `graph`, reproducibly for a given `seed`.
pub fn sample_template(graph: &ReconGraph, seed: u64) -> Template {
    let mut rng = StdRng::seed_from_u64(seed);

    // A constructed graph always has at least one root.
    let root = graph
        .roots()
        .choose(&mut rng)
        .copied()
        .unwrap_or_else(|| graph.roots()[0]);

    let mut events = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = graph.node(id);
        if node.is_event() {
            events.insert(id);
            stack.extend(node.children().iter().copied());
        } else if let Some(&event) = node.children().choose(&mut rng) {
            stack.push(event);
        }
    }

    tracing::debug!(seed, root = %root, events = events.len(), "template sampled");

    Template { root, events }
}
