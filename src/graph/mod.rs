//! Reconciliation graph: the DAG of map nodes and event nodes.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Map nodes and
//! event nodes strictly alternate: a map node's children are the
//! alternative events achievable at that mapping (a disjunction), and an
//! event node's children are the map nodes it produces (a conjunction).
//!
//! ## Construction Guarantees
//!
//! - Map nodes are deduplicated by [`Mapping`]
//! - Every child reference resolves to a defined mapping
//! - At least one root mapping exists
//! - The graph is acyclic, so every traversal terminates

pub mod input;
pub mod traversal;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::types::{EventKind, Mapping};

pub use input::{EventDescriptor, MappingEntry, ReconGraphInput};
pub use traversal::Postorder;

/// Stable identity of a node in a [`ReconGraph`].
///
/// Two event nodes may be structurally identical and still be different
/// positions in the graph; identity is always by `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of this node.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What a node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A fixed (parasite, host) mapping.
    Map(Mapping),
    /// One event instance.
    Event(EventKind),
}

/// A node in the reconciliation graph.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Node kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mapping key, for map nodes.
    pub fn mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            NodeKind::Map(m) => Some(m),
            NodeKind::Event(_) => None,
        }
    }

    /// Event type, for event nodes.
    pub fn event_kind(&self) -> Option<EventKind> {
        match self.kind {
            NodeKind::Event(k) => Some(k),
            NodeKind::Map(_) => None,
        }
    }

    /// True for map nodes.
    pub fn is_map(&self) -> bool {
        matches!(self.kind, NodeKind::Map(_))
    }

    /// True for event nodes.
    pub fn is_event(&self) -> bool {
        matches!(self.kind, NodeKind::Event(_))
    }

    /// Child node ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node ids.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// A node with no children, of either kind.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A node with no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Error raised when the graph input is structurally invalid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedGraphError {
    /// No mappings at all.
    #[error("Reconciliation graph has no mappings")]
    Empty,
    /// The same mapping key was listed twice.
    #[error("Mapping {0} is listed more than once")]
    DuplicateMapping(Mapping),
    /// An event has more present children than its kind allows.
    #[error("Event {kind} under {mapping} has {found} children, at most {allowed} allowed")]
    InvalidArity {
        /// Mapping owning the event.
        mapping: Mapping,
        /// Event type.
        kind: EventKind,
        /// Present children.
        found: usize,
        /// Allowed maximum.
        allowed: usize,
    },
    /// An event refers to a mapping that has no entry.
    #[error("Event under {parent} references undefined mapping {child}")]
    DanglingReference {
        /// Mapping owning the event.
        parent: Mapping,
        /// Undefined child mapping.
        child: Mapping,
    },
    /// Every mapping is some event's child.
    #[error("No root mapping: every mapping is the child of some event")]
    NoRoot,
    /// Map-node references form a cycle.
    #[error("Reconciliation graph contains a cycle through {0}")]
    Cycle(Mapping),
}

/// The reconciliation DAG.
#[derive(Debug, Clone)]
pub struct ReconGraph {
    nodes: Vec<Node>,
    map_index: BTreeMap<Mapping, NodeId>,
    event_nodes: Vec<NodeId>,
    roots: Vec<NodeId>,
    /// Materialized postorder, reversed for `preorder()`.
    postorder_cache: Vec<NodeId>,
}

impl ReconGraph {
    /// Build the graph from its raw description.
    ///
    /// Map nodes are created for every entry first, so events can refer
    /// to mappings listed later in the input.
    pub fn new(input: &ReconGraphInput) -> Result<Self, MalformedGraphError> {
        if input.is_empty() {
            return Err(MalformedGraphError::Empty);
        }

        let mut nodes: Vec<Node> = Vec::new();
        let mut map_index: BTreeMap<Mapping, NodeId> = BTreeMap::new();

        for entry in &input.entries {
            if map_index.contains_key(&entry.mapping) {
                return Err(MalformedGraphError::DuplicateMapping(entry.mapping.clone()));
            }
            let id = NodeId(nodes.len());
            nodes.push(Node::new(NodeKind::Map(entry.mapping.clone())));
            map_index.insert(entry.mapping.clone(), id);
        }

        let mut event_nodes = Vec::new();
        for entry in &input.entries {
            let parent_id = map_index[&entry.mapping];

            for event in &entry.events {
                let found = event.child_mappings().count();
                let allowed = event.kind.max_children();
                if found > allowed {
                    return Err(MalformedGraphError::InvalidArity {
                        mapping: entry.mapping.clone(),
                        kind: event.kind,
                        found,
                        allowed,
                    });
                }

                let event_id = NodeId(nodes.len());
                let mut event_node = Node::new(NodeKind::Event(event.kind));
                event_node.parents.push(parent_id);

                for child in event.child_mappings() {
                    let child_id = *map_index.get(child).ok_or_else(|| {
                        MalformedGraphError::DanglingReference {
                            parent: entry.mapping.clone(),
                            child: child.clone(),
                        }
                    })?;
                    event_node.children.push(child_id);
                    nodes[child_id.0].parents.push(event_id);
                }

                nodes.push(event_node);
                nodes[parent_id.0].children.push(event_id);
                event_nodes.push(event_id);
            }
        }

        let roots: Vec<NodeId> = input
            .root_mappings()
            .into_iter()
            .map(|m| map_index[m])
            .collect();
        if roots.is_empty() {
            return Err(MalformedGraphError::NoRoot);
        }

        check_acyclic(&nodes)?;

        let mut graph = Self {
            nodes,
            map_index,
            event_nodes,
            roots,
            postorder_cache: Vec::new(),
        };
        graph.postorder_cache = graph.postorder().collect();

        tracing::debug!(
            map_nodes = graph.map_index.len(),
            event_nodes = graph.event_nodes.len(),
            roots = graph.roots.len(),
            "reconciliation graph built"
        );

        Ok(graph)
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different graph and is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by id, or `None` if out of range.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Whether `id` belongs to this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Map node for a mapping key.
    pub fn map_node(&self, mapping: &Mapping) -> Option<NodeId> {
        self.map_index.get(mapping).copied()
    }

    /// All map nodes, in mapping order.
    pub fn map_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.map_index.values().copied()
    }

    /// All event nodes, in input order.
    pub fn event_nodes(&self) -> &[NodeId] {
        &self.event_nodes
    }

    /// Root map nodes, in mapping order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of nodes of both kinds.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed graph.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A child of `event` other than `child`, by identity.
    ///
    /// `None` for unary events, or when both children are `child`.
    pub fn other_child(&self, event: NodeId, child: NodeId) -> Option<NodeId> {
        self.node(event).children.iter().copied().find(|&c| c != child)
    }

    /// Lazy postorder from the roots: children always precede parents.
    pub fn postorder(&self) -> Postorder<'_> {
        Postorder::new(self)
    }

    /// Reverse of the materialized postorder: parents precede children.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.postorder_cache.iter().rev().copied()
    }

    /// Human-readable label for a node, e.g. `(p, h)` or `T@(p, h)`.
    pub fn label(&self, id: NodeId) -> String {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Map(m) => m.to_string(),
            NodeKind::Event(kind) => match node.parents.first() {
                Some(&parent) => format!("{}@{}", kind, self.label(parent)),
                None => kind.to_string(),
            },
        }
    }
}

/// Kahn's algorithm over the whole arena; leftovers mean a cycle.
fn check_acyclic(nodes: &[Node]) -> Result<(), MalformedGraphError> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.parents.len()).collect();
    let mut ready: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut processed = 0usize;

    while let Some(i) = ready.pop_front() {
        processed += 1;
        for child in &nodes[i].children {
            in_degree[child.0] -= 1;
            if in_degree[child.0] == 0 {
                ready.push_back(child.0);
            }
        }
    }

    if processed == nodes.len() {
        return Ok(());
    }

    // Every cycle alternates kinds, so it passes through a map node.
    let stuck = nodes
        .iter()
        .zip(&in_degree)
        .filter(|(_, d)| **d > 0)
        .find_map(|(n, _)| n.mapping().cloned());
    match stuck {
        Some(mapping) => Err(MalformedGraphError::Cycle(mapping)),
        None => Err(MalformedGraphError::NoRoot),
    }
}
