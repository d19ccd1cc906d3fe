//! Raw reconciliation-graph description, as produced by the DP stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::canonical::canonical_hash_hex;
use crate::types::{EventKind, Mapping};

/// One event achievable at a mapping.
///
/// `left`/`right` are the child mappings; `None` marks "no child" where
/// the event ends a lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// Event type.
    pub kind: EventKind,
    /// First child mapping.
    #[serde(default)]
    pub left: Option<Mapping>,
    /// Second child mapping.
    #[serde(default)]
    pub right: Option<Mapping>,
    /// Event weight from the scoring stage (carried, not used for counting).
    #[serde(default)]
    pub weight: f64,
}

impl EventDescriptor {
    /// Create an event with explicit child slots and unit weight.
    pub fn new(kind: EventKind, left: Option<Mapping>, right: Option<Mapping>) -> Self {
        Self {
            kind,
            left,
            right,
            weight: 1.0,
        }
    }

    /// Binary event (cospeciation, duplication, transfer) with both children.
    pub fn binary(kind: EventKind, left: Mapping, right: Mapping) -> Self {
        Self::new(kind, Some(left), Some(right))
    }

    /// Leaf-pair event: no children.
    pub fn leaf_pair() -> Self {
        Self::new(EventKind::LeafPair, None, None)
    }

    /// Loss event continuing into a single child.
    pub fn loss(child: Mapping) -> Self {
        Self::new(EventKind::Loss, Some(child), None)
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Present child mappings, in slot order.
    pub fn child_mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.left.iter().chain(self.right.iter())
    }
}

/// All events achievable at one mapping, plus its aggregate score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// The (parasite, host) key.
    pub mapping: Mapping,
    /// Alternative events at this mapping.
    pub events: Vec<EventDescriptor>,
    /// Aggregate score of the mapping (ignored by counting).
    #[serde(default)]
    pub score: f64,
}

/// Full reconciliation-graph input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconGraphInput {
    /// One entry per mapping key.
    pub entries: Vec<MappingEntry>,
}

impl ReconGraphInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping with its events.
    pub fn with_mapping(mut self, mapping: Mapping, events: Vec<EventDescriptor>, score: f64) -> Self {
        self.entries.push(MappingEntry {
            mapping,
            events,
            score,
        });
        self
    }

    /// Every mapping used as some event's child.
    pub fn child_mappings(&self) -> BTreeSet<&Mapping> {
        self.entries
            .iter()
            .flat_map(|e| e.events.iter())
            .flat_map(EventDescriptor::child_mappings)
            .collect()
    }

    /// Mapping keys that are never a child: the roots of the graph.
    pub fn root_mappings(&self) -> BTreeSet<&Mapping> {
        let children = self.child_mappings();
        self.entries
            .iter()
            .map(|e| &e.mapping)
            .filter(|m| !children.contains(m))
            .collect()
    }

    /// Number of mapping entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical fingerprint of the input, stable across runs.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}
