//! Child-adjacency structure for trees and resolved reconciliations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from node identifier to its list of children.
///
/// A `None` child is the "no child" sentinel: any node carrying one is a
/// leaf. Nodes that appear only as someone's child, with no entry of
/// their own, are leaves as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Deserialize<'de> + Ord"
))]
pub struct Adjacency<K> {
    children: BTreeMap<K, Vec<Option<K>>>,
}

impl<K: Ord + Clone> Adjacency<K> {
    /// Create an empty adjacency.
    pub fn new() -> Self {
        Self {
            children: BTreeMap::new(),
        }
    }

    /// Set the children of `node`, replacing any previous list.
    pub fn insert(&mut self, node: K, children: Vec<Option<K>>) {
        self.children.insert(node, children);
    }

    /// Add an internal node with two children.
    pub fn with_children(mut self, node: K, left: K, right: K) -> Self {
        self.insert(node, vec![Some(left), Some(right)]);
        self
    }

    /// Add a leaf (both children set to the sentinel).
    pub fn with_leaf(mut self, node: K) -> Self {
        self.insert(node, vec![None, None]);
        self
    }

    /// Children of `node`, if it has an entry.
    pub fn children(&self, node: &K) -> Option<&[Option<K>]> {
        self.children.get(node).map(Vec::as_slice)
    }

    /// Present (non-sentinel) children of `node`.
    pub fn present_children<'a>(&'a self, node: &K) -> impl Iterator<Item = &'a K> + 'a {
        self.children
            .get(node)
            .into_iter()
            .flat_map(|c| c.iter().flatten())
    }

    /// Nodes with an entry, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.children.keys()
    }

    /// Every node named anywhere: entries and referenced children.
    pub fn all_nodes(&self) -> BTreeSet<&K> {
        let mut all: BTreeSet<&K> = self.children.keys().collect();
        all.extend(self.children.values().flat_map(|c| c.iter().flatten()));
        all
    }

    /// Whether `node` is a leaf.
    pub fn is_leaf(&self, node: &K) -> bool {
        match self.children.get(node) {
            Some(children) => children.iter().any(Option::is_none),
            None => true,
        }
    }

    /// All leaves, in key order.
    pub fn leaves(&self) -> Vec<&K> {
        self.all_nodes()
            .into_iter()
            .filter(|n| self.is_leaf(n))
            .collect()
    }

    /// First node (in key order) that is nobody's child.
    pub fn root(&self) -> Option<&K> {
        let referenced: BTreeSet<&K> = self
            .children
            .values()
            .flat_map(|c| c.iter().flatten())
            .collect();
        self.children.keys().find(|k| !referenced.contains(k))
    }

    /// Every parent -> child edge, skipping sentinels.
    pub fn edges(&self) -> impl Iterator<Item = (&K, &K)> {
        self.children
            .iter()
            .flat_map(|(parent, c)| c.iter().flatten().map(move |child| (parent, child)))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<K: Ord + Clone> Default for Adjacency<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> FromIterator<(K, Vec<Option<K>>)> for Adjacency<K> {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Option<K>>)>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_tree() -> Adjacency<&'static str> {
        //      r
        //     / \
        //    a   b
        //   / \
        //  c   d
        Adjacency::new()
            .with_children("r", "a", "b")
            .with_children("a", "c", "d")
            .with_leaf("b")
            .with_leaf("c")
            .with_leaf("d")
    }

    #[test]
    fn test_root_is_unreferenced_node() {
        assert_eq!(host_tree().root(), Some(&"r"));
    }

    #[test]
    fn test_leaves() {
        assert_eq!(host_tree().leaves(), vec![&"b", &"c", &"d"]);
    }

    #[test]
    fn test_child_without_entry_is_leaf() {
        let t: Adjacency<&str> = Adjacency::new().with_children("r", "x", "y");
        assert!(t.is_leaf(&"x"));
        assert!(!t.is_leaf(&"r"));
        assert_eq!(t.all_nodes().len(), 3);
    }

    #[test]
    fn test_edges_skip_sentinels() {
        let edges: Vec<_> = host_tree().edges().map(|(p, c)| (*p, *c)).collect();
        assert_eq!(edges, vec![("a", "c"), ("a", "d"), ("r", "a"), ("r", "b")]);
    }

    #[test]
    fn test_serde_null_sentinel() {
        let json = r#"{"r": ["a", null], "a": [null, null]}"#;
        let t: Adjacency<String> = serde_json::from_str(json).unwrap();
        assert!(t.is_leaf(&"r".to_string()));
        assert_eq!(t.present_children(&"r".to_string()).count(), 1);
    }
}
