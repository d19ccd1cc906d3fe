//! Worklist traversals over a [`ReconGraph`].
//!
//! Postorder uses an explicit stack instead of recursion, so deep host
//! and parasite trees cannot overflow the call stack.

use super::{NodeId, ReconGraph};

/// Lazy postorder over every node reachable from the roots.
///
/// A popped node with unvisited children is pushed back beneath them and
/// revisited once they are done. Each node is yielded exactly once.
/// Not restartable: call [`ReconGraph::postorder`] again for a new pass.
pub struct Postorder<'g> {
    graph: &'g ReconGraph,
    stack: Vec<NodeId>,
    visited: Vec<bool>,
}

impl<'g> Postorder<'g> {
    pub(super) fn new(graph: &'g ReconGraph) -> Self {
        Self {
            graph,
            stack: graph.roots.clone(),
            visited: vec![false; graph.nodes.len()],
        }
    }
}

impl Iterator for Postorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            // Shared sub-mappings can be queued more than once.
            if self.visited[id.0] {
                continue;
            }

            let mut deferred = false;
            for &child in self.graph.node(id).children() {
                if !self.visited[child.0] {
                    if !deferred {
                        self.stack.push(id);
                        deferred = true;
                    }
                    self.stack.push(child);
                }
            }

            if !deferred {
                self.visited[id.0] = true;
                return Some(id);
            }
        }
        None
    }
}
