//! Filtered tree traversal
//!
//! A cursor over a subtree with a three-way filter: `Accept` yields a node,
//! `Skip` steps over it while keeping its children visitable, `Reject`
//! prunes it together with its whole subtree. The current node is not
//! required to satisfy the filter, so traversal can start from arbitrary
//! positions.

use crate::{Document, NodeId};

/// Per-node traversal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Yield the node.
    Accept,
    /// Do not yield the node, but descend into its children.
    Skip,
    /// Do not yield the node and do not descend into its subtree.
    Reject,
}

/// A filtered, bidirectional cursor over the subtree of `root`.
///
/// Traversal is document order for [`next_node`](Self::next_node) and
/// reverse document order for [`previous_node`](Self::previous_node).
#[derive(Debug)]
pub struct TreeWalker<F> {
    root: NodeId,
    current: NodeId,
    filter: F,
}

impl<F> TreeWalker<F>
where
    F: FnMut(&Document, NodeId) -> FilterDecision,
{
    /// Create a walker positioned at its root.
    pub fn new(root: NodeId, filter: F) -> Self {
        Self {
            root,
            current: root,
            filter,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Reposition the cursor. The node does not need to pass the filter.
    pub fn set_current(&mut self, node: NodeId) {
        self.current = node;
    }

    fn accept(&mut self, doc: &Document, node: NodeId) -> FilterDecision {
        (self.filter)(doc, node)
    }

    /// Move to the first accepted node among the current node's descendants.
    pub fn first_child(&mut self, doc: &Document) -> Option<NodeId> {
        self.traverse_children(doc, true)
    }

    /// Move to the last accepted node among the current node's descendants.
    pub fn last_child(&mut self, doc: &Document) -> Option<NodeId> {
        self.traverse_children(doc, false)
    }

    fn traverse_children(&mut self, doc: &Document, forward: bool) -> Option<NodeId> {
        let down = |doc: &Document, id: NodeId| {
            if forward {
                doc.first_child(id)
            } else {
                doc.last_child(id)
            }
        };
        let along = |doc: &Document, id: NodeId| {
            if forward {
                doc.next_sibling(id)
            } else {
                doc.prev_sibling(id)
            }
        };

        let start = self.current;
        let mut node = down(doc, start);
        while let Some(candidate) = node {
            match self.accept(doc, candidate) {
                FilterDecision::Accept => {
                    self.current = candidate;
                    return Some(candidate);
                }
                FilterDecision::Skip => {
                    if let Some(child) = down(doc, candidate) {
                        node = Some(child);
                        continue;
                    }
                }
                FilterDecision::Reject => {}
            }
            // no descent: advance to the next sibling, climbing as needed
            let mut cursor = candidate;
            node = loop {
                if let Some(sibling) = along(doc, cursor) {
                    break Some(sibling);
                }
                match doc.parent(cursor) {
                    None => return None,
                    Some(parent) if parent == self.root || parent == start => return None,
                    Some(parent) => cursor = parent,
                }
            };
        }
        None
    }

    /// Move to the next accepted node in document order.
    pub fn next_node(&mut self, doc: &Document) -> Option<NodeId> {
        let mut node = self.current;
        let mut decision = FilterDecision::Accept;
        loop {
            // descend while the subtree is not pruned
            while decision != FilterDecision::Reject {
                let Some(child) = doc.first_child(node) else {
                    break;
                };
                node = child;
                decision = self.accept(doc, node);
                if decision == FilterDecision::Accept {
                    self.current = node;
                    return Some(node);
                }
            }
            // advance past the (possibly pruned) subtree
            let mut cursor = Some(node);
            let mut sibling = None;
            while let Some(candidate) = cursor {
                if candidate == self.root {
                    return None;
                }
                if let Some(next) = doc.next_sibling(candidate) {
                    sibling = Some(next);
                    break;
                }
                cursor = doc.parent(candidate);
            }
            node = sibling?;
            decision = self.accept(doc, node);
            if decision == FilterDecision::Accept {
                self.current = node;
                return Some(node);
            }
        }
    }

    /// Move to the previous accepted node in document order.
    pub fn previous_node(&mut self, doc: &Document) -> Option<NodeId> {
        let mut node = self.current;
        while node != self.root {
            let mut sibling = doc.prev_sibling(node);
            while let Some(candidate) = sibling {
                node = candidate;
                let mut decision = self.accept(doc, node);
                // dive to the last descendant unless the subtree is pruned
                while decision != FilterDecision::Reject {
                    let Some(last) = doc.last_child(node) else {
                        break;
                    };
                    node = last;
                    decision = self.accept(doc, node);
                }
                if decision == FilterDecision::Accept {
                    self.current = node;
                    return Some(node);
                }
                sibling = doc.prev_sibling(node);
            }
            match doc.parent(node) {
                // the root bounds the traversal and is never yielded
                None => return None,
                Some(parent) if parent == self.root => return None,
                Some(parent) => node = parent,
            }
            if self.accept(doc, node) == FilterDecision::Accept {
                self.current = node;
                return Some(node);
            }
        }
        None
    }
}
