//! Node tracer
//!
//! Keeps a reference to a node and, once that node or one of its ancestors is
//! removed from the tree, freezes an approximation of its former position as
//! a pair of sibling references. The approximation can be used to decide
//! where focus should go after the node is gone, without keeping the node in
//! the tree or re-querying a position that no longer exists.
//!
//! One child-list watch is held per ancestor level between the boundary root
//! and the target's parent. Reads drain pending mutation records first, so
//! the tracer never reports state that is stale relative to mutations already
//! queued for delivery.

use std::cell::RefCell;
use std::rc::Rc;

use tabweave_dom::{Document, MutationCallback, MutationRecord, MutationWatch, NodeId};

/// Approximates the location of a node in a document after it has been
/// removed.
///
/// While the target is attached, `target` returns it and both sibling
/// accessors return `None`. Once the target or an ancestor is removed,
/// `target` returns `None` and the sibling accessors return the removed
/// node's neighbours at removal time, walked outward through the ancestor
/// levels when a removed level had no siblings of its own. If a resolved
/// sibling is itself removed later, that side re-resolves independently.
pub struct NodeTracer {
    state: Rc<RefCell<TracerState>>,
}

struct TracerState {
    /// Mutations above this node are invisible to the tracer.
    boundary: Option<NodeId>,
    /// Ancestor chain from the boundary (inclusive) down to the target.
    nodes: Vec<NodeId>,
    /// One watch per chain entry except the target itself.
    watches: Vec<MutationWatch>,
    target: Option<NodeId>,
    previous_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeTracer {
    /// Create a tracer observing the whole document.
    pub fn new() -> Self {
        Self::with_state(None)
    }

    /// Create a tracer that never observes or reports anything above
    /// `boundary`; removal of the boundary itself goes unnoticed.
    pub fn with_boundary(boundary: NodeId) -> Self {
        Self::with_state(Some(boundary))
    }

    fn with_state(boundary: Option<NodeId>) -> Self {
        Self {
            state: Rc::new(RefCell::new(TracerState {
                boundary,
                nodes: Vec::new(),
                watches: Vec::new(),
                target: None,
                previous_sibling: None,
                next_sibling: None,
            })),
        }
    }

    /// Set the target node, discarding any frozen sibling approximation.
    ///
    /// The ancestor chain and its watches are rebuilt; watches whose node is
    /// unchanged at their level are kept as-is.
    pub fn set_target(&self, doc: &Document, target: Option<NodeId>) {
        let mut state = self.state.borrow_mut();
        state.target = target;
        state.previous_sibling = None;
        state.next_sibling = None;

        state.nodes.clear();
        let mut cursor = target;
        while let Some(node) = cursor {
            state.nodes.insert(0, node);
            if Some(node) == state.boundary {
                break;
            }
            cursor = doc.parent(node);
        }

        let levels = state.nodes.len().saturating_sub(1);
        for level in 0..levels {
            let watched = state.nodes[level];
            let up_to_date = state
                .watches
                .get(level)
                .is_some_and(|watch| watch.node() == watched);
            if !up_to_date {
                let watch = doc.observe_children_with(watched, self.level_callback(level));
                if level < state.watches.len() {
                    state.watches[level] = watch;
                } else {
                    state.watches.push(watch);
                }
            }
        }
        state.watches.truncate(levels);
    }

    /// The target node, or `None` after the target or an ancestor has been
    /// removed.
    pub fn target(&self, doc: &Document) -> Option<NodeId> {
        self.flush_pending(doc);
        self.state.borrow().target
    }

    /// The previous sibling of the removed target or the nearest removed
    /// ancestor. `None` while the target is attached or when no sibling
    /// exists up to the boundary.
    pub fn previous_sibling(&self, doc: &Document) -> Option<NodeId> {
        self.flush_pending(doc);
        self.state.borrow().previous_sibling
    }

    /// The next sibling counterpart of [`previous_sibling`](Self::previous_sibling).
    pub fn next_sibling(&self, doc: &Document) -> Option<NodeId> {
        self.flush_pending(doc);
        self.state.borrow().next_sibling
    }

    /// Stop observing the target.
    pub fn disconnect(&self, doc: &Document) {
        self.set_target(doc, None);
    }

    /// Drain and process pending records from all watches, in level order.
    fn flush_pending(&self, doc: &Document) {
        let mut level = 0;
        loop {
            let records = {
                let state = self.state.borrow();
                match state.watches.get(level) {
                    Some(watch) => watch.take_records(),
                    None => break,
                }
            };
            if !records.is_empty() {
                Self::process(&self.state, doc, &records, level);
            }
            level += 1;
        }
    }

    fn level_callback(&self, level: usize) -> MutationCallback {
        let state = Rc::downgrade(&self.state);
        Rc::new(RefCell::new(
            move |doc: &Document, records: &[MutationRecord]| {
                if let Some(state) = state.upgrade() {
                    NodeTracer::process(&state, doc, records, level);
                }
            },
        ))
    }

    /// Process records reported by the watch at `level`, in record order.
    ///
    /// When several levels are removed within one batch, the outermost
    /// removal wins: detaching at a level drops all watches below it, so
    /// records from inner levels are either already applied and overwritten
    /// or discarded with their watch.
    fn process(state: &Rc<RefCell<TracerState>>, doc: &Document, records: &[MutationRecord], level: usize) {
        let mut state = state.borrow_mut();
        for record in records {
            let chain_child = state.nodes.get(level + 1).copied();
            if chain_child.is_some_and(|child| record.removed.contains(&child)) {
                let previous = state.resolve_previous(doc, record, chain_child);
                let next = state.resolve_next(doc, record, chain_child);
                state.target = None;
                state.previous_sibling = previous;
                state.next_sibling = next;
                state.watches.truncate(level + 1);
                state.nodes.truncate(level + 1);
                tracing::trace!(level, "traced node detached");
            } else if state.target.is_none() {
                if state
                    .previous_sibling
                    .is_some_and(|sibling| record.removed.contains(&sibling))
                {
                    let resolved = state.resolve_previous(doc, record, None);
                    state.previous_sibling = resolved;
                }
                if state
                    .next_sibling
                    .is_some_and(|sibling| record.removed.contains(&sibling))
                {
                    let resolved = state.resolve_next(doc, record, None);
                    state.next_sibling = resolved;
                }
            }
        }
    }
}

impl Default for NodeTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("NodeTracer")
            .field("target", &state.target)
            .field("previous_sibling", &state.previous_sibling)
            .field("next_sibling", &state.next_sibling)
            .finish()
    }
}

impl TracerState {
    /// Previous sibling for a node that has been removed: the record's
    /// sibling snapshot, the removed node's residual links, or the first
    /// ancestor sibling found walking outward from the removal point, never
    /// crossing the boundary.
    fn resolve_previous(
        &self,
        doc: &Document,
        record: &MutationRecord,
        removed: Option<NodeId>,
    ) -> Option<NodeId> {
        if let Some(sibling) = record.previous_sibling {
            return Some(sibling);
        }
        if let Some(node) = removed {
            if let Some(sibling) = doc.prev_sibling(node) {
                return Some(sibling);
            }
        }
        let mut cursor = Some(record.target);
        while let Some(node) = cursor {
            if Some(node) == self.boundary {
                return None;
            }
            if let Some(sibling) = doc.prev_sibling(node) {
                return Some(sibling);
            }
            cursor = doc.parent(node);
        }
        None
    }

    /// Mirror of [`resolve_previous`](Self::resolve_previous).
    fn resolve_next(
        &self,
        doc: &Document,
        record: &MutationRecord,
        removed: Option<NodeId>,
    ) -> Option<NodeId> {
        if let Some(sibling) = record.next_sibling {
            return Some(sibling);
        }
        if let Some(node) = removed {
            if let Some(sibling) = doc.next_sibling(node) {
                return Some(sibling);
            }
        }
        let mut cursor = Some(record.target);
        while let Some(node) = cursor {
            if Some(node) == self.boundary {
                return None;
            }
            if let Some(sibling) = doc.next_sibling(node) {
                return Some(sibling);
            }
            cursor = doc.parent(node);
        }
        None
    }
}
