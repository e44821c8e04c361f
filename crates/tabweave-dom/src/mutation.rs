//! Child-list mutation observation
//!
//! Subscriptions are per node and only cover direct child-list changes.
//! Records queue per subscription; they reach the subscriber either as a
//! batch through [`Document::deliver_mutations`] or synchronously through
//! [`MutationWatch::take_records`]. Record order within one drain is
//! preserved.
//!
//! [`Document::deliver_mutations`]: crate::Document::deliver_mutations

use std::cell::RefCell;
use std::rc::Rc;

use crate::{Document, NodeId};

/// A recorded child-list change.
///
/// The sibling fields snapshot the neighbours of the change position at the
/// time of the mutation; for removals they are the removed node's former
/// siblings.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// The node whose child list changed.
    pub target: NodeId,
    /// Nodes inserted by this change.
    pub added: Vec<NodeId>,
    /// Nodes removed by this change.
    pub removed: Vec<NodeId>,
    /// Sibling preceding the change position, at mutation time.
    pub previous_sibling: Option<NodeId>,
    /// Sibling following the change position, at mutation time.
    pub next_sibling: Option<NodeId>,
}

/// Push delivery callback for a subscription.
pub type MutationCallback = Rc<RefCell<dyn FnMut(&Document, &[MutationRecord])>>;

pub(crate) struct MutationHub {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
}

struct Slot {
    node: NodeId,
    pending: Vec<MutationRecord>,
    callback: Option<MutationCallback>,
}

impl MutationHub {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, node: NodeId, callback: Option<MutationCallback>) -> usize {
        let slot = Slot {
            node,
            pending: Vec::new(),
            callback,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    pub(crate) fn unsubscribe(&mut self, index: usize) {
        if let Some(entry) = self.slots.get_mut(index) {
            if entry.take().is_some() {
                self.free.push(index);
            }
        }
    }

    /// Queue a record on every subscription watching its target.
    pub(crate) fn publish(&mut self, record: &MutationRecord) {
        for slot in self.slots.iter_mut().flatten() {
            if slot.node == record.target {
                slot.pending.push(record.clone());
            }
        }
    }

    pub(crate) fn take_records(&mut self, index: usize) -> Vec<MutationRecord> {
        match self.slots.get_mut(index) {
            Some(Some(slot)) => std::mem::take(&mut slot.pending),
            _ => Vec::new(),
        }
    }

    /// Drain pending records of all push subscriptions into one batch.
    ///
    /// Pull-only subscriptions keep their queues; those are drained by the
    /// subscriber through [`MutationWatch::take_records`].
    pub(crate) fn take_deliverable(&mut self) -> Vec<(MutationCallback, Vec<MutationRecord>)> {
        let mut batch = Vec::new();
        for slot in self.slots.iter_mut().flatten() {
            if slot.pending.is_empty() {
                continue;
            }
            if let Some(callback) = &slot.callback {
                batch.push((Rc::clone(callback), std::mem::take(&mut slot.pending)));
            }
        }
        batch
    }
}

/// A live child-list subscription.
///
/// Unsubscribes when dropped; pending records that were never drained are
/// discarded with it.
pub struct MutationWatch {
    hub: Rc<RefCell<MutationHub>>,
    slot: usize,
    node: NodeId,
}

impl MutationWatch {
    pub(crate) fn new(hub: Rc<RefCell<MutationHub>>, slot: usize, node: NodeId) -> Self {
        Self { hub, slot, node }
    }

    /// The watched node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Synchronously drain this subscription's pending records.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        self.hub.borrow_mut().take_records(self.slot)
    }
}

impl Drop for MutationWatch {
    fn drop(&mut self) {
        self.hub.borrow_mut().unsubscribe(self.slot);
    }
}

impl std::fmt::Debug for MutationWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationWatch")
            .field("slot", &self.slot)
            .field("node", &self.node)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, ElementKind};

    #[test]
    fn test_take_records_preserves_order() {
        let mut doc = Document::new();
        let parent = doc.create_element(ElementKind::Container);
        doc.append_child(doc.body(), parent).unwrap();

        let a = doc.create_element(ElementKind::Container);
        let b = doc.create_element(ElementKind::Container);
        doc.append_child(parent, a).unwrap();
        doc.append_child(parent, b).unwrap();

        let watch = doc.observe_children(parent);
        doc.remove(a).unwrap();
        doc.remove(b).unwrap();

        let records = watch.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].removed, vec![a]);
        assert_eq!(records[1].removed, vec![b]);
        assert!(watch.take_records().is_empty());
    }

    #[test]
    fn test_removal_record_snapshots_siblings() {
        let mut doc = Document::new();
        let a = doc.create_element(ElementKind::Container);
        let b = doc.create_element(ElementKind::Container);
        let c = doc.create_element(ElementKind::Container);
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();
        doc.append_child(doc.body(), c).unwrap();

        let watch = doc.observe_children(doc.body());
        doc.remove(b).unwrap();

        let records = watch.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, doc.body());
        assert_eq!(records[0].previous_sibling, Some(a));
        assert_eq!(records[0].next_sibling, Some(c));
        // residual links on the removed node are cleared
        assert_eq!(doc.prev_sibling(b), None);
        assert_eq!(doc.next_sibling(b), None);
        assert_eq!(doc.parent(b), None);
    }

    #[test]
    fn test_only_watched_node_receives_records() {
        let mut doc = Document::new();
        let outer = doc.create_element(ElementKind::Container);
        let inner = doc.create_element(ElementKind::Container);
        let child = doc.create_element(ElementKind::Container);
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.append_child(inner, child).unwrap();

        let outer_watch = doc.observe_children(outer);
        doc.remove(child).unwrap();
        assert!(outer_watch.take_records().is_empty());

        doc.remove(inner).unwrap();
        let records = outer_watch.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].removed, vec![inner]);
    }

    #[test]
    fn test_deliver_invokes_push_callbacks() {
        let mut doc = Document::new();
        let child = doc.create_element(ElementKind::Container);
        doc.append_child(doc.body(), child).unwrap();

        let seen: Rc<RefCell<Vec<NodeId>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback: MutationCallback =
            Rc::new(RefCell::new(move |_doc: &Document, records: &[MutationRecord]| {
                for record in records {
                    sink.borrow_mut().extend(record.removed.iter().copied());
                }
            }));
        let _watch = doc.observe_children_with(doc.body(), callback);

        doc.remove(child).unwrap();
        assert!(seen.borrow().is_empty());

        doc.deliver_mutations();
        assert_eq!(*seen.borrow(), vec![child]);

        // nothing pending after delivery
        doc.deliver_mutations();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_dropped_watch_stops_receiving() {
        let mut doc = Document::new();
        let child = doc.create_element(ElementKind::Container);
        doc.append_child(doc.body(), child).unwrap();

        let watch = doc.observe_children(doc.body());
        drop(watch);

        doc.remove(child).unwrap();
        // a fresh watch on the same node starts with an empty queue
        let watch = doc.observe_children(doc.body());
        assert!(watch.take_records().is_empty());
    }
}
