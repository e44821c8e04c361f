//! Document
//!
//! High-level document API: tree structure with child-list mutation records,
//! focus control and the render-geometry signals that visibility checks
//! consume.

use std::cell::RefCell;
use std::rc::Rc;

use crate::mutation::{MutationCallback, MutationHub, MutationRecord, MutationWatch};
use crate::node::{Display, ElementData, ElementKind, Node, NodeData, Position};
use crate::NodeId;

/// Result type for document operations
pub type DomResult<T> = Result<T, DomError>;

/// Document operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("node not found")]
    NotFound,
    /// Node is not a child of the given parent
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// Operation would create a cycle
    #[error("operation would create a cycle in the tree")]
    HierarchyRequest,
}

/// A focus or blur transition observed on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Focused(NodeId),
    Blurred(NodeId),
}

/// An in-memory document.
///
/// Nodes live in an arena addressed by [`NodeId`]; detached nodes keep their
/// slot, so ids held by observers outlive the node's presence in the tree.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    active_element: Option<NodeId>,
    focus_changes: Vec<FocusChange>,
    hub: Rc<RefCell<MutationHub>>,
}

impl Document {
    /// Create a document with a connected body element.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            active_element: None,
            focus_changes: Vec::new(),
            hub: Rc::new(RefCell::new(MutationHub::new())),
        };
        doc.root = doc.alloc(Node::document());
        doc.body = doc.alloc(Node::element(ElementKind::Container));
        doc.link_last(doc.root, doc.body);
        doc
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The body element, used as the implicit focus scope.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of nodes in the arena, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ----- node creation -----

    /// Allocate a detached element node.
    pub fn create_element(&mut self, kind: ElementKind) -> NodeId {
        self.alloc(Node::element(kind))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content.to_string()))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ----- tree reads -----

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Parent, restricted to element nodes.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent.filter(|&p| self.is_element(p))
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Iterate the direct children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = self.first_child(id);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.next_sibling(current);
            Some(current)
        })
    }

    /// Whether the node is attached to this document.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_or_contains(self.root, id)
    }

    /// Check if `root` is, or contains, `node`.
    ///
    /// Total for any pair of ids; detached nodes are only contained by their
    /// own detached subtree.
    pub fn is_or_contains(&self, root: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    // ----- element reads -----

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).is_element()
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).as_element()
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.node_mut(id).as_element_mut()
    }

    /// Element classification, if the node is an element.
    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        self.element(id).map(|e| e.kind)
    }

    /// Effective tab index. Non-elements are never tab-reachable.
    pub fn tab_index(&self, id: NodeId) -> i32 {
        self.element(id).map_or(-1, ElementData::effective_tab_index)
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.disabled)
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.checked)
    }

    pub fn group_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.name.as_deref())
    }

    pub fn is_display_none(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.display == Display::None)
    }

    /// Connected elements carrying the given group name. Unordered.
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|&id| {
                self.element(id).is_some_and(|e| e.name.as_deref() == Some(name))
                    && self.is_connected(id)
            })
            .collect()
    }

    // ----- element writes -----

    pub fn set_tab_index(&mut self, id: NodeId, tab_index: Option<i32>) {
        if let Some(element) = self.element_mut(id) {
            element.tab_index = tab_index;
        }
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(element) = self.element_mut(id) {
            element.disabled = disabled;
        }
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(element) = self.element_mut(id) {
            element.checked = checked;
        }
    }

    pub fn set_group_name(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.name = Some(name.to_string());
        }
    }

    pub fn set_display(&mut self, id: NodeId, display: Display) {
        if let Some(element) = self.element_mut(id) {
            element.display = display;
        }
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) {
        if let Some(element) = self.element_mut(id) {
            element.position = position;
        }
    }

    // ----- geometry / visibility signals -----

    /// Whether offset box metrics exist for this element category.
    pub fn supports_box_metrics(&self, id: NodeId) -> bool {
        !matches!(self.kind(id), Some(ElementKind::Vector))
    }

    /// Number of client rectangles the element currently occupies.
    ///
    /// Non-zero iff the element is connected and no element in its inclusive
    /// ancestor chain is display-none.
    pub fn client_rect_count(&self, id: NodeId) -> usize {
        if !self.is_connected(id) {
            return 0;
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_display_none(current) {
                return 0;
            }
            cursor = self.parent(current);
        }
        1
    }

    /// Nearest rendered ancestor used for offset metrics.
    ///
    /// `None` for detached elements, elements inside a display-none chain,
    /// fixed-position elements and the body itself.
    pub fn offset_parent(&self, id: NodeId) -> Option<NodeId> {
        let element = self.element(id)?;
        if !self.is_connected(id)
            || element.display == Display::None
            || element.position == Position::Fixed
            || id == self.body
        {
            return None;
        }
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if let Some(data) = self.element(ancestor) {
                if data.display == Display::None {
                    return None;
                }
                if data.position == Position::Fixed || ancestor == self.body {
                    return Some(ancestor);
                }
            }
            cursor = self.parent(ancestor);
        }
        None
    }

    // ----- focus control -----

    /// The element holding focus, if any.
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Move focus to an element. Focusing a non-element is ignored.
    pub fn focus(&mut self, id: NodeId) {
        if !self.is_element(id) || self.active_element == Some(id) {
            return;
        }
        if let Some(previous) = self.active_element.take() {
            self.focus_changes.push(FocusChange::Blurred(previous));
        }
        self.active_element = Some(id);
        self.focus_changes.push(FocusChange::Focused(id));
        tracing::trace!(node = ?id, "element focused");
    }

    /// Remove focus from the active element, if any.
    pub fn blur(&mut self) {
        if let Some(previous) = self.active_element.take() {
            self.focus_changes.push(FocusChange::Blurred(previous));
        }
    }

    /// Drain recorded focus/blur transitions, in order.
    pub fn take_focus_changes(&mut self) -> Vec<FocusChange> {
        std::mem::take(&mut self.focus_changes)
    }

    // ----- mutation observation -----

    /// Subscribe to child-list changes of a node, pull-only.
    pub fn observe_children(&self, node: NodeId) -> MutationWatch {
        let slot = self.hub.borrow_mut().subscribe(node, None);
        MutationWatch::new(Rc::clone(&self.hub), slot, node)
    }

    /// Subscribe to child-list changes of a node with a push callback.
    ///
    /// The callback fires on [`Document::deliver_mutations`]; records can
    /// still be drained early through [`MutationWatch::take_records`].
    pub fn observe_children_with(&self, node: NodeId, callback: MutationCallback) -> MutationWatch {
        let slot = self.hub.borrow_mut().subscribe(node, Some(callback));
        MutationWatch::new(Rc::clone(&self.hub), slot, node)
    }

    /// Deliver queued records to all push subscriptions.
    ///
    /// Stands in for the host environment's microtask batch. Callbacks may
    /// subscribe and unsubscribe re-entrantly; records queued from within a
    /// callback are delivered in the same call.
    pub fn deliver_mutations(&self) {
        loop {
            let batch = self.hub.borrow_mut().take_deliverable();
            if batch.is_empty() {
                break;
            }
            for (callback, records) in batch {
                (callback.borrow_mut())(self, &records);
            }
        }
    }

    fn publish(&mut self, record: MutationRecord) {
        self.hub.borrow_mut().publish(&record);
    }

    // ----- tree writes -----

    /// Append a child as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end.
    ///
    /// An attached child is moved: it is detached first, which emits a
    /// removal record for its old parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.is_or_contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }

        if self.parent(child).is_some() {
            self.detach(child);
        }

        match reference {
            Some(reference) => self.link_before(parent, child, reference),
            None => self.link_last(parent, child),
        }

        let record = MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
            previous_sibling: self.prev_sibling(child),
            next_sibling: self.next_sibling(child),
        };
        self.publish(record);
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child);
        Ok(())
    }

    /// Remove a node from its parent. Removing a detached node is a no-op.
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        if self.get(node).is_none() {
            return Err(DomError::NotFound);
        }
        if self.parent(node).is_some() {
            self.detach(node);
        }
        Ok(())
    }

    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let prev = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = None;
        }
        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
        }
        self.node_mut(parent).last_child = Some(child);
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        let prev = self.node(reference).prev_sibling;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        self.node_mut(reference).prev_sibling = Some(child);
        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(child);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        {
            // residual links on the removed node read as None afterwards
            let node = self.node_mut(child);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }

        if let Some(active) = self.active_element {
            if self.is_or_contains(child, active) {
                tracing::trace!(removed = ?child, "active element left the tree");
                self.blur();
            }
        }

        self.publish(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
            previous_sibling: prev,
            next_sibling: next,
        });
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("active_element", &self.active_element)
            .finish()
    }
}
