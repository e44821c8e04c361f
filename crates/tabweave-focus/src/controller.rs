//! Focus controller
//!
//! Sequential Tab-style navigation over a document, scoped by a stack of
//! input layers. The controller tracks the node of interest with a
//! [`NodeTracer`], so navigation keeps a sensible position even after the
//! focused element is removed from the tree, and classifies the current
//! input modality so focus is only restored for keyboard users.

use tabweave_dom::{Document, NodeId};

use crate::focusable::{focusable_elements_walker, is_focus_unpreferred, is_focusable};
use crate::tracer::NodeTracer;

/// Focus navigation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FocusError {
    /// An input layer for this root already exists
    #[error("an input layer for this root already exists")]
    LayerExists,
}

/// Modality of the input event that most recently reached the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Pointer,
    Touch,
}

/// Navigation behaviour switches.
#[derive(Debug, Clone, Copy)]
pub struct FocusOptions {
    /// Wrap around to the other end of the scope when navigation runs off it.
    pub cycle_focus: bool,
    /// Blur focus that lands outside the current input layer.
    pub prevent_invalid_focus: bool,
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            cycle_focus: true,
            prevent_invalid_focus: false,
        }
    }
}

/// Handle to an entry of the input layer stack.
///
/// Holds the layer root and the element that was focused outside the layer
/// when it was created, for restoration after disposal. Disposing through a
/// stale handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLayer {
    id: u64,
    root: NodeId,
    last_active_element: Option<NodeId>,
}

impl InputLayer {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The element that held focus outside this layer when it was created.
    pub fn last_active_element(&self) -> Option<NodeId> {
        self.last_active_element
    }
}

type LayerListener = Box<dyn FnMut(&InputLayer)>;

/// Scoped sequential focus navigation.
pub struct FocusController {
    options: FocusOptions,
    layers: Vec<InputLayer>,
    tracer: NodeTracer,
    keyboard_input: bool,
    layer_listeners: Vec<LayerListener>,
    next_layer_id: u64,
}

impl FocusController {
    pub fn new() -> Self {
        Self::with_options(FocusOptions::default())
    }

    pub fn with_options(options: FocusOptions) -> Self {
        Self {
            options,
            layers: Vec::new(),
            tracer: NodeTracer::new(),
            keyboard_input: false,
            layer_listeners: Vec::new(),
            next_layer_id: 0,
        }
    }

    /// The root that currently scopes navigation: the top input layer, or
    /// the body when the stack is empty.
    pub fn scope_root(&self, doc: &Document) -> NodeId {
        self.layers.last().map_or(doc.body(), |layer| layer.root)
    }

    /// Whether the most recent input was keyboard input.
    pub fn is_keyboard_input(&self) -> bool {
        self.keyboard_input
    }

    /// Record the modality of an input event.
    pub fn note_input(&mut self, source: InputSource) {
        self.keyboard_input = source == InputSource::Keyboard;
    }

    /// Register a callback invoked whenever an input layer is created.
    pub fn on_layer_created(&mut self, listener: impl FnMut(&InputLayer) + 'static) {
        self.layer_listeners.push(Box::new(listener));
    }

    // ----- input layers -----

    /// Push an input layer scoping navigation to `root`.
    ///
    /// An element focused outside the new layer is blurred and captured on
    /// the returned handle as [`InputLayer::last_active_element`].
    pub fn create_input_layer(
        &mut self,
        doc: &mut Document,
        root: NodeId,
    ) -> Result<InputLayer, FocusError> {
        if self.layers.iter().any(|layer| layer.root == root) {
            return Err(FocusError::LayerExists);
        }

        let last_active = doc
            .active_element()
            .filter(|&active| !doc.is_or_contains(root, active));
        if last_active.is_some() {
            doc.blur();
        }

        let layer = InputLayer {
            id: self.next_layer_id,
            root,
            last_active_element: last_active,
        };
        self.next_layer_id += 1;
        self.layers.push(layer);
        self.tracer.set_target(doc, Some(root));
        tracing::debug!(root = ?root, depth = self.layers.len(), "input layer created");

        for listener in &mut self.layer_listeners {
            listener(&layer);
        }
        Ok(layer)
    }

    /// Pop an input layer. Disposing an already disposed layer is a no-op.
    pub fn dispose_layer(&mut self, doc: &Document, layer: &InputLayer) {
        let Some(position) = self.layers.iter().position(|entry| entry.id == layer.id) else {
            return;
        };
        let was_top = position + 1 == self.layers.len();
        self.layers.remove(position);
        if was_top {
            match self.layers.last() {
                Some(top) => self.tracer.set_target(doc, Some(top.root)),
                None => self.tracer.disconnect(doc),
            }
        }
        tracing::debug!(root = ?layer.root, depth = self.layers.len(), "input layer disposed");
    }

    // ----- host notifications -----

    /// Record a focus transition observed by the host.
    ///
    /// Focus inside the current scope becomes the node of interest. Focus
    /// outside it is rejected (blurred) when `prevent_invalid_focus` is set.
    /// Returns whether the focus was accepted.
    pub fn note_focus(&mut self, doc: &mut Document, target: NodeId) -> bool {
        let scope = self.scope_root(doc);
        if doc.is_or_contains(scope, target) {
            if target != doc.body() {
                self.tracer.set_target(doc, Some(target));
            }
            return true;
        }
        if self.options.prevent_invalid_focus {
            doc.blur();
            tracing::debug!(target = ?target, "focus outside the active layer rejected");
            return false;
        }
        true
    }

    /// Focus `node` if keyboard input is current, nothing meaningful holds
    /// focus, and the node is a focusable member of the current scope.
    pub fn restore_focus(&mut self, doc: &mut Document, node: NodeId) -> bool {
        if !self.keyboard_input {
            return false;
        }
        let active = doc.active_element();
        if active.is_some() && active != Some(doc.body()) {
            return false;
        }
        let scope = self.scope_root(doc);
        if !doc.is_or_contains(scope, node) || !is_focusable(doc, node) {
            return false;
        }
        doc.focus(node);
        self.tracer.set_target(doc, Some(node));
        true
    }

    // ----- navigation -----

    /// Move focus to the next focusable element in the current scope.
    /// Returns whether an element received focus.
    pub fn focus_next(&mut self, doc: &mut Document) -> bool {
        self.focus_in_direction(doc, true)
    }

    /// Move focus to the previous focusable element in the current scope.
    pub fn focus_previous(&mut self, doc: &mut Document) -> bool {
        self.focus_in_direction(doc, false)
    }

    /// Pick the navigation start position, step the walker once in the
    /// requested direction, cycle from the scope root if allowed, and focus
    /// the result.
    ///
    /// The walker is built per call; a focus notification arriving while it
    /// runs cannot corrupt it.
    fn focus_in_direction(&mut self, doc: &mut Document, forward: bool) -> bool {
        let scope = self.scope_root(doc);
        let mut walker = focusable_elements_walker(scope, false);

        let mut start = None;
        let active = doc
            .active_element()
            .filter(|&active| active != doc.body() && doc.is_or_contains(scope, active));
        if let Some(active) = active {
            start = Some(active);
        } else if is_focusable(doc, scope) && !is_focus_unpreferred(doc, scope) {
            // a focusable scope root is the entry point of its layer
            doc.focus(scope);
            self.tracer.set_target(doc, Some(scope));
            tracing::trace!(node = ?scope, "focus moved to scope root");
            return true;
        } else if let Some(target) = self.tracer.target(doc) {
            if doc.is_or_contains(scope, target) {
                if is_focusable(doc, target) && !is_focus_unpreferred(doc, target) {
                    doc.focus(target);
                    return true;
                }
                start = Some(target);
            }
        } else {
            // the target is gone: resume from its frozen position. The
            // sibling on the departure side is stepped over; a sibling on
            // the arrival side occupies the vacated position itself.
            let (behind, ahead) = if forward {
                (self.tracer.previous_sibling(doc), self.tracer.next_sibling(doc))
            } else {
                (self.tracer.next_sibling(doc), self.tracer.previous_sibling(doc))
            };
            let in_scope = |node: &NodeId| doc.is_or_contains(scope, *node) && *node != scope;
            if let Some(behind) = behind.filter(in_scope) {
                start = Some(behind);
            } else if let Some(ahead) = ahead.filter(in_scope) {
                if is_focusable(doc, ahead) && !is_focus_unpreferred(doc, ahead) {
                    doc.focus(ahead);
                    self.tracer.set_target(doc, Some(ahead));
                    return true;
                }
                start = Some(ahead);
            }
        }

        let mut found = match start {
            Some(start) if start != scope => {
                walker.set_current(start);
                if forward {
                    walker.next_node(doc)
                } else {
                    walker.previous_node(doc)
                }
            }
            _ => {
                if forward {
                    walker.first_child(doc)
                } else {
                    walker.last_child(doc)
                }
            }
        };
        if found.is_none() && self.options.cycle_focus && start.is_some_and(|s| s != scope) {
            walker.set_current(scope);
            found = if forward {
                walker.first_child(doc)
            } else {
                walker.last_child(doc)
            };
        }

        match found {
            Some(node) => {
                doc.focus(node);
                self.tracer.set_target(doc, Some(node));
                tracing::trace!(node = ?node, forward, "focus moved");
                true
            }
            None => false,
        }
    }
}

impl Default for FocusController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FocusController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusController")
            .field("options", &self.options)
            .field("layers", &self.layers)
            .field("keyboard_input", &self.keyboard_input)
            .finish()
    }
}
