//! Keyboard focus traversal
//!
//! Sequential (Tab-style) focus navigation over a [`tabweave_dom::Document`]:
//! a visibility oracle, focusable-element queries, a node tracer that
//! survives removal of the focused element, and a controller that scopes
//! navigation with a stack of input layers.

mod controller;
mod focusable;
mod tracer;
mod visibility;

pub use controller::{FocusController, FocusError, FocusOptions, InputLayer, InputSource};
pub use focusable::{focusable_elements_walker, is_focus_unpreferred, is_focusable};
pub use tracer::NodeTracer;
pub use visibility::is_element_visible;
