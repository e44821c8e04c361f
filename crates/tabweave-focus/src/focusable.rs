//! Focusable element queries
//!
//! Focusability combines element category, tab reachability, visibility and
//! the disabled flag. Radio groups additionally prefer their checked member,
//! so unchecked siblings of a checked radio are stepped over by default.

use tabweave_dom::{Document, ElementKind, FilterDecision, InputKind, NodeId, TreeWalker};

use crate::visibility::is_element_visible;

/// Check if the specified node can receive input focus:
/// the node is an element with a non-negative tab index, is visible in the
/// document and is not disabled.
pub fn is_focusable(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node)
        && doc.tab_index(node) >= 0
        && is_element_visible(doc, node)
        && !doc.is_disabled(node)
}

/// Check if focusing a focusable node would be unpreferred: the node is an
/// unchecked radio input whose group has at least one other enabled, checked
/// member.
///
/// The result is not defined for nodes that are not focusable; callers check
/// [`is_focusable`] first.
pub fn is_focus_unpreferred(doc: &Document, node: NodeId) -> bool {
    if doc.kind(node) != Some(ElementKind::Input(InputKind::Radio)) || doc.is_checked(node) {
        return false;
    }
    let Some(name) = doc.group_name(node) else {
        return false;
    };
    let group = doc.elements_named(name);
    if group.len() < 2 {
        return false;
    }
    group.iter().any(|&member| {
        matches!(doc.kind(member), Some(ElementKind::Input(_)))
            && doc.is_checked(member)
            && !doc.is_disabled(member)
    })
}

/// Create a tree walker that yields the focusable elements under `root`.
///
/// Elements that fail visibility or are disabled are pruned together with
/// their subtree; elements that are merely not focusable are stepped over
/// while their children stay reachable. When `include_unpreferred` is false,
/// unpreferred radio members are pruned as well.
pub fn focusable_elements_walker(
    root: NodeId,
    include_unpreferred: bool,
) -> TreeWalker<impl FnMut(&Document, NodeId) -> FilterDecision> {
    TreeWalker::new(root, move |doc: &Document, node: NodeId| {
        if !doc.is_element(node) {
            return FilterDecision::Skip;
        }
        if !is_element_visible(doc, node) || doc.is_disabled(node) {
            return FilterDecision::Reject;
        }
        if doc.tab_index(node) >= 0 {
            if !include_unpreferred && is_focus_unpreferred(doc, node) {
                return FilterDecision::Reject;
            }
            return FilterDecision::Accept;
        }
        FilterDecision::Skip
    })
}
