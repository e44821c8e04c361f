//! Visibility oracle
//!
//! Decides whether an element is meaningfully rendered, from the host
//! geometry signals alone: offset-parent resolution, display styles and
//! client rectangles. Pure; recursion is bounded by the ancestor chain.

use tabweave_dom::{Document, NodeId};

/// Check if the specified element is visible in the document.
///
/// Element categories without box metrics fall back to their client
/// rectangles. Elements without an offset parent (the body itself,
/// fixed-position elements, hidden or detached ones) are resolved through
/// their own display style and their parent chain.
pub fn is_element_visible(doc: &Document, element: NodeId) -> bool {
    if !doc.is_element(element) {
        return false;
    }
    if !doc.supports_box_metrics(element) {
        return doc.client_rect_count(element) > 0;
    }
    if doc.offset_parent(element).is_none() {
        if element == doc.body() {
            return !doc.is_display_none(element);
        }
        return match doc.parent_element(element) {
            Some(parent) if !doc.is_display_none(element) => is_element_visible(doc, parent),
            _ => false,
        };
    }
    if !doc.is_connected(element) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabweave_dom::{Display, ElementKind, Position};

    fn attach(doc: &mut Document, kind: ElementKind) -> NodeId {
        let id = doc.create_element(kind);
        let body = doc.body();
        doc.append_child(body, id).unwrap();
        id
    }

    #[test]
    fn test_detached_element() {
        let mut doc = Document::new();
        let element = doc.create_element(ElementKind::Container);
        assert!(!is_element_visible(&doc, element));
    }

    #[test]
    fn test_detached_nested_element() {
        let mut doc = Document::new();
        let outer = doc.create_element(ElementKind::Container);
        let inner = doc.create_element(ElementKind::Container);
        doc.append_child(outer, inner).unwrap();
        assert!(!is_element_visible(&doc, inner));
    }

    #[test]
    fn test_nested_element() {
        let mut doc = Document::new();
        let outer = attach(&mut doc, ElementKind::Container);
        let inner = doc.create_element(ElementKind::Container);
        doc.append_child(outer, inner).unwrap();
        assert!(is_element_visible(&doc, inner));
    }

    #[test]
    fn test_display_none() {
        let mut doc = Document::new();
        let element = attach(&mut doc, ElementKind::Container);
        doc.set_display(element, Display::None);
        assert!(!is_element_visible(&doc, element));
    }

    #[test]
    fn test_parent_display_none() {
        let mut doc = Document::new();
        let outer = attach(&mut doc, ElementKind::Container);
        let inner = doc.create_element(ElementKind::Container);
        doc.append_child(outer, inner).unwrap();
        doc.set_display(outer, Display::None);
        assert!(!is_element_visible(&doc, inner));
    }

    #[test]
    fn test_fixed_position() {
        let mut doc = Document::new();
        let outer = attach(&mut doc, ElementKind::Container);
        let fixed = doc.create_element(ElementKind::Container);
        doc.append_child(outer, fixed).unwrap();
        doc.set_position(fixed, Position::Fixed);
        assert!(is_element_visible(&doc, fixed));
    }

    #[test]
    fn test_fixed_position_with_parent_display_none() {
        let mut doc = Document::new();
        let outer = attach(&mut doc, ElementKind::Container);
        let fixed = doc.create_element(ElementKind::Container);
        doc.append_child(outer, fixed).unwrap();
        doc.set_position(fixed, Position::Fixed);
        doc.set_display(outer, Display::None);
        assert!(!is_element_visible(&doc, fixed));
    }

    #[test]
    fn test_fixed_position_and_display_none() {
        let mut doc = Document::new();
        let fixed = attach(&mut doc, ElementKind::Container);
        doc.set_position(fixed, Position::Fixed);
        doc.set_display(fixed, Display::None);
        assert!(!is_element_visible(&doc, fixed));
    }

    #[test]
    fn test_detached_fixed_position() {
        let mut doc = Document::new();
        let fixed = doc.create_element(ElementKind::Container);
        doc.set_position(fixed, Position::Fixed);
        assert!(!is_element_visible(&doc, fixed));
    }

    #[test]
    fn test_child_of_fixed_position_parent() {
        let mut doc = Document::new();
        let fixed = attach(&mut doc, ElementKind::Container);
        let inner = doc.create_element(ElementKind::Container);
        doc.append_child(fixed, inner).unwrap();
        doc.set_position(fixed, Position::Fixed);
        assert!(is_element_visible(&doc, inner));
    }

    #[test]
    fn test_body_element() {
        let mut doc = Document::new();
        let body = doc.body();
        assert!(is_element_visible(&doc, body));
        doc.set_display(body, Display::None);
        assert!(!is_element_visible(&doc, body));
    }

    #[test]
    fn test_vector_element_uses_client_rects() {
        let mut doc = Document::new();
        let vector = attach(&mut doc, ElementKind::Vector);
        assert!(is_element_visible(&doc, vector));

        let detached = doc.create_element(ElementKind::Vector);
        assert!(!is_element_visible(&doc, detached));

        let wrapper = attach(&mut doc, ElementKind::Container);
        let hidden = doc.create_element(ElementKind::Vector);
        doc.append_child(wrapper, hidden).unwrap();
        doc.set_display(wrapper, Display::None);
        assert!(!is_element_visible(&doc, hidden));
    }

    #[test]
    fn test_text_node_is_not_visible() {
        let mut doc = Document::new();
        let text = doc.create_text("label");
        let body = doc.body();
        doc.append_child(body, text).unwrap();
        assert!(!is_element_visible(&doc, text));
    }
}
