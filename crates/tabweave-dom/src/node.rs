//! Document nodes
//!
//! Nodes store their tree position as plain sibling/parent links. Element
//! state is limited to what input handling needs: classification, tab index,
//! disabled/checked flags, group name and the display/position styles that
//! feed the visibility signals.

use crate::NodeId;

/// A single node in the document arena.
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create a new element node.
    pub fn element(kind: ElementKind) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(kind)))
    }

    /// Create a new text node.
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(TextData { content }))
    }

    /// Create a document node.
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    fn with_data(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    /// Check if this is an element.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element.
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data.
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node.
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
}

/// Element classification.
///
/// A closed set of categories instead of open-ended tag names: the input
/// engine only distinguishes interactive controls, generic containers and
/// vector-graphic content without regular box metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Link element.
    Anchor,
    /// Button element.
    Button,
    /// Select/listbox control.
    Select,
    /// Multi-line text control.
    TextArea,
    /// Form input control.
    Input(InputKind),
    /// Generic block or inline container.
    Container,
    /// Vector graphics element; has no offset box metrics.
    Vector,
}

impl ElementKind {
    /// Tab index used when no explicit one is set.
    ///
    /// Interactive controls are reachable with Tab by default, containers and
    /// vector content are not.
    pub fn default_tab_index(self) -> i32 {
        match self {
            Self::Anchor | Self::Button | Self::Select | Self::TextArea | Self::Input(_) => 0,
            Self::Container | Self::Vector => -1,
        }
    }
}

/// Input control types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Checkbox,
    Radio,
}

/// Computed display style, reduced to what visibility checks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Normal,
    None,
}

/// Positioning scheme, reduced to what offset-parent resolution needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Fixed,
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Classification of this element.
    pub kind: ElementKind,
    /// Explicit tab index, overriding the kind default.
    pub tab_index: Option<i32>,
    /// Disabled form control.
    pub disabled: bool,
    /// Checked state for checkbox/radio controls.
    pub checked: bool,
    /// Group name (radio group membership).
    pub name: Option<String>,
    /// Computed display style.
    pub display: Display,
    /// Positioning scheme.
    pub position: Position,
}

impl ElementData {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            tab_index: None,
            disabled: false,
            checked: false,
            name: None,
            display: Display::default(),
            position: Position::default(),
        }
    }

    /// Effective tab index: the explicit value or the kind default.
    pub fn effective_tab_index(&self) -> i32 {
        self.tab_index.unwrap_or_else(|| self.kind.default_tab_index())
    }
}

/// Text node data
#[derive(Debug)]
pub struct TextData {
    pub content: String,
}
