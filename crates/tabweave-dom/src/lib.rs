//! tabweave DOM - host document model
//!
//! Arena-backed document tree with child-list mutation observation, focus
//! control and the geometry/visibility signals consumed by the focus
//! traversal engine.

mod document;
mod mutation;
mod node;
mod walker;

pub use document::{Document, DomError, DomResult, FocusChange};
pub use mutation::{MutationCallback, MutationRecord, MutationWatch};
pub use node::{Display, ElementData, ElementKind, InputKind, Node, NodeData, Position, TextData};
pub use walker::{FilterDecision, TreeWalker};

/// Node identifier (index into the document arena).
///
/// An id stays valid after its node is detached from the tree, so callers can
/// hold one across structural changes without keeping the node reachable or
/// re-querying a position that no longer exists. Arena slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Index into the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
