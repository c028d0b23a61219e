//! Trees stored in flat slot storage and linked by index.
//!
//! Both trees keep their root at index 0 for their whole lifetime. Links
//! between nodes are [`NodeId`]s rather than references, so a node can be
//! addressed across mutations for as long as it stays live.

mod binary;
mod sibling;

pub use binary::{AncestrallyOrderedBinaryTree, BinaryNode};
pub use sibling::{Children, Overlays, PreOrder, SiblingChainTree, SiblingNode};

/// Index of a node in its tree's storage.
///
/// Stored as `u32`; the all-ones value is reserved as the null link.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
    pub(crate) const NIL: NodeId = NodeId(u32::MAX);
    /// Largest number of node slots a tree can address.
    pub const MAX_NODES: usize = u32::MAX as usize;

    /// # Panics
    /// Panics if `idx` is outside the addressable node range.
    #[inline]
    pub fn new(idx: usize) -> Self {
        assert!(idx < Self::MAX_NODES, "node index {} out of range", idx);
        NodeId(idx as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    #[inline]
    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }

    /// `None` for the null link.
    #[inline]
    pub(crate) fn get(self) -> Option<NodeId> {
        if self.is_nil() {
            None
        } else {
            Some(self)
        }
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nil() {
            write!(f, "NodeId(nil)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeId> for usize {
    fn from(id: NodeId) -> usize {
        id.index()
    }
}

/// Which child slot of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}
