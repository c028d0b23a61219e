use log::debug;
use smallvec::SmallVec;

use super::{Hand, NodeId};
use crate::buffer::RefGrowBuffer;
use crate::config::TreeConfig;
use crate::error::Result;

/// A node slot of an [`AncestrallyOrderedBinaryTree`]. A slot without a value
/// is a hole.
#[derive(Debug, Clone)]
pub struct BinaryNode<T> {
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    value: Option<T>,
}

impl<T> BinaryNode<T> {
    #[inline]
    fn hole() -> Self {
        Self {
            parent: NodeId::NIL,
            left: NodeId::NIL,
            right: NodeId::NIL,
            value: None,
        }
    }

    #[inline]
    fn leaf(parent: NodeId, value: T) -> Self {
        Self {
            parent,
            left: NodeId::NIL,
            right: NodeId::NIL,
            value: Some(value),
        }
    }

    #[inline]
    pub fn is_hole(&self) -> bool {
        self.value.is_none()
    }

    /// `None` for the root and for holes.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent.get()
    }

    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.left.get()
    }

    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.right.get()
    }

    #[inline]
    pub fn child(&self, hand: Hand) -> Option<NodeId> {
        match hand {
            Hand::Left => self.left(),
            Hand::Right => self.right(),
        }
    }

    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// A binary tree in one flat array where every node sits at a higher index
/// than its parent.
///
/// New children take the first hole after their parent, or are appended.
/// Removing a node frees its whole subtree and leaves holes behind; nodes are
/// never moved except by [`compact`](Self::compact), which closes every hole
/// in a single left-to-right pass. Because parents always precede their
/// children, a pre-order walk never needs to look backwards.
///
/// ```
/// use stable_slots::{AncestrallyOrderedBinaryTree, NodeId};
///
/// let mut tree = AncestrallyOrderedBinaryTree::new("root");
/// let l = tree.create_left_child(NodeId::ROOT, "l");
/// let r = tree.create_right_child(NodeId::ROOT, "r");
/// tree.remove(l);
/// tree.compact();
/// assert_eq!(tree.node(NodeId::ROOT).unwrap().right(), Some(l));
/// assert_eq!(tree[l], "r");
/// assert!(r.index() > l.index());
/// ```
pub struct AncestrallyOrderedBinaryTree<T> {
    nodes: RefGrowBuffer<BinaryNode<T>>,
    holes: usize,
    compact_after: usize,
    shift_ops: u64,
}

impl<T> AncestrallyOrderedBinaryTree<T> {
    pub fn new(root: T) -> Self {
        Self::build(root, TreeConfig::default())
    }

    pub fn with_config(root: T, config: &TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(root, config.clone()))
    }

    fn build(root: T, config: TreeConfig) -> Self {
        let mut nodes = RefGrowBuffer::with_capacity(config.initial_capacity);
        nodes.push(BinaryNode::leaf(NodeId::NIL, root));
        Self {
            nodes,
            holes: 0,
            compact_after: config.compact_after_removals,
            shift_ops: 0,
        }
    }

    /// Number of live nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.holes
    }

    /// Always `false`: the root cannot be removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn hole_count(&self) -> usize {
        self.holes
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of contiguous node blocks moved by compaction so far.
    #[inline]
    pub fn shift_operations(&self) -> u64 {
        self.shift_ops
    }

    /// The live node at `id`.
    pub fn node(&self, id: NodeId) -> Option<&BinaryNode<T>> {
        self.nodes.get(id.index()).filter(|n| !n.is_hole())
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id.index()).and_then(BinaryNode::value)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.index()).and_then(|n| n.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn create_left_child(&mut self, parent: NodeId, value: T) -> NodeId {
        self.create_child(parent, Hand::Left, value)
    }

    pub fn create_right_child(&mut self, parent: NodeId, value: T) -> NodeId {
        self.create_child(parent, Hand::Right, value)
    }

    /// Attach a new node under `parent` on the given side.
    ///
    /// # Panics
    /// Panics if `parent` is not live or already has a child on that side.
    pub fn create_child(&mut self, parent: NodeId, hand: Hand, value: T) -> NodeId {
        let Some(p) = self.node(parent) else {
            panic!("cannot attach a child to vacant node {}", parent);
        };
        assert!(
            p.child(hand).is_none(),
            "node {} already has a {:?} child",
            parent,
            hand
        );

        let id = self.claim_slot_after(parent);
        self.nodes[id.index()] = BinaryNode::leaf(parent, value);
        let p = &mut self.nodes[parent.index()];
        match hand {
            Hand::Left => p.left = id,
            Hand::Right => p.right = id,
        }
        id
    }

    /// First hole past `parent`, or a fresh slot at the end.
    fn claim_slot_after(&mut self, parent: NodeId) -> NodeId {
        if self.holes > 0 {
            let start = parent.index() + 1;
            let found = self.nodes.as_slice()[start..]
                .iter()
                .position(BinaryNode::is_hole);
            if let Some(offset) = found {
                self.holes -= 1;
                return NodeId::new(start + offset);
            }
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(BinaryNode::hole());
        id
    }

    /// Remove `id` and its whole subtree. Returns the number of nodes freed.
    ///
    /// # Panics
    /// Panics if `id` is the root or not live.
    pub fn remove(&mut self, id: NodeId) -> usize {
        assert!(!id.is_root(), "cannot remove the root node");
        let parent = match self.node(id) {
            Some(node) => node.parent,
            None => panic!("node {} is not live", id),
        };

        let parent = &mut self.nodes[parent.index()];
        if parent.left == id {
            parent.left = NodeId::NIL;
        } else {
            debug_assert_eq!(parent.right, id, "node {} is unlinked from its parent", id);
            parent.right = NodeId::NIL;
        }

        let mut freed = 0;
        let mut pending: SmallVec<[NodeId; 16]> = SmallVec::new();
        pending.push(id);
        while let Some(next) = pending.pop() {
            let node = std::mem::replace(&mut self.nodes[next.index()], BinaryNode::hole());
            pending.extend(node.left.get());
            pending.extend(node.right.get());
            freed += 1;
        }
        self.holes += freed;

        if self.compact_after != 0 && self.holes > self.compact_after {
            self.compact();
        }
        freed
    }

    /// Close every hole by sliding live nodes left, rewriting the links of
    /// each moved node's parent and children. Ancestral order is preserved.
    ///
    /// Returns the number of nodes that moved.
    pub fn compact(&mut self) -> usize {
        if self.holes == 0 {
            return 0;
        }

        let len = self.nodes.len();
        let mut write = 1;
        let mut moved = 0;
        let mut in_gap = false;
        for read in 1..len {
            if self.nodes[read].is_hole() {
                in_gap = true;
                continue;
            }
            if read != write {
                if in_gap {
                    self.shift_ops += 1;
                    in_gap = false;
                }
                self.relocate(read, write);
                moved += 1;
            }
            write += 1;
        }

        debug!(
            "compacted binary tree: {} nodes moved, {} slots released",
            moved,
            len - write
        );
        self.nodes.truncate(write);
        self.holes = 0;
        moved
    }

    /// Move the node at `from` into the hole at `to`. The parent must already
    /// be at its final position; the children are still ahead of `from`.
    fn relocate(&mut self, from: usize, to: usize) {
        self.nodes.as_mut_slice().swap(from, to);
        let (old, new) = (NodeId::new(from), NodeId::new(to));
        let (parent, left, right) = {
            let n = &self.nodes[to];
            (n.parent, n.left, n.right)
        };

        let p = &mut self.nodes[parent.index()];
        if p.left == old {
            p.left = new;
        } else {
            p.right = new;
        }
        for child in [left, right] {
            if let Some(child) = child.get() {
                self.nodes[child.index()].parent = new;
            }
        }
    }

    /// Compact, then expose every node. The slice has no holes.
    pub fn compacted_nodes(&mut self) -> &[BinaryNode<T>] {
        self.compact();
        self.nodes.as_slice()
    }

    /// Drop every node except the root.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        let root = &mut self.nodes[0];
        root.left = NodeId::NIL;
        root.right = NodeId::NIL;
        self.holes = 0;
    }

    /// Live nodes in index order, which is also an ancestral order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BinaryNode<T>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.is_hole())
            .map(|(idx, n)| (NodeId::new(idx), n))
    }
}

impl<T> std::ops::Index<NodeId> for AncestrallyOrderedBinaryTree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.value(id) {
            Some(value) => value,
            None => panic!("node {} is not live", id),
        }
    }
}

impl<T> std::ops::IndexMut<NodeId> for AncestrallyOrderedBinaryTree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.value_mut(id) {
            Some(value) => value,
            None => panic!("node {} is not live", id),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AncestrallyOrderedBinaryTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(id, n)| (id, n.value())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(idx: usize) -> NodeId {
        NodeId::new(idx)
    }

    fn assert_ancestral(tree: &AncestrallyOrderedBinaryTree<u32>) {
        for (id, node) in tree.iter() {
            if let Some(parent) = node.parent() {
                assert!(parent < id, "{:?} precedes its parent {:?}", id, parent);
                let p = tree.node(parent).unwrap();
                assert!(p.left() == Some(id) || p.right() == Some(id));
            } else {
                assert!(id.is_root());
            }
            for child in [node.left(), node.right()].into_iter().flatten() {
                assert_eq!(tree.node(child).unwrap().parent(), Some(id));
            }
        }
    }

    #[test]
    fn test_children_follow_parent() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let l = tree.create_left_child(NodeId::ROOT, 1);
        let r = tree.create_right_child(NodeId::ROOT, 2);
        let ll = tree.create_child(l, Hand::Left, 3);
        assert_eq!((l, r, ll), (id(1), id(2), id(3)));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node(NodeId::ROOT).unwrap().child(Hand::Right), Some(r));
        assert_ancestral(&tree);
    }

    #[test]
    fn test_remove_then_compact_moves_right_child() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let l = tree.create_left_child(NodeId::ROOT, 1);
        tree.create_right_child(NodeId::ROOT, 2);
        assert_eq!(tree.remove(l), 1);
        assert_eq!(tree.hole_count(), 1);

        assert_eq!(tree.compact(), 1);
        let root = tree.node(NodeId::ROOT).unwrap();
        assert_eq!(root.right(), Some(id(1)));
        assert_eq!(root.left(), None);
        assert_eq!(tree[id(1)], 2);
        assert_eq!(tree.node(id(1)).unwrap().parent(), Some(NodeId::ROOT));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.hole_count(), 0);
        assert_eq!(tree.shift_operations(), 1);
    }

    #[test]
    fn test_compact_without_holes_is_noop() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let l = tree.create_left_child(NodeId::ROOT, 1);
        tree.create_right_child(l, 2);
        assert_eq!(tree.compact(), 0);
        assert_eq!(tree.shift_operations(), 0);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_removal_cascades() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let a = tree.create_left_child(NodeId::ROOT, 1);
        let b = tree.create_left_child(a, 2);
        let c = tree.create_right_child(a, 3);
        tree.create_left_child(b, 4);
        let keep = tree.create_right_child(NodeId::ROOT, 5);

        assert_eq!(tree.remove(a), 4);
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains(c));
        assert!(tree.contains(keep));
        assert_eq!(tree.node(NodeId::ROOT).unwrap().left(), None);
    }

    #[test]
    fn test_compact_multiple_gaps() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let a = tree.create_left_child(NodeId::ROOT, 1);
        let b = tree.create_right_child(NodeId::ROOT, 2);
        tree.create_left_child(a, 3);
        tree.create_left_child(b, 4);
        tree.create_right_child(b, 5);

        // Frees slots 1 and 3.
        tree.remove(a);
        assert_eq!(tree.compact(), 3);
        assert_eq!(tree.shift_operations(), 2);
        assert_ancestral(&tree);

        let b = tree.node(id(1)).unwrap();
        assert_eq!(b.value(), Some(&2));
        assert_eq!(b.left(), Some(id(2)));
        assert_eq!(b.right(), Some(id(3)));
        assert_eq!(tree[id(2)], 4);
        assert_eq!(tree[id(3)], 5);
        assert_eq!(tree.compacted_nodes().len(), 4);
    }

    #[test]
    fn test_hole_reuse_only_after_parent() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let a = tree.create_left_child(NodeId::ROOT, 1);
        let b = tree.create_right_child(NodeId::ROOT, 2);
        tree.remove(a);

        // The only hole sits before `b`, so the child is appended.
        let bl = tree.create_left_child(b, 3);
        assert_eq!(bl, id(3));
        assert_eq!(tree.hole_count(), 1);

        // The root may reuse it.
        assert_eq!(tree.create_left_child(NodeId::ROOT, 4), id(1));
        assert_eq!(tree.hole_count(), 0);
        assert_ancestral(&tree);
    }

    #[test]
    fn test_auto_compact() {
        let cfg = TreeConfig {
            initial_capacity: 4,
            compact_after_removals: 1,
        };
        let mut tree = AncestrallyOrderedBinaryTree::with_config(0, &cfg).unwrap();
        let a = tree.create_left_child(NodeId::ROOT, 1);
        let b = tree.create_right_child(NodeId::ROOT, 2);
        tree.create_left_child(b, 3);
        tree.remove(a);
        assert_eq!(tree.hole_count(), 1);

        let c = tree.create_right_child(id(3), 4);
        tree.remove(c);
        assert_eq!(tree.hole_count(), 0);
        assert_eq!(tree.len(), 3);
        assert_ancestral(&tree);
    }

    #[test]
    fn test_clear_keeps_root() {
        let mut tree = AncestrallyOrderedBinaryTree::new(7);
        let a = tree.create_left_child(NodeId::ROOT, 1);
        tree.create_left_child(a, 2);
        tree.clear();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[NodeId::ROOT], 7);
        assert_eq!(tree.create_right_child(NodeId::ROOT, 3), id(1));
    }

    #[test]
    fn test_with_config_rejects_zero_capacity() {
        let cfg = TreeConfig {
            initial_capacity: 0,
            compact_after_removals: 0,
        };
        assert!(AncestrallyOrderedBinaryTree::with_config(1u8, &cfg).is_err());
    }

    #[test]
    #[should_panic(expected = "root")]
    fn test_remove_root_panics() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        tree.remove(NodeId::ROOT);
    }

    #[test]
    #[should_panic(expected = "vacant")]
    fn test_child_of_hole_panics() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        let a = tree.create_left_child(NodeId::ROOT, 1);
        tree.remove(a);
        tree.create_left_child(a, 2);
    }

    #[test]
    #[should_panic(expected = "already has")]
    fn test_duplicate_side_panics() {
        let mut tree = AncestrallyOrderedBinaryTree::new(0);
        tree.create_left_child(NodeId::ROOT, 1);
        tree.create_left_child(NodeId::ROOT, 2);
    }
}
