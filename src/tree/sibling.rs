use smallvec::SmallVec;

use super::NodeId;
use crate::config::TreeConfig;
use crate::error::Result;
use crate::slots::StableIndexSlotArray;
use crate::tombstone::Tombstone;

/// A node slot of a [`SiblingChainTree`].
#[derive(Debug, Clone)]
pub struct SiblingNode<T> {
    parent: NodeId,
    child: NodeId,
    stack_sibling: NodeId,
    overlay_sibling: NodeId,
    is_overlay: bool,
    value: Option<T>,
}

impl<T> SiblingNode<T> {
    fn new(parent: NodeId, is_overlay: bool, value: T) -> Self {
        Self {
            parent,
            child: NodeId::NIL,
            stack_sibling: NodeId::NIL,
            overlay_sibling: NodeId::NIL,
            is_overlay,
            value: Some(value),
        }
    }

    /// `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent.get()
    }

    /// First node of this node's child chain.
    #[inline]
    pub fn child(&self) -> Option<NodeId> {
        self.child.get()
    }

    #[inline]
    pub fn stack_sibling(&self) -> Option<NodeId> {
        self.stack_sibling.get()
    }

    #[inline]
    pub fn overlay_sibling(&self) -> Option<NodeId> {
        self.overlay_sibling.get()
    }

    /// Whether this node hangs off another node's overlay chain rather than
    /// its parent's stack chain.
    #[inline]
    pub fn is_overlay(&self) -> bool {
        self.is_overlay
    }

    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T> Tombstone for SiblingNode<T> {
    fn tombstone() -> Self {
        Self {
            parent: NodeId::NIL,
            child: NodeId::NIL,
            stack_sibling: NodeId::NIL,
            overlay_sibling: NodeId::NIL,
            is_overlay: false,
            value: None,
        }
    }

    #[inline]
    fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// An n-ary tree encoded with sibling links instead of child arrays.
///
/// Each node points at its first child and at the next node of its stack
/// chain, so the children of a node are the stack chain that starts at its
/// `child` link. A stack member may additionally carry an overlay chain of
/// alternatives (for example layered variants of the same element) linked
/// through `overlay_sibling`. Overlays share the stack member's parent and
/// may have children of their own.
///
/// Nodes live in a [`StableIndexSlotArray`], which also takes care of hole
/// reuse, so removal never moves nodes and no compaction exists.
pub struct SiblingChainTree<T> {
    nodes: StableIndexSlotArray<SiblingNode<T>>,
}

impl<T> SiblingChainTree<T> {
    pub fn new(root: T) -> Self {
        Self::build(root, TreeConfig::default().initial_capacity)
    }

    pub fn with_config(root: T, config: &TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(root, config.initial_capacity))
    }

    fn build(root: T, capacity: usize) -> Self {
        let mut nodes = StableIndexSlotArray::new(capacity);
        let idx = nodes.add(SiblingNode::new(NodeId::NIL, false, root));
        debug_assert_eq!(idx, NodeId::ROOT.index());
        Self { nodes }
    }

    /// Number of live nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root cannot be removed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn node(&self, id: NodeId) -> Option<&SiblingNode<T>> {
        self.nodes.get(id.index())
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.node(id).and_then(SiblingNode::value)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.index()).and_then(|n| n.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn live(&self, id: NodeId) -> &SiblingNode<T> {
        match self.node(id) {
            Some(node) => node,
            None => panic!("node {} is not live", id),
        }
    }

    #[inline]
    fn link_mut(&mut self, id: NodeId) -> &mut SiblingNode<T> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    fn insert(&mut self, node: SiblingNode<T>) -> NodeId {
        NodeId::new(self.nodes.add(node))
    }

    /// Append a child to the end of `parent`'s child chain.
    ///
    /// # Panics
    /// Panics if `parent` is not live.
    pub fn create_child(&mut self, parent: NodeId, value: T) -> NodeId {
        let first = self.live(parent).child;
        let id = self.insert(SiblingNode::new(parent, false, value));
        match first.get() {
            None => self.link_mut(parent).child = id,
            Some(first) => {
                let tail = self.stack_tail(first);
                self.link_mut(tail).stack_sibling = id;
            }
        }
        id
    }

    /// Insert a node into the stack chain directly after `node`.
    ///
    /// # Panics
    /// Panics if `node` is the root, an overlay, or not live.
    pub fn create_stack_sibling(&mut self, node: NodeId, value: T) -> NodeId {
        assert!(!node.is_root(), "the root has no siblings");
        let n = self.live(node);
        assert!(!n.is_overlay, "overlay node {} has no stack chain", node);
        let (parent, next) = (n.parent, n.stack_sibling);

        let id = self.insert(SiblingNode::new(parent, false, value));
        self.link_mut(id).stack_sibling = next;
        self.link_mut(node).stack_sibling = id;
        id
    }

    /// Insert an overlay directly after `node` in its overlay chain.
    ///
    /// # Panics
    /// Panics if `node` is the root or not live.
    pub fn create_overlay_sibling(&mut self, node: NodeId, value: T) -> NodeId {
        assert!(!node.is_root(), "the root has no siblings");
        let n = self.live(node);
        let (parent, next) = (n.parent, n.overlay_sibling);

        let id = self.insert(SiblingNode::new(parent, true, value));
        self.link_mut(id).overlay_sibling = next;
        self.link_mut(node).overlay_sibling = id;
        id
    }

    fn stack_tail(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self.nodes[id.index()].stack_sibling.get() {
            id = next;
        }
        id
    }

    /// Remove `id` with its children and, for a stack member, its overlays.
    /// The chain that referenced `id` is relinked around it. Returns the
    /// number of nodes freed.
    ///
    /// # Panics
    /// Panics if `id` is the root or not live.
    pub fn remove(&mut self, id: NodeId) -> usize {
        assert!(!id.is_root(), "cannot remove the root node");
        let target = self.live(id);
        let (parent, is_overlay) = (target.parent, target.is_overlay);
        let (next_stack, next_overlay) = (target.stack_sibling, target.overlay_sibling);

        self.detach(id, parent, is_overlay, next_stack, next_overlay);

        let mut pending: SmallVec<[NodeId; 16]> = SmallVec::new();
        pending.extend(self.nodes[id.index()].child.get());
        if !is_overlay {
            pending.extend(next_overlay.get());
        }
        self.nodes.remove_at(id.index());

        let mut freed = 1;
        while let Some(next) = pending.pop() {
            let n = &self.nodes[next.index()];
            pending.extend(n.child.get());
            pending.extend(n.stack_sibling.get());
            pending.extend(n.overlay_sibling.get());
            self.nodes.remove_at(next.index());
            freed += 1;
        }
        freed
    }

    /// Unlink `id` from whichever chain under `parent` points at it.
    fn detach(
        &mut self,
        id: NodeId,
        parent: NodeId,
        is_overlay: bool,
        next_stack: NodeId,
        next_overlay: NodeId,
    ) {
        let mut member = self.nodes[parent.index()].child;
        if !is_overlay {
            if member == id {
                self.link_mut(parent).child = next_stack;
                return;
            }
            while let Some(m) = member.get() {
                let node = self.link_mut(m);
                if node.stack_sibling == id {
                    node.stack_sibling = next_stack;
                    return;
                }
                member = node.stack_sibling;
            }
        } else {
            while let Some(m) = member.get() {
                let mut prev = m;
                while let Some(o) = self.nodes[prev.index()].overlay_sibling.get() {
                    if o == id {
                        self.link_mut(prev).overlay_sibling = next_overlay;
                        return;
                    }
                    prev = o;
                }
                member = self.nodes[m.index()].stack_sibling;
            }
        }
        debug_assert!(false, "node {} is not linked under its parent {}", id, parent);
    }

    /// Drop every node except the root.
    pub fn clear(&mut self) {
        while let Some(last) = self.nodes.last_index() {
            if last == NodeId::ROOT.index() {
                break;
            }
            self.nodes.remove_at(last);
        }
        self.link_mut(NodeId::ROOT).child = NodeId::NIL;
    }

    /// The child chain of `id`.
    pub fn children(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            next: self.node(id).map_or(NodeId::NIL, |n| n.child),
        }
    }

    /// The overlays that follow `id` in its overlay chain.
    pub fn overlays(&self, id: NodeId) -> Overlays<'_, T> {
        Overlays {
            tree: self,
            next: self.node(id).map_or(NodeId::NIL, |n| n.overlay_sibling),
        }
    }

    /// Pre-order walk from the root yielding each node with its depth.
    ///
    /// A node is followed by the rest of its stack chain, then its child
    /// chain, then its overlays, each walked the same way. Siblings `a, b, c`
    /// therefore all come before any of their children, and the last
    /// sibling's subtree is walked first. Depth grows only along child links.
    pub fn pre_order(&self) -> PreOrder<'_, T> {
        let mut stack = SmallVec::new();
        stack.push(Frame {
            id: NodeId::ROOT,
            depth: 0,
        });
        PreOrder { tree: self, stack }
    }

    pub fn visit(&self, mut f: impl FnMut(NodeId, &T, usize)) {
        for (id, value, depth) in self.pre_order() {
            f(id, value, depth);
        }
    }

    pub fn visit_mut(&mut self, mut f: impl FnMut(NodeId, &mut T, usize)) {
        let order: Vec<(NodeId, usize)> =
            self.pre_order().map(|(id, _, depth)| (id, depth)).collect();
        for (id, depth) in order {
            if let Some(value) = self.value_mut(id) {
                f(id, value, depth);
            }
        }
    }

    /// Descend from the root through the first matching node of each child
    /// chain and return the last match. Overlays are never considered.
    pub fn find_first_deepest(&self, mut pred: impl FnMut(&T) -> bool) -> Option<NodeId> {
        let mut found = None;
        let mut chain = self.nodes[NodeId::ROOT.index()].child;
        'descend: while let Some(mut member) = chain.get() {
            loop {
                let node = &self.nodes[member.index()];
                if node.value.as_ref().map_or(false, &mut pred) {
                    found = Some(member);
                    chain = node.child;
                    continue 'descend;
                }
                match node.stack_sibling.get() {
                    Some(next) => member = next,
                    None => break 'descend,
                }
            }
        }
        found
    }
}

impl<T> std::ops::Index<NodeId> for SiblingChainTree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.value(id) {
            Some(value) => value,
            None => panic!("node {} is not live", id),
        }
    }
}

impl<T> std::ops::IndexMut<NodeId> for SiblingChainTree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.value_mut(id) {
            Some(value) => value,
            None => panic!("node {} is not live", id),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SiblingChainTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.pre_order().map(|(id, value, depth)| (id, depth, value)))
            .finish()
    }
}

// ==================================
// Iterators.
// ==================================

/// Stack chain iterator returned by [`SiblingChainTree::children`].
pub struct Children<'a, T> {
    tree: &'a SiblingChainTree<T>,
    next: NodeId,
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next.get()?;
        self.next = self.tree.nodes[id.index()].stack_sibling;
        Some(id)
    }
}

/// Overlay chain iterator returned by [`SiblingChainTree::overlays`].
pub struct Overlays<'a, T> {
    tree: &'a SiblingChainTree<T>,
    next: NodeId,
}

impl<'a, T> Iterator for Overlays<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next.get()?;
        self.next = self.tree.nodes[id.index()].overlay_sibling;
        Some(id)
    }
}

#[derive(Clone, Copy)]
struct Frame {
    id: NodeId,
    depth: usize,
}

/// Iterator returned by [`SiblingChainTree::pre_order`].
pub struct PreOrder<'a, T> {
    tree: &'a SiblingChainTree<T>,
    stack: SmallVec<[Frame; 32]>,
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = (NodeId, &'a T, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[frame.id.index()];

        // Every node hangs off exactly one link, so each is pushed once.
        // Pushed in reverse: overlays run last, the stack chain first.
        if let Some(overlay) = node.overlay_sibling.get() {
            self.stack.push(Frame {
                id: overlay,
                depth: frame.depth,
            });
        }
        if let Some(child) = node.child.get() {
            self.stack.push(Frame {
                id: child,
                depth: frame.depth + 1,
            });
        }
        if let Some(sibling) = node.stack_sibling.get() {
            self.stack.push(Frame {
                id: sibling,
                depth: frame.depth,
            });
        }

        let value = node.value.as_ref()?;
        Some((frame.id, value, frame.depth))
    }
}
