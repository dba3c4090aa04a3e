use core::{fmt, mem};

use crate::{Dir, RbTree};

/// A handle to a node slot in an [`RbTree`]'s arena.
///
/// Slots are recycled: once the node a handle refers to has been removed, a later insertion may
/// hand out the same `NodeId` for a different key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The sentinel slot. Never handed out to callers.
    pub(crate) const NIL: NodeId = NodeId(0);

    pub(crate) fn from_index(index: usize) -> NodeId {
        match u32::try_from(index) {
            Ok(index) => NodeId(index),
            Err(_) => panic!("node arena exceeded {} slots", u32::MAX),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The color of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Red => "RED",
            Color::Black => "BLACK",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Links {
    parent: NodeId,
    children: [NodeId; 2],
    color: Color,
}

impl Links {
    /// The links of the sentinel, and of every free slot.
    pub(crate) const SENTINEL: Links = Links {
        parent: NodeId::NIL,
        children: [NodeId::NIL; 2],
        color: Color::Black,
    };

    /// Links for a freshly inserted node: red, with two sentinel children.
    pub(crate) const fn new_red(parent: NodeId) -> Links {
        Links {
            parent,
            children: [NodeId::NIL; 2],
            color: Color::Red,
        }
    }

    #[inline]
    pub(crate) fn parent(&self) -> NodeId {
        self.parent
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> NodeId {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> NodeId {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> NodeId {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: NodeId) -> NodeId {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: NodeId) -> NodeId {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: NodeId) -> NodeId {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn set_right(&mut self, right: NodeId) -> NodeId {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// A shared reference to a live node of an [`RbTree`].
pub struct NodeRef<'tree, K> {
    tree: &'tree RbTree<K>,
    id: NodeId,
}

impl<'tree, K> NodeRef<'tree, K> {
    // `id` must name a live node of `tree`.
    pub(crate) fn new(tree: &'tree RbTree<K>, id: NodeId) -> Self {
        debug_assert!(tree.is_live(id));
        NodeRef { tree, id }
    }

    fn wrap(&self, id: NodeId) -> Option<NodeRef<'tree, K>> {
        (!id.is_nil()).then(|| NodeRef::new(self.tree, id))
    }

    /// Returns the arena handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &'tree K {
        self.tree.key(self.id)
    }

    pub fn color(&self) -> Color {
        self.tree.color(self.id)
    }

    /// Returns the parent node, or `None` if this is the root.
    pub fn parent(&self) -> Option<NodeRef<'tree, K>> {
        self.wrap(self.tree.links(self.id).parent())
    }

    pub fn left(&self) -> Option<NodeRef<'tree, K>> {
        self.wrap(self.tree.links(self.id).left())
    }

    pub fn right(&self) -> Option<NodeRef<'tree, K>> {
        self.wrap(self.tree.links(self.id).right())
    }
}

impl<K> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for NodeRef<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}
