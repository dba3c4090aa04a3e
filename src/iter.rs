use core::iter::FusedIterator;

use crate::{Color, NodeId, RbTree};

/// An iterator over the `(key, color)` pairs of an [`RbTree`] in ascending key order.
///
/// Created by [`RbTree::in_order`]. The walk follows parent links, so it needs no stack and no
/// allocation.
pub struct InOrder<'tree, K> {
    tree: &'tree RbTree<K>,

    // The root of the subtree being walked. The walk ends on climbing out of it.
    top: NodeId,
    next: NodeId,
}

impl<'tree, K> InOrder<'tree, K> {
    pub(crate) fn new(tree: &'tree RbTree<K>, top: NodeId) -> Self {
        let next = if top.is_nil() {
            NodeId::NIL
        } else {
            tree.min_in_subtree(top)
        };

        InOrder { tree, top, next }
    }

    pub(crate) fn next_id(&mut self) -> Option<NodeId> {
        if self.next.is_nil() {
            return None;
        }

        let cur = self.next;
        self.next = self.successor(cur);
        Some(cur)
    }

    // Returns the node after `cur` in key order, or the sentinel if `cur` is the last node of the
    // subtree.
    fn successor(&self, mut cur: NodeId) -> NodeId {
        // If the right subtree is not empty, its minimum is next.
        let right = self.tree.links(cur).right();
        if !right.is_nil() {
            return self.tree.min_in_subtree(right);
        }

        // Otherwise, ascend until we leave a left subtree.
        loop {
            let parent = self.tree.links(cur).parent();
            if cur == self.top || parent.is_nil() {
                return NodeId::NIL;
            }

            if self.tree.links(parent).left() == cur {
                return parent;
            }

            cur = parent;
        }
    }
}

impl<'tree, K> Iterator for InOrder<'tree, K> {
    type Item = (&'tree K, Color);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next_id()?;
        Some((self.tree.key(cur), self.tree.color(cur)))
    }
}

impl<K> FusedIterator for InOrder<'_, K> {}

impl<K> Clone for InOrder<'_, K> {
    fn clone(&self) -> Self {
        InOrder {
            tree: self.tree,
            top: self.top,
            next: self.next,
        }
    }
}

/// An iterator over the keys of an [`RbTree`] in ascending order.
///
/// Created by [`RbTree::keys`].
pub struct Keys<'tree, K> {
    inner: InOrder<'tree, K>,
}

impl<'tree, K> Keys<'tree, K> {
    pub(crate) fn new(inner: InOrder<'tree, K>) -> Self {
        Keys { inner }
    }
}

impl<'tree, K> Iterator for Keys<'tree, K> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }
}

impl<K> FusedIterator for Keys<'_, K> {}

impl<K> Clone for Keys<'_, K> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}
