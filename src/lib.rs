//! An arena-backed red-black tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`] rather than by pointer, so the
//! parent back-links need no `unsafe` and no reference counting. Slot 0 of the arena is the
//! sentinel: the single black "no node" marker used for every missing child and for the root's
//! parent.

// Conventions used in comments follow Cormen, Leiserson, Rivest and Stein:
// - `z` is the node being inserted or removed.
// - `y` is the node actually spliced out of its position by a removal (`z` itself, or `z`'s
//   successor when `z` has two children).
// - `x` is the node that moves into `y`'s old position, possibly the sentinel.
// - `w` is `x`'s sibling.
//
// The invariants of a red-black tree are:
// 1. Every node is red or black.
// 2. The root is black.
// 3. The sentinel is black.
// 4. A red node has no red child.
// 5. All paths from a node to its descendant sentinels contain the same number of black nodes.
//
// Corollary (from 4 and 5): a tree of `n` nodes has height at most `2 * log2(n + 1)`.
//
// The sentinel's links are written once, in `with_capacity_and_duplicates`, and never again.
// Because of that, the removal fixup cannot find `x`'s parent through `x` when `x` is the
// sentinel and carries it alongside `x` instead.

use core::{borrow::Borrow, cmp::Ordering, mem, ops::Not};

use log::{debug, trace};

mod config;
mod debug;
mod iter;
mod node;
mod verify;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use config::{Duplicates, Insertion};
pub use iter::{InOrder, Keys};
pub use node::{Color, NodeId, NodeRef};
pub use verify::InvariantViolation;

use node::Links;

/// A red-black tree of ordered keys.
///
/// Equal keys are kept, rejected or replaced according to the tree's [`Duplicates`] policy.
#[derive(Clone)]
pub struct RbTree<K> {
    // Index 0 is the sentinel.
    links: Vec<Links>,
    // Parallel to `links`. `None` for the sentinel and for free slots.
    keys: Vec<Option<K>>,
    free: Vec<NodeId>,
    root: NodeId,
    len: usize,
    duplicates: Duplicates,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

impl<K> RbTree<K> {
    /// Returns a new empty tree that keeps duplicate keys.
    pub fn new() -> RbTree<K> {
        Self::with_capacity_and_duplicates(0, Duplicates::default())
    }

    /// Returns a new empty tree with the given duplicate-key policy.
    pub fn with_duplicates(duplicates: Duplicates) -> RbTree<K> {
        Self::with_capacity_and_duplicates(0, duplicates)
    }

    /// Returns a new empty tree with room for `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> RbTree<K> {
        Self::with_capacity_and_duplicates(capacity, Duplicates::default())
    }

    pub fn with_capacity_and_duplicates(capacity: usize, duplicates: Duplicates) -> RbTree<K> {
        let mut links = Vec::with_capacity(capacity + 1);
        links.push(Links::SENTINEL);

        let mut keys = Vec::with_capacity(capacity + 1);
        keys.push(None);

        RbTree {
            links,
            keys,
            free: Vec::new(),
            root: NodeId::NIL,
            len: 0,
            duplicates,
        }
    }

    /// Returns the tree's duplicate-key policy.
    pub fn duplicates(&self) -> Duplicates {
        self.duplicates
    }

    /// Returns `true` if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_nil());
        empty
    }

    /// Returns the number of keys in the tree, counting duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the root node, or `None` if the tree is empty.
    pub fn root(&self) -> Option<NodeRef<'_, K>> {
        (!self.root.is_nil()).then(|| NodeRef::new(self, self.root))
    }

    /// Returns the node with handle `id`, or `None` if that slot holds no node.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, K>> {
        self.is_live(id).then(|| NodeRef::new(self, id))
    }

    /// Returns the minimum key of the tree.
    pub fn first(&self) -> Option<&K> {
        (!self.root.is_nil()).then(|| self.key(self.min_in_subtree(self.root)))
    }

    /// Returns the maximum key of the tree.
    pub fn last(&self) -> Option<&K> {
        (!self.root.is_nil()).then(|| self.key(self.max_in_subtree(self.root)))
    }

    /// Returns an iterator over `(key, color)` pairs in ascending key order.
    pub fn in_order(&self) -> InOrder<'_, K> {
        InOrder::new(self, self.root)
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> Keys<'_, K> {
        Keys::new(self.in_order())
    }

    /// Removes a specific node from the tree and returns its key.
    ///
    /// Returns `None` if `id` does not refer to a node currently in the tree.
    pub fn remove_at(&mut self, id: NodeId) -> Option<K> {
        self.is_live(id).then(|| self.remove_node(id))
    }

    /// Removes and returns the minimum key of the tree.
    pub fn pop_first(&mut self) -> Option<K> {
        if self.root.is_nil() {
            return None;
        }

        let min = self.min_in_subtree(self.root);
        Some(self.remove_node(min))
    }

    /// Removes and returns the maximum key of the tree.
    pub fn pop_last(&mut self) -> Option<K> {
        if self.root.is_nil() {
            return None;
        }

        let max = self.max_in_subtree(self.root);
        Some(self.remove_node(max))
    }

    /// Clears the tree, removing all keys.
    pub fn clear(&mut self) {
        self.links.truncate(1);
        self.keys.truncate(1);
        self.free.clear();
        self.root = NodeId::NIL;
        self.len = 0;
    }

    // Arena access ===========================================================

    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        !id.is_nil() && matches!(self.keys.get(id.index()), Some(Some(_)))
    }

    #[inline]
    pub(crate) fn links(&self, id: NodeId) -> &Links {
        &self.links[id.index()]
    }

    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        debug_assert!(!id.is_nil(), "the sentinel's links are never written");
        &mut self.links[id.index()]
    }

    pub(crate) fn key(&self, id: NodeId) -> &K {
        match &self.keys[id.index()] {
            Some(key) => key,
            None => unreachable!("{id} holds no key"),
        }
    }

    /// Returns the color of `id`. The sentinel is black.
    #[inline]
    pub(crate) fn color(&self, id: NodeId) -> Color {
        self.links(id).color()
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.links_mut(id).set_color(color);
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.links(id).parent()
    }

    #[inline]
    fn child(&self, id: NodeId, dir: Dir) -> NodeId {
        self.links(id).child(dir)
    }

    // Sets `child`'s parent link, unless `child` is the sentinel.
    #[inline]
    fn maybe_set_parent(&mut self, child: NodeId, parent: NodeId) {
        if !child.is_nil() {
            self.links_mut(child).set_parent(parent);
        }
    }

    // Stores `key` in a new red node with two sentinel children, reusing a free slot if one is
    // available.
    fn alloc(&mut self, key: K, parent: NodeId) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                debug!("reusing free slot {id}");
                self.links[id.index()] = Links::new_red(parent);
                self.keys[id.index()] = Some(key);
                id
            }

            None => {
                let id = NodeId::from_index(self.links.len());
                self.links.push(Links::new_red(parent));
                self.keys.push(Some(key));
                id
            }
        }
    }

    // Empties the slot of an unlinked node and returns its key.
    fn release(&mut self, id: NodeId) -> K {
        self.links[id.index()] = Links::SENTINEL;
        self.free.push(id);

        match self.keys[id.index()].take() {
            Some(key) => key,
            None => unreachable!("{id} holds no key"),
        }
    }

    // Structural surgery =====================================================

    pub(crate) fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.links(parent).left() == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    pub(crate) fn min_in_subtree(&self, mut cur: NodeId) -> NodeId {
        loop {
            let left = self.links(cur).left();
            if left.is_nil() {
                return cur;
            }
            cur = left;
        }
    }

    fn max_in_subtree(&self, mut cur: NodeId) -> NodeId {
        loop {
            let right = self.links(cur).right();
            if right.is_nil() {
                return cur;
            }
            cur = right;
        }
    }

    // Points the child link of `parent` that refers to `old_child` at `new_child`, or makes
    // `new_child` the root if `parent` is the sentinel.
    //
    // `new_child`'s parent link is not updated.
    fn replace_child_or_set_root(&mut self, parent: NodeId, old_child: NodeId, new_child: NodeId) {
        if parent.is_nil() {
            self.root = new_child;
            return;
        }

        let dir = self.which_child(parent, old_child);
        debug_assert_eq!(
            self.child(parent, dir),
            old_child,
            "`old_child` must be a child of `parent`"
        );
        self.links_mut(parent).set_child(dir, new_child);
    }

    // Replaces the subtree rooted at `u` with the subtree rooted at `v` in `u`'s parent.
    //
    // `u`'s own links are left as they were.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let parent = self.parent(u);
        self.replace_child_or_set_root(parent, u, v);
        self.maybe_set_parent(v, parent);
    }

    // Rotates `x` down towards `dir`, promoting its child on the opposite side into its place:
    // `rotate(x, Dir::Left)` is a left rotation, `rotate(x, Dir::Right)` a right rotation.
    //
    // Colors are not touched. The in-order sequence of the subtree is unchanged.
    fn rotate(&mut self, x: NodeId, dir: Dir) {
        let y = self.child(x, !dir);
        assert!(!y.is_nil(), "cannot rotate {x} without a child to promote");

        trace!("rotating {x} {dir:?} under {y}");

        // `y`'s inner subtree crosses over to `x`.
        let across = self.child(y, dir);
        self.links_mut(x).set_child(!dir, across);
        self.maybe_set_parent(across, x);

        let parent = self.parent(x);
        self.links_mut(y).set_parent(parent);
        self.replace_child_or_set_root(parent, x, y);

        self.links_mut(y).set_child(dir, x);
        self.links_mut(x).set_parent(y);
    }

    // Insertion ==============================================================

    // Links a new red node below `parent` (or as the root) and restores the invariants.
    fn link_and_rebalance(&mut self, key: K, parent: NodeId, dir: Dir) -> NodeId {
        let z = self.alloc(key, parent);

        if parent.is_nil() {
            self.root = z;
        } else {
            self.links_mut(parent).set_child(dir, z);
        }

        self.len += 1;
        self.rebalance_inserted(z);
        z
    }

    // Restores the invariants after `z` has been linked in as a red leaf.
    //
    // Only invariant 4 can be broken, and only between `z` and its parent; or invariant 2, if `z`
    // is the root.
    fn rebalance_inserted(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)) == Color::Red {
            // A red parent is never the root, so the grandparent is a node.
            let parent = self.parent(z);
            let grandparent = self.parent(parent);
            let side = self.which_child(grandparent, parent);
            let uncle = self.child(grandparent, !side);

            if self.color(uncle) == Color::Red {
                trace!("insert fixup at {z}: red uncle {uncle}, recoloring {grandparent}");

                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);

                // The violation, if any, is now two levels up.
                z = grandparent;
                continue;
            }

            if self.which_child(parent, z) != side {
                trace!("insert fixup at {z}: inner grandchild, rotating {parent}");

                // Turn the triangle into a line; the old parent becomes the outer grandchild.
                z = parent;
                self.rotate(z, side);
            }

            let parent = self.parent(z);
            let grandparent = self.parent(parent);
            trace!("insert fixup at {z}: outer grandchild, rotating {grandparent}");

            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, !side);
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // Removal ================================================================

    // Unlinks the live node `z`, restores the invariants and returns `z`'s key.
    fn remove_node(&mut self, z: NodeId) -> K {
        let left = self.links(z).left();
        let right = self.links(z).right();

        let mut removed_color = self.color(z);
        let x;
        let x_parent;

        if left.is_nil() {
            x = right;
            x_parent = self.parent(z);
            self.transplant(z, right);
        } else if right.is_nil() {
            x = left;
            x_parent = self.parent(z);
            self.transplant(z, left);
        } else {
            // Splice out the successor, which has no left child, and put it in `z`'s place.
            let y = self.min_in_subtree(right);
            removed_color = self.color(y);
            x = self.links(y).right();

            if self.parent(y) == z {
                x_parent = y;
            } else {
                x_parent = self.parent(y);
                self.transplant(y, x);
                self.links_mut(y).set_right(right);
                self.links_mut(right).set_parent(y);
            }

            self.transplant(z, y);
            self.links_mut(y).set_left(left);
            self.links_mut(left).set_parent(y);

            let z_color = self.color(z);
            self.set_color(y, z_color);
        }

        // Removing a red node cannot change any black-height.
        if removed_color == Color::Black {
            self.rebalance_removed(x, x_parent);
        }

        self.len -= 1;
        self.release(z)
    }

    // Restores the invariants after a black node has been removed from above `x`.
    //
    // Every path through `x` is one black node short ("`x` is double black"). `parent` is `x`'s
    // parent; it is passed separately because `x` may be the sentinel.
    fn rebalance_removed(&mut self, mut x: NodeId, mut parent: NodeId) {
        while x != self.root && self.color(x) == Color::Black {
            // The double-black subtree has black-height at least one less than its sibling's,
            // so the sibling is a node even when `x` is the sentinel.
            let side = self.which_child(parent, x);
            let mut w = self.child(parent, !side);

            if self.color(w) == Color::Red {
                trace!("remove fixup below {parent}: red sibling {w}");

                self.set_color(w, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                w = self.child(parent, !side);
            }

            let near = self.child(w, side);
            let far = self.child(w, !side);

            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                trace!("remove fixup below {parent}: black sibling {w} with black children");

                self.set_color(w, Color::Red);
                x = parent;
                parent = self.parent(x);
                continue;
            }

            if self.color(far) == Color::Black {
                trace!("remove fixup below {parent}: sibling {w} has red near child {near}");

                self.set_color(near, Color::Black);
                self.set_color(w, Color::Red);
                self.rotate(w, !side);
                w = self.child(parent, !side);
            }

            trace!("remove fixup below {parent}: sibling {w} has red far child");

            let parent_color = self.color(parent);
            self.set_color(w, parent_color);
            self.set_color(parent, Color::Black);
            let far = self.child(w, !side);
            self.set_color(far, Color::Black);
            self.rotate(parent, side);

            x = self.root;
            parent = NodeId::NIL;
        }

        if !x.is_nil() {
            self.set_color(x, Color::Black);
        }
    }
}

impl<K: Ord> RbTree<K> {
    // Returns the first node met on the descent whose key equals `key`, or the sentinel.
    fn find<Q>(&self, key: &Q) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;

        while !cur.is_nil() {
            cur = match key.cmp(self.key(cur).borrow()) {
                Ordering::Less => self.links(cur).left(),
                Ordering::Equal => return cur,
                Ordering::Greater => self.links(cur).right(),
            };
        }

        NodeId::NIL
    }

    /// Returns the node holding `key`, or `None` if no such node exists.
    ///
    /// If the tree holds several equal keys, this is the one nearest the root.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn search<Q>(&self, key: &Q) -> Option<NodeRef<'_, K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key);
        (!id.is_nil()).then(|| NodeRef::new(self, id))
    }

    /// Returns `true` if the tree contains a key equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(key).is_nil()
    }

    /// Inserts a key into the tree.
    ///
    /// Under [`Duplicates::Allow`] this always links a new node. Otherwise an equal key already in
    /// the tree is kept or replaced, as the policy says, and the returned [`Insertion`] hands back
    /// the key that was not stored.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K) -> Insertion<K> {
        let mut parent = NodeId::NIL;
        let mut dir = Dir::Left;
        let mut cur = self.root;

        // Descend the tree, looking for a free child slot.
        while !cur.is_nil() {
            dir = match key.cmp(self.key(cur)) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => match self.duplicates {
                    // Not less than: equal keys go right.
                    Duplicates::Allow => Dir::Right,
                    Duplicates::Reject => return Insertion::Rejected(key),
                    Duplicates::Replace => {
                        let old = match &mut self.keys[cur.index()] {
                            Some(stored) => mem::replace(stored, key),
                            None => unreachable!("{cur} holds no key"),
                        };
                        return Insertion::Replaced(cur, old);
                    }
                },
            };

            parent = cur;
            cur = self.child(cur, dir);
        }

        Insertion::Linked(self.link_and_rebalance(key, parent, dir))
    }

    /// Removes a key equal to `key` from the tree and returns it.
    ///
    /// Returns `None`, leaving the tree untouched, if there is no such key.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let z = self.find(key);

        if z.is_nil() {
            debug!("delete: key not found");
            return None;
        }

        Some(self.remove_node(z))
    }
}

impl<K> Default for RbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'tree, K> IntoIterator for &'tree RbTree<K> {
    type Item = &'tree K;
    type IntoIter = Keys<'tree, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys()
    }
}

impl<K: Ord> Extend<K> for RbTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for RbTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = RbTree::new();
        tree.extend(iter);
        tree
    }
}
