use thiserror::Error;

use crate::{node::Links, Color, Dir, NodeId, RbTree};

/// A broken red-black tree invariant, as reported by [`RbTree::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("the sentinel has been modified")]
    CorruptSentinel,
    #[error("root {0} is red")]
    RedRoot(NodeId),
    #[error("root {root} has parent {parent}")]
    RootHasParent { root: NodeId, parent: NodeId },
    #[error("child {child} of {parent} has parent link {found}")]
    BrokenParentLink {
        parent: NodeId,
        child: NodeId,
        found: NodeId,
    },
    #[error("red node {parent} has red child {child}")]
    RedChildOfRed { parent: NodeId, child: NodeId },
    #[error("unequal black-heights below {node}: {left} on the left, {right} on the right")]
    BlackHeightMismatch {
        node: NodeId,
        left: usize,
        right: usize,
    },
    #[error("key of {0} is less than the key before it in order")]
    OutOfOrder(NodeId),
    #[error("tree reports {reported} keys but {reachable} nodes are reachable")]
    LengthMismatch { reported: usize, reachable: usize },
}

impl<K: Ord> RbTree<K> {
    /// Walks the whole tree and checks every red-black invariant, along with the parent links,
    /// the key order and the length.
    ///
    /// On success, returns the black-height of the root: the number of black nodes on any path
    /// from the root down to a sentinel, not counting the root itself but counting the sentinel.
    /// An empty tree has black-height 0.
    pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        if *self.links(NodeId::NIL) != Links::SENTINEL {
            return Err(InvariantViolation::CorruptSentinel);
        }

        if self.root.is_nil() {
            return match self.len() {
                0 => Ok(0),
                reported => Err(InvariantViolation::LengthMismatch {
                    reported,
                    reachable: 0,
                }),
            };
        }

        if self.color(self.root) == Color::Red {
            return Err(InvariantViolation::RedRoot(self.root));
        }

        let parent = self.links(self.root).parent();
        if !parent.is_nil() {
            return Err(InvariantViolation::RootHasParent {
                root: self.root,
                parent,
            });
        }

        let mut reachable = 0;
        let black_height = self.check_at(self.root, &mut reachable)?;

        if reachable != self.len() {
            return Err(InvariantViolation::LengthMismatch {
                reported: self.len(),
                reachable,
            });
        }

        // Equal keys may sit on either side of each other after rotations, so order is checked
        // over the whole in-order walk rather than per node.
        let mut walk = self.in_order();
        let mut prev: Option<&K> = None;
        while let Some(id) = walk.next_id() {
            let key = self.key(id);
            if prev.is_some_and(|prev| key < prev) {
                return Err(InvariantViolation::OutOfOrder(id));
            }
            prev = Some(key);
        }

        Ok(black_height)
    }

    /// Panics if [`check_invariants`](Self::check_invariants) reports a violation.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("red-black invariant violated: {violation}");
        }
    }
}

impl<K> RbTree<K> {
    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// This is at most `2 * log2(len + 1)`.
    pub fn height(&self) -> usize {
        self.height_at(self.root)
    }

    fn height_at(&self, node: NodeId) -> usize {
        if node.is_nil() {
            return 0;
        }

        let links = self.links(node);
        1 + self.height_at(links.left()).max(self.height_at(links.right()))
    }

    // Checks the subtree rooted at the node `node` and returns its black-height.
    fn check_at(&self, node: NodeId, reachable: &mut usize) -> Result<usize, InvariantViolation> {
        *reachable += 1;

        let color = self.color(node);
        let mut heights = [0; 2];

        for dir in [Dir::Left, Dir::Right] {
            let child = self.links(node).child(dir);

            heights[dir as usize] = if child.is_nil() {
                // The sentinel is black.
                1
            } else {
                let found = self.links(child).parent();
                if found != node {
                    return Err(InvariantViolation::BrokenParentLink {
                        parent: node,
                        child,
                        found,
                    });
                }

                if color == Color::Red && self.color(child) == Color::Red {
                    return Err(InvariantViolation::RedChildOfRed {
                        parent: node,
                        child,
                    });
                }

                let below = self.check_at(child, reachable)?;
                match self.color(child) {
                    Color::Black => below + 1,
                    Color::Red => below,
                }
            };
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch { node, left, right });
        }

        Ok(left)
    }
}
