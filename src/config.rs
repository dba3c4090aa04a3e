use crate::NodeId;

/// How [`RbTree::insert`](crate::RbTree::insert) treats a key equal to one already in the tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Duplicates {
    /// Keep every copy.
    ///
    /// A new key that compares equal to an existing one is placed in that node's right subtree,
    /// so equal keys are visited in insertion order.
    #[default]
    Allow,

    /// Refuse the new key and hand it back.
    Reject,

    /// Swap the stored key for the new one and hand back the old key. The tree's shape and colors
    /// are left untouched.
    Replace,
}

/// The outcome of [`RbTree::insert`](crate::RbTree::insert).
#[derive(Debug, PartialEq, Eq)]
pub enum Insertion<K> {
    /// The key was linked into the tree as a new node.
    Linked(NodeId),

    /// An equal key was present and the tree rejects duplicates.
    Rejected(K),

    /// An equal key was present and has been replaced; this is the old key.
    Replaced(NodeId, K),
}

impl<K> Insertion<K> {
    /// Returns the node now holding the inserted key, if it was stored.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Insertion::Linked(id) | Insertion::Replaced(id, _) => Some(*id),
            Insertion::Rejected(_) => None,
        }
    }

    /// Returns `true` if a new node was added to the tree.
    pub fn is_linked(&self) -> bool {
        matches!(self, Insertion::Linked(_))
    }
}
