use std::{cmp::Ordering, ops::Range};

use proptest::prelude::*;

use crate::model;

use super::*;

fn tree_of(keys: &[u32]) -> RbTree<u32> {
    let mut tree = RbTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    tree
}

fn keys_of(tree: &RbTree<u32>) -> Vec<u32> {
    tree.keys().copied().collect()
}

// Keys of the subtree rooted at `top`, in order.
fn subtree_keys(tree: &RbTree<u32>, top: NodeId) -> Vec<u32> {
    InOrder::new(tree, top).map(|(&key, _)| key).collect()
}

// Every (key, color, parent key) triple, in order; captures both shape and coloring.
fn shape_of(tree: &RbTree<u32>) -> Vec<(u32, Color, Option<u32>)> {
    let mut walk = tree.in_order();
    let mut shape = Vec::new();

    while let Some(id) = walk.next_id() {
        let node = NodeRef::new(tree, id);
        shape.push((*node.key(), node.color(), node.parent().map(|p| *p.key())));
    }

    shape
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.search(key).expect("item not found");
        assert_eq!(node.key(), key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Calls `f` with every permutation of `0..n`.
fn for_each_permutation(n: u32, f: &mut impl FnMut(&[u32])) {
    fn go(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, f: &mut impl FnMut(&[u32])) {
        if rest.is_empty() {
            f(prefix.as_slice());
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            go(prefix, rest, f);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    go(&mut Vec::new(), &mut (0..n).collect(), f);
}

#[test]
fn five_elems_find() {
    for_each_permutation(5, &mut |keys: &[u32]| insert_find_all(keys));
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        assert_eq!(tree.delete(key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.delete(key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_six() {
    for_each_permutation(6, &mut |keys: &[u32]| insert_remove_all(keys));
}

#[test]
fn ascending_insert_rotates_to_balanced_root() {
    let tree = tree_of(&[10, 20, 30]);

    let root = tree.root().expect("tree is not empty");
    assert_eq!((*root.key(), root.color()), (20, Color::Black));
    assert!(root.parent().is_none());

    let left = root.left().expect("root has a left child");
    let right = root.right().expect("root has a right child");
    assert_eq!((*left.key(), left.color()), (10, Color::Red));
    assert_eq!((*right.key(), right.color()), (30, Color::Red));

    for leaf in [left, right] {
        assert!(leaf.left().is_none());
        assert!(leaf.right().is_none());
        assert_eq!(leaf.parent().map(|p| p.id()), Some(root.id()));
    }

    assert_eq!(tree.check_invariants(), Ok(1));
}

#[test]
fn mixed_insert_keeps_order() {
    let tree = tree_of(&[10, 20, 30, 15, 25, 5, 1]);

    assert!(tree.check_invariants().is_ok());
    assert_eq!(keys_of(&tree), [1, 5, 10, 15, 20, 25, 30]);
    assert_eq!(tree.len(), 7);
}

#[test]
fn delete_node_with_two_children() {
    let mut tree = tree_of(&[10, 20, 30, 15, 25, 5, 1]);

    let twenty = tree.search(&20).expect("20 was inserted");
    assert!(twenty.left().is_some() && twenty.right().is_some());

    assert_eq!(tree.delete(&20), Some(20));

    assert!(tree.check_invariants().is_ok());
    assert_eq!(keys_of(&tree), [1, 5, 10, 15, 25, 30]);
    assert_eq!(tree.root().map(|r| r.color()), Some(Color::Black));
    assert!(tree.search(&20).is_none());
}

#[test]
fn delete_missing_key_is_a_no_op() {
    let mut tree = tree_of(&[10, 20, 30, 15, 25, 5, 1]);
    let before = shape_of(&tree);

    assert_eq!(tree.delete(&999), None);

    assert_eq!(shape_of(&tree), before);
    assert_eq!(tree.len(), 7);
    tree.assert_invariants();

    let mut empty: RbTree<u32> = RbTree::new();
    assert_eq!(empty.delete(&1), None);
    assert_eq!(empty.check_invariants(), Ok(0));
}

#[test]
fn in_order_reports_colors() {
    let tree = tree_of(&[10, 20, 30]);

    let pairs: Vec<_> = tree.in_order().map(|(&k, c)| (k, c)).collect();
    assert_eq!(
        pairs,
        [(10, Color::Red), (20, Color::Black), (30, Color::Red)]
    );
    assert_eq!(tree.to_string(), "10 (RED)  20 (BLACK)  30 (RED)");
}

#[test]
fn in_order_restarts() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    let mut iter = tree.in_order();
    assert_eq!(iter.next().map(|(&k, _)| k), Some(1));
    let resumed = iter.clone();

    assert_eq!(resumed.map(|(&k, _)| k).collect::<Vec<_>>(), [2, 3, 4, 5, 6, 7]);
    assert_eq!(keys_of(&tree), [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(keys_of(&tree), (&tree).into_iter().copied().collect::<Vec<_>>());
}

#[test]
fn rotations_preserve_order() {
    let mut tree = tree_of(&(0..31).collect::<Vec<_>>());

    let candidates: Vec<NodeId> = {
        let mut walk = tree.in_order();
        std::iter::from_fn(|| walk.next_id()).collect()
    };

    for x in candidates {
        if !tree.links(x).right().is_nil() {
            let before = subtree_keys(&tree, x);
            let parent_before = tree.links(x).parent();
            tree.rotate(x, Dir::Left);
            let y = tree.links(x).parent();
            assert_eq!(subtree_keys(&tree, y), before);
            assert_eq!(tree.links(y).left(), x);

            assert_eq!(tree.links(y).parent(), parent_before);

            // And back again.
            tree.rotate(y, Dir::Right);
            assert_eq!(tree.links(x).parent(), parent_before);
            assert_eq!(subtree_keys(&tree, x), before);
        }

        if !tree.links(x).left().is_nil() {
            let before = subtree_keys(&tree, x);
            tree.rotate(x, Dir::Right);
            let y = tree.links(x).parent();
            assert_eq!(subtree_keys(&tree, y), before);
            assert_eq!(tree.links(y).right(), x);

            tree.rotate(y, Dir::Left);
            assert_eq!(subtree_keys(&tree, x), before);
        }
    }

    // Rotations only move nodes around, so the tree's order and size are untouched.
    assert_eq!(keys_of(&tree), (0..31).collect::<Vec<_>>());
}

#[test]
fn rotating_the_root_updates_root() {
    let mut tree = tree_of(&[2, 1, 3]);
    let old_root = tree.root;

    tree.rotate(old_root, Dir::Left);

    assert_eq!(tree.root().map(|r| *r.key()), Some(3));
    assert_eq!(tree.links(old_root).parent(), tree.root);
    assert!(tree.links(tree.root).parent().is_nil());
    assert_eq!(keys_of(&tree), [1, 2, 3]);
}

#[test]
fn height_stays_logarithmic() {
    let mut tree = RbTree::new();

    for key in 0..1024u32 {
        tree.insert(key);
        let bound = 2.0 * ((tree.len() + 1) as f64).log2();
        assert!(tree.height() as f64 <= bound);
    }

    for key in (0..1024u32).step_by(3) {
        tree.delete(&key);
        let bound = 2.0 * ((tree.len() + 1) as f64).log2();
        assert!(tree.height() as f64 <= bound);
    }

    tree.assert_invariants();
}

// A key ordered by its first field only, so that equal keys stay distinguishable.
#[derive(Debug, Clone, Copy)]
struct Tagged<T>(u32, T);

impl<T> PartialEq for Tagged<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Tagged<T> {}

impl<T> PartialOrd for Tagged<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Tagged<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

#[test]
fn duplicates_are_kept_in_insertion_order() {
    let mut tree = RbTree::new();

    for (seq, key) in [5, 3, 5, 8, 5, 1, 3, 5].into_iter().enumerate() {
        assert!(tree.insert(Tagged(key, seq)).is_linked());
        tree.assert_invariants();
    }

    let order: Vec<(u32, usize)> = tree.keys().map(|k| (k.0, k.1)).collect();
    assert_eq!(
        order,
        [(1, 5), (3, 1), (3, 6), (5, 0), (5, 2), (5, 4), (5, 7), (8, 3)]
    );

    // Deleting removes one copy at a time.
    for remaining in (0..4).rev() {
        assert_eq!(tree.delete(&Tagged(5, 0)).map(|k| k.0), Some(5));
        assert_eq!(tree.keys().filter(|k| k.0 == 5).count(), remaining);
        tree.assert_invariants();
    }
    assert_eq!(tree.delete(&Tagged(5, 0)), None);
    assert_eq!(tree.len(), 4);
}

#[test]
fn reject_policy_hands_key_back() {
    let mut tree = RbTree::with_duplicates(Duplicates::Reject);

    assert!(tree.insert(7).is_linked());
    assert_eq!(tree.insert(7), Insertion::Rejected(7));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.duplicates(), Duplicates::Reject);
    tree.assert_invariants();
}

#[test]
fn replace_policy_swaps_key_in_place() {
    let mut tree = RbTree::with_duplicates(Duplicates::Replace);
    for key in [4, 2, 6] {
        tree.insert(Tagged(key, "old"));
    }

    let id = tree.search(&Tagged(2, "")).map(|n| n.id());
    let colors_before: Vec<Color> = tree.in_order().map(|(_, c)| c).collect();

    match tree.insert(Tagged(2, "new")) {
        Insertion::Replaced(replaced, old) => {
            assert_eq!(Some(replaced), id);
            assert_eq!(old.1, "old");
        }
        other => panic!("expected a replacement, got {other:?}"),
    }

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.search(&Tagged(2, "")).map(|n| n.key().1), Some("new"));
    assert_eq!(
        tree.in_order().map(|(_, c)| c).collect::<Vec<_>>(),
        colors_before
    );
}

#[test]
fn freed_slots_are_reused() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5]);
    let slots = tree.links.len();

    let id = tree.search(&3).map(|n| n.id()).expect("3 was inserted");
    assert_eq!(tree.remove_at(id), Some(3));
    assert!(tree.node(id).is_none());
    assert_eq!(tree.remove_at(id), None);

    assert_eq!(tree.insert(10), Insertion::Linked(id));
    assert_eq!(tree.links.len(), slots);
    assert_eq!(keys_of(&tree), [1, 2, 4, 5, 10]);
    tree.assert_invariants();

    assert_eq!(tree.remove_at(NodeId::NIL), None);
}

#[test]
fn sentinel_is_never_written() {
    let mut tree = RbTree::new();

    for key in 0..200u32 {
        tree.insert((key * 7919) % 211);
    }
    for key in 0..150u32 {
        tree.delete(&((key * 31) % 211));
    }
    while tree.pop_first().is_some() {}

    assert_eq!(*tree.links(NodeId::NIL), crate::node::Links::SENTINEL);
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
}

#[test]
fn first_last_and_pops() {
    let mut tree = tree_of(&[5, 1, 9, 3, 7]);

    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&9));
    assert_eq!(tree.pop_first(), Some(1));
    assert_eq!(tree.pop_last(), Some(9));
    assert_eq!(keys_of(&tree), [3, 5, 7]);
    tree.assert_invariants();

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.first(), None);
    assert_eq!(tree.pop_last(), None);
    assert_eq!(tree.check_invariants(), Ok(0));

    tree.extend([2, 1]);
    assert_eq!(keys_of(&tree), [1, 2]);
}

#[test]
fn contains_and_borrowed_search() {
    let tree: RbTree<String> = ["pear", "apple", "fig"].into_iter().map(String::from).collect();

    assert!(tree.contains("fig"));
    assert!(!tree.contains("kiwi"));
    assert_eq!(tree.search("apple").map(|n| n.key().as_str()), Some("apple"));
    assert_eq!(tree.first().map(String::as_str), Some("apple"));
}

#[test]
fn checker_reports_violations() {
    let mut tree = tree_of(&[10, 20, 30]);
    let root = tree.root;

    tree.set_color(root, Color::Red);
    assert_eq!(tree.check_invariants(), Err(InvariantViolation::RedRoot(root)));
    tree.set_color(root, Color::Black);

    let left = tree.links(root).left();
    tree.set_color(left, Color::Black);
    assert!(matches!(
        tree.check_invariants(),
        Err(InvariantViolation::BlackHeightMismatch { node, left: 2, right: 1 }) if node == root
    ));
    tree.set_color(left, Color::Red);

    let mut tree = tree_of(&[10, 20, 30, 40]);
    let forty = tree.search(&40).map(|n| n.id()).expect("40 was inserted");
    let thirty = tree.links(forty).parent();
    tree.set_color(thirty, Color::Red);
    assert!(matches!(
        tree.check_invariants(),
        Err(InvariantViolation::RedChildOfRed { child, .. }) if child == forty
    ));

    let mut tree = tree_of(&[10, 20, 30]);
    tree.len += 1;
    assert_eq!(
        tree.check_invariants(),
        Err(InvariantViolation::LengthMismatch {
            reported: 4,
            reachable: 3
        })
    );
}

#[test]
fn dotgraph_renders_every_node() {
    let tree = tree_of(&[2, 1, 3]);
    let mut out = String::new();

    tree.dotgraph("t", &mut out).expect("writing to a String cannot fail");

    assert!(out.starts_with("digraph \"graph-t\""));
    assert_eq!(out.matches("fillcolor=black").count(), 1);
    assert_eq!(out.matches("fillcolor=red").count(), 2);
    assert_eq!(out.matches("shape=point").count(), 4);

    let mut empty = String::new();
    RbTree::<u32>::new()
        .dotgraph("e", &mut empty)
        .expect("writing to a String cannot fail");
    assert_eq!(empty, "digraph \"graph-e\" {}");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(Duplicates::Allow, ops);
    }

    #[test]
    fn btree_equivalence_any_policy(
        duplicates in model::duplicates_strategy(),
        ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE),
    ) {
        model::run_btree_equivalence(duplicates, ops);
    }

    #[test]
    fn delete_missing_leaves_tree_unchanged(
        keys in proptest::collection::vec(0u32..500, 0..200),
        missing in 500u32..1000,
    ) {
        let mut tree = tree_of(&keys);
        let before = shape_of(&tree);

        prop_assert_eq!(tree.delete(&missing), None);
        prop_assert_eq!(shape_of(&tree), before);
    }
}
