//! A reference model for differential testing.
//!
//! Random operation sequences are replayed against both an [`RbTree`] and a `BTreeMap` from key to
//! multiplicity. After every operation the two must agree, and the tree must pass
//! [`RbTree::check_invariants`] and stay within the red-black height bound.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{Duplicates, Insertion, RbTree};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Picks a key already in the model (by position), so that hits are common.
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Search(ItemValue),
    Delete(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, keys: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(keys, item)),
            Op::Search(item) => FinalOp::Search(get_value(keys, item)),
            Op::Delete(item) => FinalOp::Delete(get_value(keys, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Search(u32),
    Delete(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Search),
        value_strategy().prop_map(Op::Delete),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

pub fn duplicates_strategy() -> impl Strategy<Value = Duplicates> {
    proptest::prop_oneof![
        Just(Duplicates::Allow),
        Just(Duplicates::Reject),
        Just(Duplicates::Replace),
    ]
}

/// A sorted multiset: key to number of copies.
#[derive(Default)]
struct Multiset {
    counts: BTreeMap<u32, usize>,
    len: usize,
}

impl Multiset {
    fn insert(&mut self, key: u32) {
        *self.counts.entry(key).or_insert(0) += 1;
        self.len += 1;
    }

    fn contains(&self, key: u32) -> bool {
        self.counts.contains_key(&key)
    }

    fn remove(&mut self, key: u32) -> Option<u32> {
        let count = self.counts.get_mut(&key)?;
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&key);
        }
        self.len -= 1;
        Some(key)
    }

    fn first(&self) -> Option<u32> {
        self.counts.keys().next().copied()
    }

    fn last(&self) -> Option<u32> {
        self.counts.keys().next_back().copied()
    }

    fn distinct(&self) -> Vec<u32> {
        self.counts.keys().copied().collect()
    }

    fn expanded(&self) -> Vec<u32> {
        self.counts
            .iter()
            .flat_map(|(&key, &count)| std::iter::repeat(key).take(count))
            .collect()
    }
}

/// Replays `ops` against an `RbTree` with the given policy and a multiset model, panicking on the
/// first disagreement or broken invariant.
pub fn run_btree_equivalence(duplicates: Duplicates, ops: Vec<Op>) {
    let mut model = Multiset::default();
    let mut tree: RbTree<u32> = RbTree::with_duplicates(duplicates);

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&model.distinct());

        match final_op {
            FinalOp::Insert(value) => {
                let present = model.contains(value);

                let expected = match (duplicates, present) {
                    (Duplicates::Allow, _) | (_, false) => {
                        model.insert(value);
                        None
                    }
                    (Duplicates::Reject, true) | (Duplicates::Replace, true) => Some(value),
                };

                let from_tree = match tree.insert(value) {
                    Insertion::Linked(id) => {
                        assert_eq!(tree.node(id).map(|n| *n.key()), Some(value));
                        None
                    }
                    Insertion::Rejected(key) => {
                        assert_eq!(duplicates, Duplicates::Reject);
                        Some(key)
                    }
                    Insertion::Replaced(id, old) => {
                        assert_eq!(duplicates, Duplicates::Replace);
                        assert_eq!(tree.node(id).map(|n| *n.key()), Some(value));
                        Some(old)
                    }
                };

                assert_eq!(expected, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(value) => {
                let from_model = model.contains(value).then_some(value);
                let from_tree = tree.search(&value).map(|node| *node.key());

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(model.contains(value), tree.contains(&value));
            }

            FinalOp::Delete(value) => {
                let from_model = model.remove(value);
                let from_tree = tree.delete(&value);

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_model = model.first();
                let from_tree = tree.first().copied();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_model = model.first().and_then(|key| model.remove(key));
                let from_tree = tree.pop_first();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_model = model.last();
                let from_tree = tree.last().copied();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_model = model.last().and_then(|key| model.remove(key));
                let from_tree = tree.pop_last();

                assert_eq!(from_model, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(model.len, tree.len());
        assert_eq!(model.expanded(), tree.keys().copied().collect::<Vec<_>>());

        let bound = 2.0 * ((tree.len() + 1) as f64).log2();
        assert!(
            tree.height() as f64 <= bound,
            "height {} exceeds {bound} with {} keys",
            tree.height(),
            tree.len()
        );
    }
}
