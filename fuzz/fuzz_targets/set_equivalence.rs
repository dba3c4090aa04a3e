#![no_main]
use libfuzzer_sys::fuzz_target;

use arena_rbtree::{
    model::{run_btree_equivalence, Op},
    Duplicates,
};

fuzz_target!(|input: (bool, Vec<Op>)| {
    let (replace, ops) = input;
    let duplicates = if replace {
        Duplicates::Replace
    } else {
        Duplicates::Reject
    };

    run_btree_equivalence(duplicates, ops)
});
