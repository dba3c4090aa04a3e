#![no_main]
use libfuzzer_sys::fuzz_target;

use arena_rbtree::{
    model::{run_btree_equivalence, Op},
    Duplicates,
};

fuzz_target!(|ops: Vec<Op>| { run_btree_equivalence(Duplicates::Allow, ops) });
