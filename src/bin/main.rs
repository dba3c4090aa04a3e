use std::error::Error;

use arena_rbtree::RbTree;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut tree: RbTree<u32> = RbTree::new();

    for key in [10, 20, 30, 15, 25, 5, 1] {
        tree.insert(key);
        tree.check_invariants()?;
        println!("insert {key:>3}: {tree}");
    }

    for key in [20, 999] {
        match tree.delete(&key) {
            Some(_) => println!("delete {key:>3}: {tree}"),
            None => println!("delete {key:>3}: key not found"),
        }
        tree.check_invariants()?;
    }

    let black_height = tree.check_invariants()?;
    println!(
        "{} keys, height {}, black-height {black_height}",
        tree.len(),
        tree.height()
    );

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot)?;
    println!("{dot}");

    Ok(())
}
