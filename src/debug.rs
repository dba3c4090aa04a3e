use std::{collections::VecDeque, fmt};

use crate::{Color, NodeId, RbTree};

impl<K> RbTree<K> {
    /// Writes the tree's structure as a Graphviz `digraph`, one rank per level.
    ///
    /// Nodes are labelled with their keys and filled with their color; sentinel leaves are drawn
    /// as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Display,
    {
        if self.root.is_nil() {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        }

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(self.root));

        writeln!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-nil{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                // Duplicate keys would collide, so nodes are named by slot.
                let fill = match self.color(node) {
                    Color::Red => "red",
                    Color::Black => "black",
                };
                write!(
                    w,
                    "\"graph{name}-{}\" [label=\"{}\", style=filled, fillcolor={fill}, fontcolor=white]; ",
                    node.index(),
                    self.key(node),
                )?;

                for child in [self.links(node).left(), self.links(node).right()] {
                    use fmt::Write;

                    if child.is_nil() {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            links,
                            "\"graph{name}-{}\" -> \"graph{name}-nil{missing}\";",
                            node.index()
                        )?;
                        missing += 1;
                    } else {
                        queue.push_back(Item::Node(child));
                        writeln!(
                            links,
                            "\"graph{name}-{}\" -> \"graph{name}-{}\";",
                            node.index(),
                            child.index()
                        )?;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

/// Lists the keys in order with their colors, e.g. `1 (RED)  5 (BLACK)  10 (RED)`.
impl<K: fmt::Display> fmt::Display for RbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, color)) in self.in_order().enumerate() {
            if i > 0 {
                f.write_str("  ")?;
            }
            write!(f, "{key} ({color})")?;
        }

        Ok(())
    }
}

impl<K: fmt::Debug> fmt::Debug for RbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.in_order()).finish()
    }
}
