/*
Conversion of the arena-backed hierarchies into termtree::Tree<String> for display.
Both hierarchies share one recursive arena walk parameterised by a label function.
 */
use std::fmt;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::arena::TreeArena;
use crate::coverage::{CoverageTree, Segment};
use crate::forest::{Forest, ForestEntry};

pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

fn build_tree<D, F>(arena: &TreeArena<D>, node_idx: Index, label: &F) -> Tree<String>
where
    F: Fn(&D) -> String,
{
    match arena.get_node(node_idx) {
        Some(node) => {
            let leaves: Vec<_> = node
                .children
                .iter()
                .map(|&child| build_tree(arena, child, label))
                .collect();
            Tree::new(label(&node.data)).with_leaves(leaves)
        }
        None => Tree::new(String::new()),
    }
}

impl<T: fmt::Debug> TreeDisplay for Forest<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let label = |entry: &ForestEntry<T>| match entry {
            ForestEntry::Root => "root".to_string(),
            ForestEntry::Item(item) => format!("{item:?}"),
        };
        build_tree(self.arena(), self.root().index(), &label)
    }
}

impl CoverageTree {
    /// Render with fragments shown as `fragment_label`.
    #[instrument(level = "debug", skip(self))]
    pub fn to_tree_labelled(&self, fragment_label: &str) -> Tree<String> {
        let label = |seg: &Segment| seg.label(fragment_label);
        build_tree(self.arena(), self.root().index(), &label)
    }
}

impl TreeDisplay for CoverageTree {
    fn to_tree_string(&self) -> Tree<String> {
        self.to_tree_labelled("fragment")
    }
}
