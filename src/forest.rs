//! Relation-ordered forest builder.
//!
//! Items arrive one at a time and are placed by a caller supplied relation
//! `contains(a, b)`: "a strictly contains b". Each insertion walks down from the
//! synthetic root and resolves to exactly one of four cases:
//!
//! ```text
//!  1. item contains the node        2. item contains some children
//!     node         item                node           node
//!     / | \   ->     |                 / | \    ->    /  \
//!    A  B  C       node               A  B  C        A   item
//!                  / | \                                 /  \
//!                 A  B  C                               B    C
//!
//!  3. a child contains the item     4. nothing relates: new sibling
//!     node         node                node           node
//!     / | \   ->   / | \               / |    ->      / | \
//!    A  B  C      A  B  C             A  B           A  B  item
//!                       |
//!                     item
//! ```
//!
//! The cases are checked in that order. Ancestry in the result mirrors the
//! relation as long as the items form a laminar family under it.

use std::fmt;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::arena::{NodeRef, TreeArena};
use crate::errors::{HierarchyError, HierarchyResult};

/// Payload of a forest node: the synthetic root or a caller item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestEntry<T> {
    Root,
    Item(T),
}

impl<T> ForestEntry<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            ForestEntry::Root => None,
            ForestEntry::Item(item) => Some(item),
        }
    }
}

/// Incremental builder; owns the arena exclusively until [`finish`](Self::finish).
pub struct ForestBuilder<T, R> {
    arena: TreeArena<ForestEntry<T>>,
    root: Index,
    contains: R,
}

impl<T, R> ForestBuilder<T, R>
where
    T: fmt::Debug,
    R: Fn(&T, &T) -> bool,
{
    pub fn new(contains: R) -> Self {
        let mut arena = TreeArena::new();
        let root = arena.insert_node(ForestEntry::Root, None);
        Self {
            arena,
            root,
            contains,
        }
    }

    fn item_at(&self, idx: Index) -> Option<&T> {
        self.arena.get_node(idx).and_then(|n| n.data.item())
    }

    /// Does the item stored at `idx` contain `item`?
    fn node_contains(&self, idx: Index, item: &T) -> bool {
        self.item_at(idx).is_some_and(|n| (self.contains)(n, item))
    }

    /// Does `item` contain the item stored at `idx`?
    fn contained_by(&self, item: &T, idx: Index) -> bool {
        self.item_at(idx).is_some_and(|n| (self.contains)(item, n))
    }

    /// Insert one item, returning the index of its node.
    pub fn insert(&mut self, item: T) -> HierarchyResult<Index> {
        let mut current = self.root;
        loop {
            if current != self.root && self.contained_by(&item, current) {
                trace!(?item, "case 1: wraps node");
                return Ok(self.wrap_node(current, item));
            }

            let included: Vec<Index> = self
                .arena
                .children(current)
                .iter()
                .copied()
                .filter(|&c| self.contained_by(&item, c))
                .collect();
            if !included.is_empty() {
                trace!(?item, count = included.len(), "case 2: wraps children");
                return Ok(self.wrap_children(current, &included, item));
            }

            let next = self
                .arena
                .children(current)
                .iter()
                .copied()
                .find(|&c| self.node_contains(c, &item));
            if let Some(next) = next {
                trace!(?item, "case 3: descends");
                current = next;
                continue;
            }

            if current != self.root && !self.node_contains(current, &item) {
                return Err(HierarchyError::MalformedRelation {
                    item: format!("{item:?}"),
                    other: self
                        .item_at(current)
                        .map(|n| format!("{n:?}"))
                        .unwrap_or_default(),
                    reason: "fits no insertion case under".into(),
                });
            }
            trace!(?item, "case 4: new sibling");
            return Ok(self.arena.insert_node(ForestEntry::Item(item), Some(current)));
        }
    }

    /// Case 1: a new node takes `current`'s place and adopts it.
    fn wrap_node(&mut self, current: Index, item: T) -> Index {
        let new = self.arena.insert_detached(ForestEntry::Item(item));
        if let Some(parent) = self.arena.get_node(current).and_then(|n| n.parent) {
            self.arena.replace_child(parent, current, new);
        }
        self.arena.adopt(new, current);
        new
    }

    /// Case 2: a new node adopts `included` and is appended to `current`.
    fn wrap_children(&mut self, current: Index, included: &[Index], item: T) -> Index {
        let taken = self
            .arena
            .take_children(current, |c| included.contains(&c));
        let new = self.arena.insert_node(ForestEntry::Item(item), Some(current));
        self.arena.set_children(new, taken);
        new
    }

    pub fn finish(self) -> Forest<T> {
        Forest {
            arena: self.arena,
            root: self.root,
        }
    }
}

/// Build a forest from `items`, inserted in iteration order.
///
/// `contains(a, b)` must mean "a strictly contains b".
#[instrument(level = "debug", skip_all)]
pub fn build<T, I, R>(items: I, contains: R) -> HierarchyResult<Forest<T>>
where
    T: fmt::Debug,
    I: IntoIterator<Item = T>,
    R: Fn(&T, &T) -> bool,
{
    let mut builder = ForestBuilder::new(contains);
    let mut count = 0usize;
    for item in items {
        builder.insert(item)?;
        count += 1;
    }
    debug!(count, "forest built");
    Ok(builder.finish())
}

/// Immutable result of [`build`]: caller items under one synthetic root.
#[derive(Debug)]
pub struct Forest<T> {
    arena: TreeArena<ForestEntry<T>>,
    root: Index,
}

impl<T> Forest<T> {
    pub(crate) fn arena(&self) -> &TreeArena<ForestEntry<T>> {
        &self.arena
    }

    pub fn root(&self) -> NodeRef<'_, ForestEntry<T>> {
        self.arena.node(self.root)
    }

    pub fn node(&self, idx: Index) -> NodeRef<'_, ForestEntry<T>> {
        self.arena.node(idx)
    }

    pub fn item(&self, idx: Index) -> Option<&T> {
        self.arena.get_node(idx).and_then(|n| n.data.item())
    }

    /// Number of items, not counting the root.
    pub fn len(&self) -> usize {
        self.arena.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth in item levels; the root does not count.
    pub fn depth(&self) -> usize {
        self.arena.depth().saturating_sub(1)
    }

    /// Items in pre-order, root excluded.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.arena
            .iter()
            .filter_map(|(idx, node)| node.data.item().map(|item| (idx, item)))
    }

    /// Leaf items in pre-order. An empty forest has no leaves.
    pub fn leaves(&self) -> Vec<&T> {
        self.arena
            .leaf_nodes()
            .into_iter()
            .filter_map(|idx| self.item(idx))
            .collect()
    }

    /// Index of the first node holding an item equal to `item`.
    pub fn find(&self, item: &T) -> Option<Index>
    where
        T: PartialEq,
    {
        self.iter().find(|(_, i)| *i == item).map(|(idx, _)| idx)
    }

    /// Items of the children of `idx`, in child order.
    pub fn child_items(&self, idx: Index) -> Vec<&T> {
        self.arena
            .children(idx)
            .iter()
            .filter_map(|&c| self.item(c))
            .collect()
    }

    /// Item of the parent of `idx`; None when the parent is the root.
    pub fn parent_item(&self, idx: Index) -> Option<&T> {
        self.arena
            .get_node(idx)
            .and_then(|n| n.parent)
            .and_then(|p| self.item(p))
    }

    /// Check that every ancestor contains its descendants and that no two
    /// siblings are related.
    pub fn verify<R>(&self, contains: R) -> HierarchyResult<()>
    where
        T: fmt::Debug,
        R: Fn(&T, &T) -> bool,
    {
        for (idx, item) in self.iter() {
            let node = self.node(idx);
            for ancestor in node.ancestors() {
                if let Some(a) = ancestor.data().item() {
                    if !contains(a, item) {
                        return Err(HierarchyError::MalformedRelation {
                            item: format!("{item:?}"),
                            other: format!("{a:?}"),
                            reason: "is not contained by its ancestor".into(),
                        });
                    }
                }
            }
        }

        for (_, node) in self.arena.iter() {
            let siblings: Vec<&T> = node
                .children
                .iter()
                .filter_map(|&c| self.item(c))
                .collect();
            for (i, x) in siblings.iter().enumerate() {
                for y in &siblings[i + 1..] {
                    if contains(*x, *y) || contains(*y, *x) {
                        return Err(HierarchyError::MalformedRelation {
                            item: format!("{x:?}"),
                            other: format!("{y:?}"),
                            reason: "is related to its sibling".into(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl<'a, T> NodeRef<'a, ForestEntry<T>> {
    /// The caller item, None for the root.
    pub fn item(&self) -> Option<&'a T> {
        self.data().item()
    }
}
