use generational_arena::{Arena, Index};
use tracing::instrument;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode<D> {
    /// Payload carried by this node
    pub data: D,
    /// Index of parent node in the arena, None for the root and detached nodes.
    /// Lookup only: ownership runs parent -> children.
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// Arena-based tree structure.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are never removed: reparenting only moves indices between child
/// lists, so every index handed out stays valid for the arena's lifetime.
#[derive(Debug)]
pub struct TreeArena<D> {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode<D>>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
}

impl<D> Default for TreeArena<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> TreeArena<D> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a node below `parent`, or as the new root when `parent` is None.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert_node(&mut self, data: D, parent: Option<Index>) -> Index {
        let node_idx = self.insert_detached(data);
        match parent {
            Some(parent_idx) => self.adopt(parent_idx, node_idx),
            None => self.root = Some(node_idx),
        }
        node_idx
    }

    /// Insert a node that is not yet linked into the tree.
    pub fn insert_detached(&mut self, data: D) -> Index {
        self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Append `child` to `parent`'s children and point it back at `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn adopt(&mut self, parent: Index, child: Index) {
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.arena.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Put `new` where `old` sits in `parent`'s child list. `old` is left detached.
    #[instrument(level = "trace", skip(self))]
    pub fn replace_child(&mut self, parent: Index, old: Index, new: Index) -> bool {
        let replaced = match self.arena.get_mut(parent) {
            Some(p) => match p.children.iter().position(|&c| c == old) {
                Some(pos) => {
                    p.children[pos] = new;
                    true
                }
                None => false,
            },
            None => false,
        };
        if replaced {
            if let Some(n) = self.arena.get_mut(new) {
                n.parent = Some(parent);
            }
            if let Some(o) = self.arena.get_mut(old) {
                o.parent = None;
            }
        }
        replaced
    }

    /// Detach and return the children of `parent` matching `pred`, keeping the order.
    pub fn take_children<F>(&mut self, parent: Index, mut pred: F) -> Vec<Index>
    where
        F: FnMut(Index) -> bool,
    {
        let Some(p) = self.arena.get_mut(parent) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<Index>, Vec<Index>) =
            p.children.iter().copied().partition(|&c| pred(c));
        p.children = kept;
        for &c in &taken {
            if let Some(node) = self.arena.get_mut(c) {
                node.parent = None;
            }
        }
        taken
    }

    /// Replace the whole child list of `parent`, re-pointing every child at it.
    pub fn set_children(&mut self, parent: Index, children: Vec<Index>) {
        for &c in &children {
            if let Some(node) = self.arena.get_mut(c) {
                node.parent = Some(parent);
            }
        }
        if let Some(p) = self.arena.get_mut(parent) {
            p.children = children;
        }
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode<D>> {
        self.arena.get(idx)
    }

    /// Children of `idx`, empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Borrowing handle for `idx`.
    ///
    /// # Panics
    /// If `idx` did not come from this arena.
    pub fn node(&self, idx: Index) -> NodeRef<'_, D> {
        NodeRef {
            arena: self,
            index: idx,
            node: &self.arena[idx],
        }
    }

    pub fn iter(&self) -> TreeIterator<'_, D> {
        TreeIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Collects all leaf nodes (nodes with no children) in pre-order.
    ///
    /// Empty trees return an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<Index> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Read-only handle on one node, borrowing the whole arena.
pub struct NodeRef<'a, D> {
    arena: &'a TreeArena<D>,
    index: Index,
    node: &'a TreeNode<D>,
}

impl<D> Clone for NodeRef<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for NodeRef<'_, D> {}

impl<D: std::fmt::Debug> std::fmt::Debug for NodeRef<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.index)
            .field("data", &self.node.data)
            .field("children", &self.node.children.len())
            .finish()
    }
}

impl<'a, D> NodeRef<'a, D> {
    pub fn index(&self) -> Index {
        self.index
    }

    pub fn data(&self) -> &'a D {
        &self.node.data
    }

    pub fn parent(&self) -> Option<NodeRef<'a, D>> {
        self.node.parent.map(|p| self.arena.node(p))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'a, D>> + 'a {
        let arena = self.arena;
        self.node.children.iter().map(move |&c| arena.node(c))
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.node.children.is_empty()
    }

    /// Ancestors from the parent upwards, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a, D>> + 'a {
        std::iter::successors(self.parent(), |n| n.parent())
    }
}

pub struct TreeIterator<'a, D> {
    arena: &'a TreeArena<D>,
    stack: Vec<Index>,
}

impl<'a, D> TreeIterator<'a, D> {
    fn new(arena: &'a TreeArena<D>) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a, D> Iterator for TreeIterator<'a, D> {
    type Item = (Index, &'a TreeNode<D>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      root
    //      /  \
    // child1 child2
    //    |
    // grandchild1
    fn sample() -> (TreeArena<&'static str>, [Index; 4]) {
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", None);
        let child1 = tree.insert_node("child1", Some(root));
        let child2 = tree.insert_node("child2", Some(root));
        let grandchild1 = tree.insert_node("grandchild1", Some(child1));
        (tree, [root, child1, child2, grandchild1])
    }

    #[test]
    fn test_preorder() {
        let (tree, _) = sample();
        let pre: Vec<_> = tree.iter().map(|(_, n)| n.data).collect();
        assert_eq!(pre, vec!["root", "child1", "grandchild1", "child2"]);
    }

    #[test]
    fn test_depth_and_leaves() {
        let (tree, [_, _, child2, grandchild1]) = sample();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_nodes(), vec![grandchild1, child2]);
        assert_eq!(TreeArena::<u8>::new().depth(), 0);
    }

    #[test]
    fn test_replace_child_keeps_position() {
        let (mut tree, [root, child1, child2, _]) = sample();
        let wrapper = tree.insert_detached("wrapper");
        assert!(tree.replace_child(root, child1, wrapper));
        tree.adopt(wrapper, child1);

        assert_eq!(tree.children(root), &[wrapper, child2]);
        assert_eq!(tree.get_node(child1).unwrap().parent, Some(wrapper));
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_take_children_detaches_matches() {
        let (mut tree, [root, child1, child2, _]) = sample();
        let taken = tree.take_children(root, |c| c == child2);
        assert_eq!(taken, vec![child2]);
        assert_eq!(tree.children(root), &[child1]);
        assert_eq!(tree.get_node(child2).unwrap().parent, None);
    }

    #[test]
    fn test_node_ref_navigation() {
        let (tree, [root, child1, _, grandchild1]) = sample();
        let gc = tree.node(grandchild1);
        let ancestors: Vec<_> = gc.ancestors().map(|n| n.index()).collect();
        assert_eq!(ancestors, vec![child1, root]);
        let names: Vec<_> = tree.node(root).children().map(|n| *n.data()).collect();
        assert_eq!(names, vec!["child1", "child2"]);
        assert!(gc.is_leaf());
    }
}
