//! Coverage hierarchy over tagged byte ranges.
//!
//! Dissectors emit tags in scan order, not nesting order, so parents are
//! resolved directly: every tag is attached to its tightest enclosing tag. The
//! resulting tree is then gap-filled so that the children of every inner node
//! tile the node's span exactly, with synthetic fragment nodes standing in for
//! bytes no tag claimed.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::arena::{NodeRef, TreeArena};
use crate::errors::{HierarchyError, HierarchyResult};
use crate::interval::{interval_fragments, Interval};
use crate::tag::{Tag, TagKind};

/// What to do with tags whose `end <= begin`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Fail with [`HierarchyError::DegenerateInterval`].
    #[default]
    Reject,
    /// Drop the tag with a warning.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageOptions {
    /// Synthesize fragment nodes for unclaimed bytes
    pub fill_gaps: bool,
    pub degenerate: DegeneratePolicy,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            fill_gaps: true,
            degenerate: DegeneratePolicy::Reject,
        }
    }
}

/// Where a coverage node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Root,
    /// Emission index of the tag in the builder input
    Tag(usize),
    Fragment,
}

/// Payload of a coverage node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub span: Interval,
    pub kind: TagKind,
    pub description: String,
    pub origin: Origin,
}

impl Segment {
    fn root(span: Interval) -> Self {
        Self {
            span,
            kind: TagKind::None,
            description: String::new(),
            origin: Origin::Root,
        }
    }

    fn fragment(span: Interval) -> Self {
        Self {
            span,
            kind: TagKind::Fragment,
            description: String::new(),
            origin: Origin::Fragment,
        }
    }

    fn from_tag(index: usize, tag: &Tag) -> Self {
        Self {
            span: tag.span,
            kind: tag.kind.clone(),
            description: tag.description.clone(),
            origin: Origin::Tag(index),
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.origin == Origin::Fragment
    }

    /// One-line rendering: span, length, then kind and description.
    ///
    /// Lengths below 16 print in decimal, larger ones in hex.
    pub fn label(&self, fragment_label: &str) -> String {
        let len = self.span.len();
        let len = if len < 16 {
            len.to_string()
        } else {
            format!("{len:#X}")
        };
        let text = match self.origin {
            Origin::Root => "root".to_string(),
            Origin::Fragment => fragment_label.to_string(),
            Origin::Tag(_) if self.description.is_empty() => self.kind.to_string(),
            Origin::Tag(_) => format!("{} {}", self.kind, self.description),
        };
        format!("{} ({}) {}", self.span, len, text)
    }
}

/// Tightest enclosing tag for every tag, by emission index.
///
/// Tags with identical spans nest in emission order: the first one emitted is
/// the outermost, so a strictly smaller tag attaches to the last-emitted copy.
/// Partial overlap fails with [`HierarchyError::NonLaminarInput`].
pub fn resolve_parents(tags: &[Tag]) -> HierarchyResult<Vec<Option<usize>>> {
    let members: Vec<usize> = (0..tags.len()).collect();
    tightest_parents(tags, &members)
}

/// Sweep over `members` sorted by (begin asc, end desc, emission asc) with a
/// stack of open tags. After popping every tag that ends at or before the
/// current begin, the stack top is the innermost tag still open, which is the
/// only possible tightest parent.
fn tightest_parents(tags: &[Tag], members: &[usize]) -> HierarchyResult<Vec<Option<usize>>> {
    let order = (0..members.len()).sorted_by_key(|&m| {
        let span = tags[members[m]].span;
        (span.begin, Reverse(span.end), members[m])
    });

    let mut parents = vec![None; members.len()];
    let mut open: Vec<usize> = Vec::new();
    for m in order {
        let tag = &tags[members[m]];
        while open
            .last()
            .is_some_and(|&top| tags[members[top]].span.end <= tag.span.begin)
        {
            open.pop();
        }
        if let Some(&top) = open.last() {
            let outer = &tags[members[top]];
            if !outer.span.envelops(&tag.span) {
                return Err(HierarchyError::NonLaminarInput {
                    first: outer.to_string(),
                    second: tag.to_string(),
                });
            }
            parents[m] = Some(members[top]);
        }
        open.push(m);
    }
    Ok(parents)
}

/// Emission indices of the tags that take part in the hierarchy.
fn admit(
    tags: &[Tag],
    file_span: Interval,
    policy: DegeneratePolicy,
) -> HierarchyResult<Vec<usize>> {
    let mut members = Vec::with_capacity(tags.len());
    for (index, tag) in tags.iter().enumerate() {
        if tag.span.is_empty() {
            match policy {
                DegeneratePolicy::Reject => {
                    return Err(HierarchyError::DegenerateInterval {
                        index,
                        begin: tag.span.begin,
                        end: tag.span.end,
                        description: tag.description.clone(),
                    })
                }
                DegeneratePolicy::Skip => {
                    warn!(index, %tag, "skipping degenerate tag");
                    continue;
                }
            }
        }
        if !file_span.envelops(&tag.span) {
            return Err(HierarchyError::OutOfBounds {
                index,
                span: tag.span,
                bounds: file_span,
            });
        }
        if let Some(width) = tag.kind.width() {
            if width != tag.span.len() {
                warn!(index, %tag, width, "tag length disagrees with its kind");
            }
        }
        members.push(index);
    }
    Ok(members)
}

/// Build the gap-filled coverage tree with default options.
pub fn build_coverage(tags: &[Tag], file_span: Interval) -> HierarchyResult<CoverageTree> {
    build_coverage_with(tags, file_span, &CoverageOptions::default())
}

#[instrument(level = "debug", skip(tags, options), fields(count = tags.len()))]
pub fn build_coverage_with(
    tags: &[Tag],
    file_span: Interval,
    options: &CoverageOptions,
) -> HierarchyResult<CoverageTree> {
    let members = admit(tags, file_span, options.degenerate)?;
    let parents = tightest_parents(tags, &members)?;

    let mut arena = TreeArena::new();
    let root = arena.insert_node(Segment::root(file_span), None);
    let node_of: HashMap<usize, Index> = members
        .iter()
        .map(|&i| (i, arena.insert_detached(Segment::from_tag(i, &tags[i]))))
        .collect();
    for (&member, parent) in members.iter().zip(&parents) {
        let parent_node = parent
            .and_then(|p| node_of.get(&p).copied())
            .unwrap_or(root);
        if let Some(&node) = node_of.get(&member) {
            arena.adopt(parent_node, node);
        }
    }

    let fragments = arrange_children(&mut arena, root, options.fill_gaps);
    debug!(tags = members.len(), fragments, "coverage tree built");

    Ok(CoverageTree {
        arena,
        root,
        fragments,
    })
}

/// Sort every child list by offset and, when `fill_gaps` is set, close the
/// holes with fragment nodes. Returns the number of fragments created.
///
/// The root is always filled, so a file without tags still ends up with one
/// fragment over its whole span. Other childless nodes stay leaves.
fn arrange_children(arena: &mut TreeArena<Segment>, root: Index, fill_gaps: bool) -> usize {
    let inner: Vec<(Index, Interval)> = arena
        .iter()
        .filter(|(idx, node)| *idx == root || !node.children.is_empty())
        .map(|(idx, node)| (idx, node.data.span))
        .collect();

    let mut fragments = 0;
    for (idx, span) in inner {
        let mut children = arena.children(idx).to_vec();
        if fill_gaps {
            let claimed: Vec<Interval> = children
                .iter()
                .filter_map(|&c| arena.get_node(c).map(|n| n.data.span))
                .collect();
            for gap in interval_fragments(span, &claimed) {
                children.push(arena.insert_detached(Segment::fragment(gap)));
                fragments += 1;
            }
        }
        children.sort_by_key(|&c| arena.get_node(c).map(|n| n.data.span.begin));
        arena.set_children(idx, children);
    }
    fragments
}

/// Immutable, gap-filled coverage hierarchy.
#[derive(Debug)]
pub struct CoverageTree {
    arena: TreeArena<Segment>,
    root: Index,
    fragments: usize,
}

impl CoverageTree {
    pub(crate) fn arena(&self) -> &TreeArena<Segment> {
        &self.arena
    }

    /// The synthetic root spanning the whole file.
    pub fn root(&self) -> NodeRef<'_, Segment> {
        self.arena.node(self.root)
    }

    pub fn span(&self) -> Interval {
        self.root().span()
    }

    /// All nodes in pre-order, root first.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_, Segment>> {
        self.arena.iter().map(|(idx, _)| self.arena.node(idx))
    }

    /// Leaves in offset order; fragments included.
    pub fn leaves(&self) -> Vec<NodeRef<'_, Segment>> {
        self.arena
            .leaf_nodes()
            .into_iter()
            .map(|idx| self.arena.node(idx))
            .collect()
    }

    /// Depth in nodes, root included.
    pub fn depth(&self) -> usize {
        self.arena.depth()
    }

    /// Nodes in the tree: root, tags and fragments.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// First node in pre-order whose description equals `description`.
    pub fn find(&self, description: &str) -> Option<NodeRef<'_, Segment>> {
        self.iter()
            .find(|n| n.origin_tag().is_some() && n.description() == description)
    }

    /// Parent tag of every tag in the tree, keyed by emission index.
    /// None means the tag hangs directly off the root.
    pub fn parent_map(&self) -> BTreeMap<usize, Option<usize>> {
        self.iter()
            .filter_map(|n| {
                let index = n.origin_tag()?;
                let parent = n.parent().and_then(|p| p.origin_tag());
                Some((index, parent))
            })
            .collect()
    }

    /// Tags in pre-order, each with the position of its parent tag in the
    /// same list. Fragments and the root are left out.
    pub fn flatten(&self) -> Vec<(Tag, Option<usize>)> {
        let mut position: HashMap<Index, usize> = HashMap::new();
        let mut flat = Vec::new();
        for node in self.iter() {
            if node.origin_tag().is_none() {
                continue;
            }
            let parent = node
                .parent()
                .and_then(|p| position.get(&p.index()).copied());
            position.insert(node.index(), flat.len());
            let seg = node.data();
            flat.push((
                Tag {
                    span: seg.span,
                    kind: seg.kind.clone(),
                    description: seg.description.clone(),
                },
                parent,
            ));
        }
        flat
    }
}

impl<'a> NodeRef<'a, Segment> {
    pub fn span(&self) -> Interval {
        self.data().span
    }

    pub fn begin(&self) -> u64 {
        self.data().span.begin
    }

    pub fn end(&self) -> u64 {
        self.data().span.end
    }

    pub fn kind(&self) -> &'a TagKind {
        &self.data().kind
    }

    pub fn description(&self) -> &'a str {
        &self.data().description
    }

    pub fn is_fragment(&self) -> bool {
        self.data().is_fragment()
    }

    /// Emission index of the tag behind this node.
    pub fn origin_tag(&self) -> Option<usize> {
        match self.data().origin {
            Origin::Tag(index) => Some(index),
            _ => None,
        }
    }
}
