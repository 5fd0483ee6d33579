//! Containment hierarchies for tagged byte ranges.
//!
//! Two builders share one arena representation:
//! - [`forest::build`] orders arbitrary items by a strict "contains" relation,
//! - [`coverage::build_coverage`] nests dissector tags into a tree whose
//!   inner nodes are tiled exactly by their children.

pub mod arena;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod exitcode;
pub mod forest;
pub mod interval;
pub mod tag;
pub mod tree_traits;
pub mod util;

pub use coverage::{
    build_coverage, build_coverage_with, resolve_parents, CoverageOptions, CoverageTree,
    DegeneratePolicy, Origin, Segment,
};
pub use errors::{HierarchyError, HierarchyResult};
pub use forest::{build, Forest, ForestBuilder, ForestEntry};
pub use interval::{interval_fragments, Interval};
pub use tag::{format_tags, parse_tag_line, parse_tags, ByteOrder, Tag, TagKind};
pub use tree_traits::TreeDisplay;
