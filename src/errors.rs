use thiserror::Error;

use crate::interval::Interval;

/// Errors raised while building a hierarchy.
///
/// All of them are deterministic and input-driven: retrying cannot help, the
/// caller has to fix the tags or the relation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("malformed relation: {item} {reason} {other}")]
    MalformedRelation {
        item: String,
        other: String,
        reason: String,
    },

    #[error("degenerate interval: tag #{index} [{begin:#x},{end:#x}) {description}")]
    DegenerateInterval {
        index: usize,
        begin: u64,
        end: u64,
        description: String,
    },

    #[error("non-laminar input: {first} partially overlaps {second}")]
    NonLaminarInput { first: String, second: String },

    #[error("tag #{index} {span} lies outside of {bounds}")]
    OutOfBounds {
        index: usize,
        span: Interval,
        bounds: Interval,
    },

    #[error("malformed tag line {line}: {reason}: {content:?}")]
    MalformedTagLine {
        line: usize,
        content: String,
        reason: String,
    },
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;
