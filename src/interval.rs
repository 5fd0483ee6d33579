//! Half-open byte ranges `[begin, end)`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open byte range `[begin, end)`.
///
/// Construction does not validate `begin < end`: dissectors occasionally emit
/// inverted or empty ranges and the coverage layer decides what to do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub begin: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    /// Number of bytes covered, zero for empty or inverted ranges.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    /// True for zero-length and inverted ranges.
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// `self.begin <= other.begin && self.end >= other.end`
    pub fn envelops(&self, other: &Interval) -> bool {
        self.begin <= other.begin && self.end >= other.end
    }

    /// Envelopment with differing lengths; identical spans never strictly envelop.
    pub fn strictly_envelops(&self, other: &Interval) -> bool {
        self.envelops(other) && self.len() != other.len()
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Overlap without either side enveloping the other.
    pub fn partially_overlaps(&self, other: &Interval) -> bool {
        self.overlaps(other) && !self.envelops(other) && !other.envelops(self)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#X},{:#X})", self.begin, self.end)
    }
}

/// Sub-ranges of `span` that none of `claimed` covers, in ascending order.
///
/// Claimed ranges may overlap each other and may stick out of `span`; only the
/// part inside `span` counts.
pub fn interval_fragments<'a, I>(span: Interval, claimed: I) -> Vec<Interval>
where
    I: IntoIterator<Item = &'a Interval>,
{
    let mut claimed: Vec<Interval> = claimed
        .into_iter()
        .filter(|c| !c.is_empty() && c.overlaps(&span))
        .copied()
        .collect();
    claimed.sort();

    let mut fragments = Vec::new();
    let mut cursor = span.begin;
    for c in claimed {
        if c.begin > cursor {
            fragments.push(Interval::new(cursor, c.begin));
        }
        cursor = cursor.max(c.end);
    }
    if cursor < span.end {
        fragments.push(Interval::new(cursor, span.end));
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Interval::new(0, 16), Interval::new(0, 4), true, true)]
    #[case(Interval::new(0, 16), Interval::new(0, 16), true, false)]
    #[case(Interval::new(4, 8), Interval::new(0, 16), false, false)]
    #[case(Interval::new(0, 8), Interval::new(4, 12), false, false)]
    fn test_envelopment(
        #[case] a: Interval,
        #[case] b: Interval,
        #[case] envelops: bool,
        #[case] strictly: bool,
    ) {
        assert_eq!(a.envelops(&b), envelops);
        assert_eq!(a.strictly_envelops(&b), strictly);
    }

    #[test]
    fn test_partial_overlap() {
        assert!(Interval::new(0, 8).partially_overlaps(&Interval::new(4, 12)));
        assert!(!Interval::new(0, 8).partially_overlaps(&Interval::new(8, 12)));
        assert!(!Interval::new(0, 8).partially_overlaps(&Interval::new(2, 4)));
    }

    #[test]
    fn test_len_of_inverted_range_is_zero() {
        let iv = Interval::new(8, 4);
        assert_eq!(iv.len(), 0);
        assert!(iv.is_empty());
    }

    #[test]
    fn test_display_uses_hex() {
        assert_eq!(Interval::new(0, 0x10).to_string(), "[0x0,0x10)");
    }

    #[test]
    fn test_fragments_between_and_after() {
        let claimed = [Interval::new(0, 4), Interval::new(8, 0xC)];
        let frags = interval_fragments(Interval::new(0, 0x10), &claimed);
        assert_eq!(frags, vec![Interval::new(4, 8), Interval::new(0xC, 0x10)]);
    }

    #[test]
    fn test_fragments_with_overlapping_claims() {
        let claimed = [Interval::new(2, 10), Interval::new(4, 6), Interval::new(20, 40)];
        let frags = interval_fragments(Interval::new(0, 32), &claimed);
        assert_eq!(frags, vec![Interval::new(0, 2), Interval::new(10, 20)]);
    }

    #[test]
    fn test_fragments_of_unclaimed_span() {
        let frags = interval_fragments(Interval::new(0, 5), &[]);
        assert_eq!(frags, vec![Interval::new(0, 5)]);
    }
}
