//! Read surface of the coalesced segment set.
//!
//! Representation
//! - An ordered map from each segment's inclusive start to its inclusive end.
//! - Segments are pairwise disjoint and never adjacent: for consecutive
//!   segments [a, b] and [c, d] with a < c, it always holds that c > b + 1.
//!   Adjacent or overlapping insertions coalesce into a single segment.
//! - The empty set stores no segments.
//!
//! Every public operation preserves this canonical form, so structural
//! equality of the segment store is set equality.

use std::{collections::BTreeMap, ops::RangeInclusive};

use itertools::Itertools;
use mikta_common::{Result, error::Error};

use crate::mutable::MutableSegmentSet;

/// An ordered set of i64 values stored as coalesced inclusive segments.
///
/// `SegmentSet` is the immutable surface: membership, navigation, iteration,
/// and set-theoretic combinators. Mutation goes through
/// [`MutableSegmentSet`], which derefs to this type.
#[derive(Clone, Default)]
pub struct SegmentSet {
    segments: BTreeMap<i64, i64>,
}

impl SegmentSet {
    /// Creates an empty set.
    pub fn new() -> SegmentSet {
        SegmentSet {
            segments: BTreeMap::new(),
        }
    }

    /// Builds a set from `(start, end)` segment pairs, validating canonical
    /// form.
    ///
    /// The pairs must be sorted by start, each with `start <= end`, pairwise
    /// disjoint and non-adjacent. Fails with `InvalidArgument` otherwise; use
    /// the `FromIterator` impl to build from arbitrary ranges with coalescing.
    pub fn from_segments(segments: impl IntoIterator<Item = (i64, i64)>) -> Result<SegmentSet> {
        let mut map = BTreeMap::new();
        let mut prev: Option<(i64, i64)> = None;
        for (start, end) in segments {
            if start > end {
                return Err(Error::invalid_arg(
                    "segments",
                    format!("segment start {start} exceeds end {end}"),
                ));
            }
            if let Some((ps, pe)) = prev {
                if (start as i128) <= (pe as i128) + 1 {
                    return Err(Error::invalid_arg(
                        "segments",
                        format!("segment {start}..={end} overlaps or touches {ps}..={pe}"),
                    ));
                }
            }
            map.insert(start, end);
            prev = Some((start, end));
        }
        Ok(SegmentSet { segments: map })
    }

    pub(crate) fn map_mut(&mut self) -> &mut BTreeMap<i64, i64> {
        &mut self.segments
    }

    /// True when the set stores no elements.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of stored segments (maximal contiguous runs).
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of stored elements, saturating at `u64::MAX`.
    ///
    /// The cardinality of the full i64 domain is 2^64 and does not fit in a
    /// u64; such sets report `u64::MAX` rather than wrapping.
    pub fn len(&self) -> u64 {
        let total: u128 = self
            .segments
            .iter()
            .map(|(&s, &e)| (e as i128 - s as i128 + 1) as u128)
            .sum();
        total.min(u64::MAX as u128) as u64
    }

    /// The segment with the greatest start `<= value`, if any.
    #[inline]
    fn floor_segment(&self, value: i64) -> Option<(i64, i64)> {
        self.segments
            .range(..=value)
            .next_back()
            .map(|(&s, &e)| (s, e))
    }

    /// Tests membership of a single value. O(log n).
    pub fn contains(&self, value: i64) -> bool {
        match self.floor_segment(value) {
            Some((_, end)) => value <= end,
            None => false,
        }
    }

    /// True when every element of `range` is a member.
    ///
    /// An empty range is trivially contained. A range spanning two distinct
    /// segments is never contained, since those would already have coalesced.
    pub fn contains_range(&self, range: RangeInclusive<i64>) -> bool {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return true;
        }
        match self.floor_segment(lo) {
            Some((_, end)) => end >= hi,
            None => false,
        }
    }

    /// True when at least one element of `range` is a member.
    pub fn contains_any(&self, range: RangeInclusive<i64>) -> bool {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return false;
        }
        if let Some((_, end)) = self.floor_segment(lo) {
            if end >= lo {
                return true;
            }
        }
        self.segments.range(lo..=hi).next().is_some()
    }

    /// Smallest stored element, or `None` for the empty set.
    pub fn find_first(&self) -> Option<i64> {
        self.segments.first_key_value().map(|(&s, _)| s)
    }

    /// Largest stored element, or `None` for the empty set.
    pub fn find_last(&self) -> Option<i64> {
        self.segments.last_key_value().map(|(_, &e)| e)
    }

    /// Smallest member `>= from`, or `None`.
    pub fn find_next(&self, from: i64) -> Option<i64> {
        if let Some((_, end)) = self.floor_segment(from) {
            if end >= from {
                return Some(from);
            }
        }
        self.segments.range(from..).next().map(|(&s, _)| s)
    }

    /// Largest member `<= from`, or `None`.
    pub fn find_previous(&self, from: i64) -> Option<i64> {
        self.floor_segment(from)
            .map(|(_, end)| if end >= from { from } else { end })
    }

    /// Smallest non-member `>= from`, or `None`.
    ///
    /// Returns `None` only when `from` lies in a segment that runs through
    /// `i64::MAX`.
    pub fn find_next_absent(&self, from: i64) -> Option<i64> {
        match self.floor_segment(from) {
            Some((_, end)) if end >= from => {
                if end == i64::MAX {
                    None
                } else {
                    // end + 1 is absent: a successor segment would have
                    // coalesced if it started there
                    Some(end + 1)
                }
            }
            _ => Some(from),
        }
    }

    /// Largest non-member `<= from`, or `None`.
    ///
    /// Returns `None` only when `from` lies in a segment that starts at
    /// `i64::MIN`.
    pub fn find_previous_absent(&self, from: i64) -> Option<i64> {
        match self.floor_segment(from) {
            Some((start, end)) if end >= from => {
                if start == i64::MIN {
                    None
                } else {
                    Some(start - 1)
                }
            }
            _ => Some(from),
        }
    }

    /// True when some member is `>= from`.
    pub fn has_next(&self, from: i64) -> bool {
        self.find_next(from).is_some()
    }

    /// True when some member is `<= from`.
    pub fn has_previous(&self, from: i64) -> bool {
        self.find_previous(from).is_some()
    }

    /// Smallest stored element. Fails with `NotFound` on the empty set.
    pub fn first(&self) -> Result<i64> {
        self.find_first()
            .ok_or_else(|| Error::not_found("first element of an empty set"))
    }

    /// Largest stored element. Fails with `NotFound` on the empty set.
    pub fn last(&self) -> Result<i64> {
        self.find_last()
            .ok_or_else(|| Error::not_found("last element of an empty set"))
    }

    /// Smallest member `>= from`. Fails with `NotFound` when none exists.
    pub fn next(&self, from: i64) -> Result<i64> {
        self.find_next(from)
            .ok_or_else(|| Error::not_found(format!("element >= {from}")))
    }

    /// Largest member `<= from`. Fails with `NotFound` when none exists.
    pub fn previous(&self, from: i64) -> Result<i64> {
        self.find_previous(from)
            .ok_or_else(|| Error::not_found(format!("element <= {from}")))
    }

    /// Smallest non-member `>= from`. Fails with `NotFound` when none exists.
    pub fn next_absent(&self, from: i64) -> Result<i64> {
        self.find_next_absent(from)
            .ok_or_else(|| Error::not_found(format!("absent element >= {from}")))
    }

    /// Largest non-member `<= from`. Fails with `NotFound` when none exists.
    pub fn previous_absent(&self, from: i64) -> Result<i64> {
        self.find_previous_absent(from)
            .ok_or_else(|| Error::not_found(format!("absent element <= {from}")))
    }

    /// Iterates stored segments in ascending order.
    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<i64>> + '_ {
        self.segments.iter().map(|(&s, &e)| s..=e)
    }

    /// Iterates individual stored values in ascending order.
    ///
    /// Every value of every segment is yielded, so the iteration cost is
    /// proportional to the cardinality, not the segment count.
    pub fn iter(&self) -> ElementIter<'_> {
        ElementIter {
            segments: self.segments.iter(),
            current: None,
        }
    }

    /// Summarizes the set in one pass over its segments.
    pub fn compute_stats(&self) -> SegmentSetStats {
        let mut element_count: u128 = 0;
        let mut largest_segment_len: u128 = 0;
        for (&start, &end) in &self.segments {
            let len = (end as i128 - start as i128 + 1) as u128;
            element_count += len;
            largest_segment_len = largest_segment_len.max(len);
        }
        SegmentSetStats {
            segment_count: self.segments.len(),
            element_count: element_count.min(u64::MAX as u128) as u64,
            largest_segment_len: largest_segment_len.min(u64::MAX as u128) as u64,
            min: self.find_first(),
            max: self.find_last(),
        }
    }

    /// Visits stored segments in ascending order.
    pub fn for_each_range(&self, mut action: impl FnMut(RangeInclusive<i64>)) {
        for range in self.ranges() {
            action(range);
        }
    }

    /// Iterates maximal absent runs inside `within`, in ascending order.
    pub fn absent_ranges(&self, within: RangeInclusive<i64>) -> AbsentRanges<'_> {
        let (lo, hi) = (*within.start(), *within.end());
        AbsentRanges {
            set: self,
            cursor: if lo <= hi { Some(lo) } else { None },
            hi,
        }
    }

    /// Visits maximal absent runs inside `within`, in ascending order.
    pub fn for_each_absent_range(
        &self,
        within: RangeInclusive<i64>,
        mut action: impl FnMut(RangeInclusive<i64>),
    ) {
        for range in self.absent_ranges(within) {
            action(range);
        }
    }

    /// Set union. Iterates the set with fewer segments, adding its ranges to
    /// a copy of the other.
    pub fn union(&self, other: &SegmentSet) -> SegmentSet {
        let (small, large) = if self.segment_count() <= other.segment_count() {
            (self, other)
        } else {
            (other, self)
        };
        let mut result = MutableSegmentSet::from_set(large.clone());
        for range in small.ranges() {
            result.add_range(range);
        }
        result.into_set()
    }

    /// Set intersection.
    ///
    /// Walks the segments of `self`; within each, floor and ceiling lookups
    /// into `other` emit the overlapping pieces.
    pub fn intersect(&self, other: &SegmentSet) -> SegmentSet {
        let mut out = BTreeMap::new();
        for (&start, &end) in &self.segments {
            let mut current = start;
            while current <= end {
                if let Some((_, other_end)) = other.floor_segment(current) {
                    if other_end >= current {
                        let piece_end = end.min(other_end);
                        out.insert(current, piece_end);
                        if piece_end == i64::MAX {
                            break;
                        }
                        current = piece_end + 1;
                        continue;
                    }
                }
                // current is not covered; jump to the next segment of `other`
                match other.segments.range(current..).next() {
                    Some((&other_start, _)) if other_start <= end => current = other_start,
                    _ => break,
                }
            }
        }
        SegmentSet { segments: out }
    }

    /// Symmetric difference: `(A ∪ B)` with `(A ∩ B)` removed.
    pub fn xor(&self, other: &SegmentSet) -> SegmentSet {
        let mut result = MutableSegmentSet::from_set(self.union(other));
        for range in self.intersect(other).ranges() {
            result.remove_range(range);
        }
        result.into_set()
    }

    /// Alias for [`intersect`](Self::intersect).
    pub fn and(&self, other: &SegmentSet) -> SegmentSet {
        self.intersect(other)
    }

    /// Alias for [`union`](Self::union).
    pub fn or(&self, other: &SegmentSet) -> SegmentSet {
        self.union(other)
    }

    /// A new set with every segment moved up by `amount`.
    ///
    /// A negative `amount` delegates to [`shifted_left`](Self::shifted_left).
    /// Panics if a shifted endpoint leaves the i64 domain.
    pub fn shifted_right(&self, amount: i64) -> SegmentSet {
        if amount < 0 {
            return self.shifted_left(amount.checked_neg().unwrap_or_else(|| {
                panic!("arithmetic overflow: cannot negate shift amount {amount}")
            }));
        }
        let segments = self
            .segments
            .iter()
            .map(|(&s, &e)| (Self::shift_up(s, amount), Self::shift_up(e, amount)))
            .collect();
        SegmentSet { segments }
    }

    /// A new set with every segment moved down by `amount`.
    ///
    /// A negative `amount` delegates to [`shifted_right`](Self::shifted_right).
    /// Panics if a shifted endpoint leaves the i64 domain.
    pub fn shifted_left(&self, amount: i64) -> SegmentSet {
        if amount < 0 {
            return self.shifted_right(amount.checked_neg().unwrap_or_else(|| {
                panic!("arithmetic overflow: cannot negate shift amount {amount}")
            }));
        }
        let segments = self
            .segments
            .iter()
            .map(|(&s, &e)| (Self::shift_down(s, amount), Self::shift_down(e, amount)))
            .collect();
        SegmentSet { segments }
    }

    #[inline]
    fn shift_up(value: i64, amount: i64) -> i64 {
        value.checked_add(amount).unwrap_or_else(|| {
            panic!("arithmetic overflow: cannot shift {value} up by {amount}")
        })
    }

    #[inline]
    fn shift_down(value: i64, amount: i64) -> i64 {
        value.checked_sub(amount).unwrap_or_else(|| {
            panic!("arithmetic overflow: cannot shift {value} down by {amount}")
        })
    }

    /// The subset of members inside `range`, with boundary segments clipped.
    pub fn subset(&self, range: RangeInclusive<i64>) -> SegmentSet {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return SegmentSet::new();
        }
        let mut out = BTreeMap::new();
        if let Some((start, end)) = self.floor_segment(lo) {
            if start < lo && end >= lo {
                out.insert(lo, end.min(hi));
            }
        }
        for (&start, &end) in self.segments.range(lo..=hi) {
            out.insert(start, end.min(hi));
        }
        SegmentSet { segments: out }
    }

    /// Complement over the unbounded i64 domain. Always fails with
    /// `Unsupported`.
    ///
    /// Complement a bounded window instead: `subset(r)` followed by
    /// [`MutableSegmentSet::flip_range`] over the same window.
    pub fn complement(&self) -> Result<SegmentSet> {
        Err(Error::unsupported(
            "complement over the unbounded integer domain",
        ))
    }

    /// Asserts canonical form. Intended for tests and debugging.
    #[track_caller]
    pub fn check_invariants(&self) {
        for (&start, &end) in &self.segments {
            assert!(start <= end, "segment {start}..={end} has start > end");
        }
        for ((&s0, &e0), (&s1, _)) in self.segments.iter().tuple_windows() {
            assert!(
                (s1 as i128) > (e0 as i128) + 1,
                "segments {s0}..={e0} and starting at {s1} overlap or touch"
            );
        }
    }
}

impl PartialEq for SegmentSet {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for SegmentSet {}

impl std::fmt::Debug for SegmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ranges()).finish()
    }
}

impl FromIterator<RangeInclusive<i64>> for SegmentSet {
    /// Builds a set from arbitrary ranges, coalescing as needed.
    fn from_iter<I: IntoIterator<Item = RangeInclusive<i64>>>(iter: I) -> Self {
        iter.into_iter().collect::<MutableSegmentSet>().into_set()
    }
}

/// Summary of a [`SegmentSet`] produced by [`SegmentSet::compute_stats`].
///
/// Counts saturate at `u64::MAX` like [`SegmentSet::len`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentSetStats {
    pub segment_count: usize,
    pub element_count: u64,
    pub largest_segment_len: u64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Iterator over individual stored values, created by [`SegmentSet::iter`].
pub struct ElementIter<'a> {
    segments: std::collections::btree_map::Iter<'a, i64, i64>,
    current: Option<(i64, i64)>,
}

impl Iterator for ElementIter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            match self.current {
                Some((value, end)) => {
                    self.current = if value < end { Some((value + 1, end)) } else { None };
                    return Some(value);
                }
                None => {
                    let (&start, &end) = self.segments.next()?;
                    self.current = Some((start, end));
                }
            }
        }
    }
}

/// Iterator over maximal absent runs inside a caller window.
///
/// Created by [`SegmentSet::absent_ranges`]. Alternates next-absent and
/// next-present lookups, clipping the final gap to the window's upper bound.
pub struct AbsentRanges<'a> {
    set: &'a SegmentSet,
    cursor: Option<i64>,
    hi: i64,
}

impl Iterator for AbsentRanges<'_> {
    type Item = RangeInclusive<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        let gap_start = match self.set.find_next_absent(current) {
            Some(gap) if gap <= self.hi => gap,
            _ => {
                self.cursor = None;
                return None;
            }
        };
        let gap_end = match self.set.find_next(gap_start) {
            Some(present) => (present - 1).min(self.hi),
            None => self.hi,
        };
        self.cursor = if gap_end == i64::MAX {
            None
        } else {
            Some(gap_end + 1)
        };
        Some(gap_start..=gap_end)
    }
}
