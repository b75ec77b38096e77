//! Mutable surface of the coalesced segment set.

use std::ops::{Deref, RangeInclusive};

use mikta_common::Result;

use crate::segment_set::SegmentSet;

/// A [`SegmentSet`] with mutation operations.
///
/// Every mutation restores canonical form before returning: no overlapping
/// or adjacent segments, no empty segments. The read surface is available
/// through `Deref`, [`as_set`](Self::as_set) borrows it explicitly, and
/// [`to_set`](Self::to_set) snapshots an independent immutable copy. `Clone`
/// yields an independent mutable copy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MutableSegmentSet {
    set: SegmentSet,
}

impl MutableSegmentSet {
    /// Creates an empty set.
    pub fn new() -> MutableSegmentSet {
        MutableSegmentSet {
            set: SegmentSet::new(),
        }
    }

    /// Builds a set from `(start, end)` pairs, validating canonical form.
    pub fn from_segments(
        segments: impl IntoIterator<Item = (i64, i64)>,
    ) -> Result<MutableSegmentSet> {
        Ok(MutableSegmentSet {
            set: SegmentSet::from_segments(segments)?,
        })
    }

    /// Wraps an immutable set for further mutation.
    pub fn from_set(set: SegmentSet) -> MutableSegmentSet {
        MutableSegmentSet { set }
    }

    /// Borrows the read-only surface (the shared view).
    pub fn as_set(&self) -> &SegmentSet {
        &self.set
    }

    /// An independent immutable snapshot of the current contents.
    pub fn to_set(&self) -> SegmentSet {
        self.set.clone()
    }

    /// Unwraps into the immutable set, consuming self.
    pub fn into_set(self) -> SegmentSet {
        self.set
    }

    /// Adds a single value.
    pub fn insert(&mut self, value: i64) {
        self.add_range(value..=value);
    }

    /// Removes a single value.
    pub fn remove(&mut self, value: i64) {
        self.remove_range(value..=value);
    }

    /// Removes all values.
    pub fn clear(&mut self) {
        self.set.map_mut().clear();
    }

    /// Adds every value in `range`, coalescing with overlapping or adjacent
    /// segments. An empty range is a no-op.
    ///
    /// Cost is O((1 + k) log n) where k segments are absorbed.
    pub fn add_range(&mut self, range: RangeInclusive<i64>) {
        let (mut lo, mut hi) = (*range.start(), *range.end());
        if lo > hi {
            return;
        }
        let segments = self.set.map_mut();

        // Absorb a predecessor that overlaps or touches the new range.
        let probe = if lo == i64::MIN { lo } else { lo - 1 };
        if let Some((&start, &end)) = segments.range(..=probe).next_back() {
            if end >= probe {
                segments.remove(&start);
                lo = lo.min(start);
                hi = hi.max(end);
            }
        }

        // Absorb every successor starting within the range or just past it.
        loop {
            match segments.range(lo..).next().map(|(&s, &e)| (s, e)) {
                Some((start, end)) if hi == i64::MAX || start <= hi + 1 => {
                    segments.remove(&start);
                    hi = hi.max(end);
                }
                _ => break,
            }
        }

        segments.insert(lo, hi);
    }

    /// Removes every value in `range`. An empty range is a no-op.
    ///
    /// A segment straddling the lower bound keeps its leading piece, one
    /// straddling the upper bound keeps its trailing piece, and segments
    /// wholly inside the range are dropped.
    pub fn remove_range(&mut self, range: RangeInclusive<i64>) {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return;
        }
        let segments = self.set.map_mut();

        // Trim a segment straddling the lower bound. `start < lo` implies
        // lo > i64::MIN, so lo - 1 cannot underflow.
        if let Some((&start, &end)) = segments.range(..lo).next_back() {
            if end >= lo {
                segments.insert(start, lo - 1);
                if end > hi {
                    segments.insert(hi + 1, end);
                    return;
                }
            }
        }

        // Drop segments starting inside the range; the last may leave a
        // trailing piece past the upper bound.
        let starts: Vec<i64> = segments.range(lo..=hi).map(|(&s, _)| s).collect();
        for start in starts {
            let end = segments.remove(&start).expect("collected start");
            if end > hi {
                segments.insert(hi + 1, end);
            }
        }
    }

    /// Inverts membership of every value in `range`. An empty range is a
    /// no-op.
    pub fn flip_range(&mut self, range: RangeInclusive<i64>) {
        let (lo, hi) = (*range.start(), *range.end());
        if lo > hi {
            return;
        }
        let present = self.set.subset(lo..=hi);
        self.remove_range(lo..=hi);

        let mut cursor = Some(lo);
        for piece in present.ranges() {
            let (start, end) = (*piece.start(), *piece.end());
            let from = match cursor {
                Some(from) => from,
                None => break,
            };
            if from < start {
                self.add_range(from..=start - 1);
            }
            cursor = if end == i64::MAX { None } else { Some(end + 1) };
        }
        if let Some(from) = cursor {
            if from <= hi {
                self.add_range(from..=hi);
            }
        }
    }

    /// In-place union: adds every segment of `other`.
    pub fn union_with(&mut self, other: &SegmentSet) {
        for range in other.ranges() {
            self.add_range(range);
        }
    }

    /// In-place intersection.
    pub fn intersect_with(&mut self, other: &SegmentSet) {
        self.set = self.set.intersect(other);
    }

    /// In-place symmetric difference.
    pub fn xor_with(&mut self, other: &SegmentSet) {
        self.set = self.set.xor(other);
    }
}

impl Deref for MutableSegmentSet {
    type Target = SegmentSet;

    fn deref(&self) -> &SegmentSet {
        &self.set
    }
}

impl std::fmt::Debug for MutableSegmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.set.fmt(f)
    }
}

impl FromIterator<RangeInclusive<i64>> for MutableSegmentSet {
    fn from_iter<I: IntoIterator<Item = RangeInclusive<i64>>>(iter: I) -> Self {
        let mut set = MutableSegmentSet::new();
        for range in iter {
            set.add_range(range);
        }
        set
    }
}
