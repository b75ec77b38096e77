//! Coalesced segmented set of i64 values.
//!
//! A [`SegmentSet`] stores an ordered set S ⊆ [i64::MIN, i64::MAX] as a sorted
//! mapping from each maximal contiguous run's inclusive start to its inclusive
//! end. Sets that cluster into runs are represented orders of magnitude more
//! compactly than a dense bitmap, and range queries cost a single ordered-map
//! lookup.

pub mod mutable;
pub mod segment_set;

pub use mutable::MutableSegmentSet;
pub use segment_set::{SegmentSet, SegmentSetStats};

#[cfg(test)]
mod tests;
