//! Codec for [`SegmentSet`].

use mikta_common::Result;
use mikta_interval_set::{MutableSegmentSet, SegmentSet};

use crate::reader::Reader;

const ELEMENT_SIZE: usize = 16;

/// Serializes a segment set: i32 segment count, then per segment an i64
/// inclusive start and i64 inclusive end, all big-endian.
pub fn serialize_segment_set(set: &SegmentSet) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + set.segment_count() * ELEMENT_SIZE);
    out.extend_from_slice(&(set.segment_count() as i32).to_be_bytes());
    for range in set.ranges() {
        out.extend_from_slice(&range.start().to_be_bytes());
        out.extend_from_slice(&range.end().to_be_bytes());
    }
    out
}

/// Deserializes a segment set. Empty input yields `None`; a malformed
/// stream or a segment with start > end fails with `Corrupt`. Overlapping
/// or adjacent segments are tolerated and coalesce.
pub fn deserialize_segment_set(bytes: &[u8]) -> Result<Option<SegmentSet>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::new("segment set", bytes);
    let count = reader.read_count(ELEMENT_SIZE)?;
    let mut set = MutableSegmentSet::new();
    for _ in 0..count {
        let start = reader.read_i64()?;
        let end = reader.read_i64()?;
        if start > end {
            return Err(reader.corrupt(format!("segment start {start} exceeds end {end}")));
        }
        set.add_range(start..=end);
    }
    Ok(Some(set.into_set()))
}
