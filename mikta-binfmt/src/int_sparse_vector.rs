//! Codec for [`IntSparseVector`].

use mikta_common::Result;
use mikta_sparse_vec::IntSparseVector;

use crate::reader::Reader;

const ELEMENT_SIZE: usize = 8;

/// Serializes an integer sparse vector: i32 entry count, then per entry an
/// i32 index and i32 value, all big-endian.
pub fn serialize_int_sparse_vector(vector: &IntSparseVector) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + vector.non_zero_count() * ELEMENT_SIZE);
    out.extend_from_slice(&(vector.non_zero_count() as i32).to_be_bytes());
    for (index, value) in vector.iter_non_zero() {
        out.extend_from_slice(&index.to_be_bytes());
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}

/// Deserializes an integer sparse vector. Empty input yields `None`; a
/// malformed stream fails with `Corrupt`. Entries with a zero value are
/// tolerated and dropped.
pub fn deserialize_int_sparse_vector(bytes: &[u8]) -> Result<Option<IntSparseVector>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::new("int sparse vector", bytes);
    let count = reader.read_count(ELEMENT_SIZE)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let index = reader.read_i32()?;
        let value = reader.read_i32()?;
        entries.push((index, value));
    }
    Ok(Some(IntSparseVector::from_entries(entries)))
}
