//! Codec for an ordered i64 → i64 map.

use std::collections::BTreeMap;

use mikta_common::Result;

use crate::reader::Reader;

const ELEMENT_SIZE: usize = 16;

/// Serializes an ordered map: i32 entry count, then per entry an i64 key
/// and i64 value in ascending key order, all big-endian.
pub fn serialize_ordered_map(map: &BTreeMap<i64, i64>) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + map.len() * ELEMENT_SIZE);
    out.extend_from_slice(&(map.len() as i32).to_be_bytes());
    for (&key, &value) in map {
        out.extend_from_slice(&key.to_be_bytes());
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}

/// Deserializes an ordered map. Empty input yields `None`; a malformed
/// stream fails with `Corrupt`. Duplicate keys are tolerated, last wins.
pub fn deserialize_ordered_map(bytes: &[u8]) -> Result<Option<BTreeMap<i64, i64>>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader::new("ordered map", bytes);
    let count = reader.read_count(ELEMENT_SIZE)?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let key = reader.read_i64()?;
        let value = reader.read_i64()?;
        map.insert(key, value);
    }
    Ok(Some(map))
}
