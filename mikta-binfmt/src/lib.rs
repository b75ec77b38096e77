//! Stable binary codecs for the mikta data structures.
//!
//! All layouts are big-endian (network byte order) and length-prefixed:
//! an i32 element count followed by fixed-width elements. The byte layout
//! is compatibility-critical for durable column storage, so every field is
//! written and read explicitly.
//!
//! | value | header | element |
//! |---|---|---|
//! | `SegmentSet` | i32 count | i64 start, i64 end |
//! | `SparseVector` | i32 count | i32 index, f64 value |
//! | `IntSparseVector` | i32 count | i32 index, i32 value |
//! | `BTreeMap<i64, i64>` | i32 count | i64 key, i64 value |
//!
//! Serialization always emits canonical form in ascending key order.
//! Deserialization maps an empty input to `None`, fails with `Corrupt` on a
//! short, truncated, or oversized stream, and tolerates non-canonical
//! content (overlapping or adjacent segments coalesce, zero vector values
//! drop).

mod reader;

pub mod int_sparse_vector;
pub mod ordered_map;
pub mod segment_set;
pub mod sparse_vector;

pub use int_sparse_vector::{deserialize_int_sparse_vector, serialize_int_sparse_vector};
pub use ordered_map::{deserialize_ordered_map, serialize_ordered_map};
pub use segment_set::{deserialize_segment_set, serialize_segment_set};
pub use sparse_vector::{deserialize_sparse_vector, serialize_sparse_vector};
