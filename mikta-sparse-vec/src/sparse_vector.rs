//! Sparse vector with f64 values.

use std::{collections::BTreeMap, ops::{Deref, RangeInclusive}};

use mikta_common::{Result, error::Error};

/// A sparse vector over f64 values: an ordered mapping from i32 index to
/// non-zero value.
///
/// The zero test is the arithmetic comparison `value == 0.0`, so both +0.0
/// and -0.0 are absent while NaN (which fails the comparison) is storable
/// and preserved verbatim. This is the read surface; mutation goes through
/// [`MutableSparseVector`].
#[derive(Clone, Default)]
pub struct SparseVector {
    entries: BTreeMap<i32, f64>,
}

impl SparseVector {
    /// Creates an empty vector.
    pub fn new() -> SparseVector {
        SparseVector {
            entries: BTreeMap::new(),
        }
    }

    /// Builds a vector from `(index, value)` pairs, dropping zero values.
    pub fn from_entries(entries: impl IntoIterator<Item = (i32, f64)>) -> SparseVector {
        let mut vector = MutableSparseVector::new();
        for (index, value) in entries {
            vector.set(index, value);
        }
        vector.into_vector()
    }

    /// The stored value at `index`, or 0.0.
    pub fn get(&self, index: i32) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    /// Materializes a dense list of values over the inclusive index range.
    pub fn get_all(&self, range: RangeInclusive<i32>) -> Vec<f64> {
        range.map(|i| self.get(i)).collect()
    }

    /// Number of stored (non-zero) entries.
    pub fn non_zero_count(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates stored entries in ascending index order.
    pub fn iter_non_zero(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.entries.iter().map(|(&i, &v)| (i, v))
    }

    /// Visits stored entries in ascending index order.
    pub fn for_each_non_zero(&self, mut action: impl FnMut(i32, f64)) {
        for (index, value) in self.iter_non_zero() {
            action(index, value);
        }
    }

    /// Visits every index in the range with its current value, zero or not.
    pub fn for_each(&self, range: RangeInclusive<i32>, mut action: impl FnMut(i32, f64)) {
        for index in range {
            action(index, self.get(index));
        }
    }

    /// Lowest stored index, or `None`.
    pub fn find_first_non_zero_index(&self) -> Option<i32> {
        self.entries.first_key_value().map(|(&i, _)| i)
    }

    /// Highest stored index, or `None`.
    pub fn find_last_non_zero_index(&self) -> Option<i32> {
        self.entries.last_key_value().map(|(&i, _)| i)
    }

    /// Lowest stored index `>= from`, or `None`.
    pub fn find_next_non_zero_index(&self, from: i32) -> Option<i32> {
        self.entries.range(from..).next().map(|(&i, _)| i)
    }

    /// Highest stored index `<= from`, or `None`.
    pub fn find_previous_non_zero_index(&self, from: i32) -> Option<i32> {
        self.entries.range(..=from).next_back().map(|(&i, _)| i)
    }

    /// Lowest stored index, or -1 when the vector is empty.
    pub fn first_non_zero_index(&self) -> i32 {
        self.find_first_non_zero_index().unwrap_or(-1)
    }

    /// Highest stored index, or -1 when the vector is empty.
    pub fn last_non_zero_index(&self) -> i32 {
        self.find_last_non_zero_index().unwrap_or(-1)
    }

    /// Lowest stored index `>= from`, or -1.
    pub fn next_non_zero_index(&self, from: i32) -> i32 {
        self.find_next_non_zero_index(from).unwrap_or(-1)
    }

    /// Highest stored index `<= from`, or -1.
    pub fn previous_non_zero_index(&self, from: i32) -> i32 {
        self.find_previous_non_zero_index(from).unwrap_or(-1)
    }

    /// Lowest non-negative index with no stored value, or `None` when every
    /// non-negative index is occupied.
    pub fn find_first_zero_index(&self) -> Option<i32> {
        let mut candidate: i64 = 0;
        for (&index, _) in self.entries.range(0..) {
            if index as i64 == candidate {
                candidate += 1;
            } else {
                break;
            }
        }
        (candidate <= i32::MAX as i64).then_some(candidate as i32)
    }

    /// Sentinel form of [`find_first_zero_index`](Self::find_first_zero_index):
    /// -1 when every non-negative index is occupied.
    pub fn first_zero_index(&self) -> i32 {
        self.find_first_zero_index().unwrap_or(-1)
    }

    /// Highest index with no stored value, scanning down from `i32::MAX`, or
    /// `None` when every index down through `i32::MIN` is occupied.
    pub fn find_last_zero_index(&self) -> Option<i32> {
        if !self.entries.contains_key(&i32::MAX) {
            return Some(i32::MAX);
        }
        let mut candidate: i64 = i32::MAX as i64 - 1;
        for (&index, _) in self.entries.range(..i32::MAX).rev() {
            if index as i64 == candidate {
                candidate -= 1;
            } else {
                break;
            }
        }
        (candidate >= i32::MIN as i64).then_some(candidate as i32)
    }

    /// Sentinel form of [`find_last_zero_index`](Self::find_last_zero_index):
    /// -1 when no gap exists down through `i32::MIN`.
    pub fn last_zero_index(&self) -> i32 {
        self.find_last_zero_index().unwrap_or(-1)
    }

    /// Element-wise sum. The result stores no zeros.
    pub fn plus(&self, other: &SparseVector) -> SparseVector {
        let mut result = MutableSparseVector::from_vector(self.clone());
        result.add_vector(other);
        result.into_vector()
    }

    /// Element-wise difference. The result stores no zeros.
    pub fn minus(&self, other: &SparseVector) -> SparseVector {
        let mut result = MutableSparseVector::from_vector(self.clone());
        result.sub_vector(other);
        result.into_vector()
    }

    /// Element-wise product, iterating the operand with the smaller support.
    pub fn dot(&self, other: &SparseVector) -> SparseVector {
        let (small, large) = if self.non_zero_count() <= other.non_zero_count() {
            (self, other)
        } else {
            (other, self)
        };
        let mut result = MutableSparseVector::new();
        for (index, value) in small.iter_non_zero() {
            if let Some(&other_value) = large.entries.get(&index) {
                result.set(index, value * other_value);
            }
        }
        result.into_vector()
    }

    /// 3-D cross product over indices {0, 1, 2}. Values at other indices are
    /// ignored.
    pub fn cross(&self, other: &SparseVector) -> SparseVector {
        let (a0, a1, a2) = (self.get(0), self.get(1), self.get(2));
        let (b0, b1, b2) = (other.get(0), other.get(1), other.get(2));
        let mut result = MutableSparseVector::new();
        result.set(0, a1 * b2 - a2 * b1);
        result.set(1, a2 * b0 - a0 * b2);
        result.set(2, a0 * b1 - a1 * b0);
        result.into_vector()
    }

    /// Scalar product. A zero scalar yields the empty vector.
    pub fn multiplied(&self, scalar: f64) -> SparseVector {
        let mut result = MutableSparseVector::from_vector(self.clone());
        result.multiply(scalar);
        result.into_vector()
    }

    /// Scalar quotient. Fails with `InvalidArgument` for a zero scalar.
    pub fn divided(&self, scalar: f64) -> Result<SparseVector> {
        let mut result = MutableSparseVector::from_vector(self.clone());
        result.divide(scalar)?;
        Ok(result.into_vector())
    }

    /// Euclidean norm: √Σv².
    pub fn norm(&self) -> f64 {
        self.entries.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// This vector scaled to unit norm. Fails with `InvalidState` when the
    /// norm is zero.
    pub fn normalized(&self) -> Result<SparseVector> {
        let norm = self.norm();
        if norm == 0.0 {
            return Err(Error::invalid_state("cannot normalize a zero vector"));
        }
        self.divided(norm)
    }

    /// Euclidean distance: the norm of `self - other`.
    pub fn distance(&self, other: &SparseVector) -> f64 {
        self.minus(other).norm()
    }

    /// Element-wise absolute value.
    pub fn abs(&self) -> SparseVector {
        let entries = self.entries.iter().map(|(&i, &v)| (i, v.abs())).collect();
        SparseVector { entries }
    }

    /// Sum of all stored values.
    pub fn sum(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Asserts that no stored value is zero. Intended for tests.
    #[track_caller]
    pub fn check_invariants(&self) {
        for (&index, &value) in &self.entries {
            assert!(value != 0.0, "zero value stored at index {index}");
        }
    }
}

impl PartialEq for SparseVector {
    /// Structural equality over stored entries. Values compare by IEEE bit
    /// pattern, so vectors carrying the same NaN payloads compare equal.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((i0, v0), (i1, v1))| i0 == i1 && v0.to_bits() == v1.to_bits())
    }
}

impl Eq for SparseVector {}

impl std::fmt::Debug for SparseVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl FromIterator<(i32, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        SparseVector::from_entries(iter)
    }
}

/// A [`SparseVector`] with mutation operations.
///
/// Every mutation keeps the vector canonical: entries whose value becomes
/// exactly zero are removed. The read surface is available through `Deref`;
/// [`as_vector`](Self::as_vector) borrows it, [`to_vector`](Self::to_vector)
/// snapshots an independent immutable copy, and `Clone` yields an independent
/// mutable copy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MutableSparseVector {
    vector: SparseVector,
}

impl MutableSparseVector {
    /// Creates an empty vector.
    pub fn new() -> MutableSparseVector {
        MutableSparseVector {
            vector: SparseVector::new(),
        }
    }

    /// Wraps an immutable vector for further mutation.
    pub fn from_vector(vector: SparseVector) -> MutableSparseVector {
        MutableSparseVector { vector }
    }

    /// Borrows the read-only surface (the shared view).
    pub fn as_vector(&self) -> &SparseVector {
        &self.vector
    }

    /// An independent immutable snapshot of the current contents.
    pub fn to_vector(&self) -> SparseVector {
        self.vector.clone()
    }

    /// Unwraps into the immutable vector, consuming self.
    pub fn into_vector(self) -> SparseVector {
        self.vector
    }

    /// Stores `value` at `index`; a zero value removes the entry.
    pub fn set(&mut self, index: i32, value: f64) {
        if value == 0.0 {
            self.vector.entries.remove(&index);
        } else {
            self.vector.entries.insert(index, value);
        }
    }

    /// Adds `value` to the entry at `index`.
    pub fn add(&mut self, index: i32, value: f64) {
        let current = self.vector.get(index);
        self.set(index, current + value);
    }

    /// Subtracts `value` from the entry at `index`.
    pub fn sub(&mut self, index: i32, value: f64) {
        let current = self.vector.get(index);
        self.set(index, current - value);
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.vector.entries.clear();
    }

    /// Scales every entry in place. A zero scalar clears the vector.
    pub fn multiply(&mut self, scalar: f64) {
        if scalar == 0.0 {
            self.clear();
            return;
        }
        self.transform_non_zero(|_, value| value * scalar);
    }

    /// Divides every entry in place. Fails with `InvalidArgument` for a zero
    /// scalar.
    pub fn divide(&mut self, scalar: f64) -> Result<()> {
        mikta_common::verify_arg!(scalar, scalar != 0.0);
        self.transform_non_zero(|_, value| value / scalar);
        Ok(())
    }

    /// Maps every stored entry through `f`, dropping results that are zero.
    pub fn transform_non_zero(&mut self, mut f: impl FnMut(i32, f64) -> f64) {
        let entries = std::mem::take(&mut self.vector.entries);
        for (index, value) in entries {
            let new_value = f(index, value);
            if new_value != 0.0 {
                self.vector.entries.insert(index, new_value);
            }
        }
    }

    /// Visits every index in the range, present or not, replacing its value
    /// with `f(index, current)`.
    pub fn transform(&mut self, range: RangeInclusive<i32>, mut f: impl FnMut(i32, f64) -> f64) {
        for index in range {
            let current = self.vector.get(index);
            self.set(index, f(index, current));
        }
    }

    /// Adds every non-zero entry of `other` into this vector.
    pub fn add_vector(&mut self, other: &SparseVector) {
        for (index, value) in other.iter_non_zero() {
            self.add(index, value);
        }
    }

    /// Subtracts every non-zero entry of `other` from this vector.
    pub fn sub_vector(&mut self, other: &SparseVector) {
        for (index, value) in other.iter_non_zero() {
            self.sub(index, value);
        }
    }
}

impl Deref for MutableSparseVector {
    type Target = SparseVector;

    fn deref(&self) -> &SparseVector {
        &self.vector
    }
}

impl std::fmt::Debug for MutableSparseVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.vector.fmt(f)
    }
}

impl FromIterator<(i32, f64)> for MutableSparseVector {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        MutableSparseVector::from_vector(SparseVector::from_entries(iter))
    }
}
