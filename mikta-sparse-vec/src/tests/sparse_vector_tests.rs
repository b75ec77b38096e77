use crate::{MutableSparseVector, SparseVector};

fn vec_of(entries: &[(i32, f64)]) -> SparseVector {
    SparseVector::from_entries(entries.iter().copied())
}

#[test]
fn test_empty_vector() {
    let v = SparseVector::new();
    assert!(v.is_empty());
    assert_eq!(v.non_zero_count(), 0);
    assert_eq!(v.get(0), 0.0);
    assert_eq!(v.first_non_zero_index(), -1);
    assert_eq!(v.find_first_non_zero_index(), None);
}

#[test]
fn test_set_get_canonicalization() {
    let mut v = MutableSparseVector::new();
    v.set(3, 1.5);
    v.set(7, -2.0);
    assert_eq!(v.non_zero_count(), 2);
    assert_eq!(v.get(3), 1.5);
    assert_eq!(v.get(5), 0.0);

    // storing zero removes
    v.set(3, 0.0);
    assert_eq!(v.non_zero_count(), 1);
    assert_eq!(v.get(3), 0.0);

    // negative zero is also absent
    v.set(7, -0.0);
    assert!(v.is_empty());
    v.check_invariants();
}

#[test]
fn test_nan_is_storable() {
    let mut v = MutableSparseVector::new();
    v.set(0, f64::NAN);
    assert_eq!(v.non_zero_count(), 1);
    assert!(v.get(0).is_nan());
    v.check_invariants();

    v.set(1, f64::INFINITY);
    v.set(2, f64::NEG_INFINITY);
    assert_eq!(v.non_zero_count(), 3);
}

#[test]
fn test_add_sub_entry() {
    let mut v = MutableSparseVector::new();
    v.add(0, 2.5);
    v.add(0, 1.5);
    assert_eq!(v.get(0), 4.0);

    v.sub(0, 4.0);
    assert_eq!(v.non_zero_count(), 0);
    v.check_invariants();
}

#[test]
fn test_get_all() {
    let v = vec_of(&[(1, 2.0), (3, 4.0)]);
    assert_eq!(v.get_all(0..=4), vec![0.0, 2.0, 0.0, 4.0, 0.0]);
}

#[test]
fn test_plus_and_dot() {
    let v = vec_of(&[(0, 2.0), (1, 4.0)]);
    let w = vec_of(&[(1, -4.0), (2, 5.0)]);

    let sum = v.plus(&w);
    sum.check_invariants();
    assert_eq!(sum.non_zero_count(), 2);
    assert_eq!(sum.get(0), 2.0);
    assert_eq!(sum.get(1), 0.0);
    assert_eq!(sum.get(2), 5.0);

    let product = v.dot(&w);
    product.check_invariants();
    assert_eq!(product.non_zero_count(), 1);
    assert_eq!(product.get(1), -16.0);
}

#[test]
fn test_minus() {
    let v = vec_of(&[(0, 2.0), (1, 4.0)]);
    let diff = v.minus(&v);
    assert!(diff.is_empty());

    let w = vec_of(&[(1, 1.0)]);
    let diff = v.minus(&w);
    assert_eq!(diff.get(0), 2.0);
    assert_eq!(diff.get(1), 3.0);
}

#[test]
fn test_cross() {
    let x = vec_of(&[(0, 1.0)]);
    let y = vec_of(&[(1, 1.0)]);
    let z = x.cross(&y);
    assert_eq!(z, vec_of(&[(2, 1.0)]));

    // values outside indices {0, 1, 2} are ignored
    let x_noise = vec_of(&[(0, 1.0), (9, 100.0)]);
    assert_eq!(x_noise.cross(&y), z);

    // anti-commutativity
    let neg_z = y.cross(&x);
    assert_eq!(neg_z, vec_of(&[(2, -1.0)]));
}

#[test]
fn test_scalar_operations() {
    let v = vec_of(&[(0, 2.0), (1, -3.0)]);

    let doubled = v.multiplied(2.0);
    assert_eq!(doubled, vec_of(&[(0, 4.0), (1, -6.0)]));

    assert!(v.multiplied(0.0).is_empty());

    let halved = v.divided(2.0).unwrap();
    assert_eq!(halved, vec_of(&[(0, 1.0), (1, -1.5)]));

    let err = v.divided(0.0).unwrap_err();
    assert!(matches!(
        err.kind(),
        mikta_common::error::ErrorKind::InvalidArgument { .. }
    ));
}

#[test]
fn test_norm_and_normalized() {
    let v = vec_of(&[(0, 3.0), (1, 4.0)]);
    assert_eq!(v.norm(), 5.0);

    let unit = v.normalized().unwrap();
    assert_eq!(unit.get(0), 0.6);
    assert_eq!(unit.get(1), 0.8);

    let err = SparseVector::new().normalized().unwrap_err();
    assert!(matches!(
        err.kind(),
        mikta_common::error::ErrorKind::InvalidState { .. }
    ));
}

#[test]
fn test_distance() {
    let v = vec_of(&[(0, 1.0), (1, 1.0)]);
    let w = vec_of(&[(0, 4.0), (1, 5.0)]);
    assert_eq!(v.distance(&w), 5.0);
    assert_eq!(v.distance(&v), 0.0);
}

#[test]
fn test_abs_and_sum() {
    let v = vec_of(&[(0, -2.0), (1, 3.0), (2, -4.5)]);
    assert_eq!(v.abs(), vec_of(&[(0, 2.0), (1, 3.0), (2, 4.5)]));
    assert_eq!(v.sum(), -3.5);
}

#[test]
fn test_index_navigation() {
    let v = vec_of(&[(-5, 1.0), (3, 2.0), (10, 3.0)]);

    assert_eq!(v.first_non_zero_index(), -5);
    assert_eq!(v.last_non_zero_index(), 10);
    assert_eq!(v.next_non_zero_index(0), 3);
    assert_eq!(v.next_non_zero_index(3), 3);
    assert_eq!(v.next_non_zero_index(11), -1);
    assert_eq!(v.previous_non_zero_index(0), -5);
    assert_eq!(v.previous_non_zero_index(-6), -1);

    assert_eq!(v.find_next_non_zero_index(11), None);
    assert_eq!(v.find_previous_non_zero_index(-6), None);
}

#[test]
fn test_first_zero_index() {
    let v = vec_of(&[(0, 1.0), (1, 1.0), (3, 1.0)]);
    assert_eq!(v.first_zero_index(), 2);

    // negative indices do not affect the non-negative scan
    let v = vec_of(&[(-3, 1.0), (1, 1.0)]);
    assert_eq!(v.first_zero_index(), 0);

    assert_eq!(SparseVector::new().first_zero_index(), 0);
}

#[test]
fn test_last_zero_index() {
    let v = vec_of(&[(0, 1.0)]);
    assert_eq!(v.last_zero_index(), i32::MAX);

    let v = vec_of(&[(i32::MAX, 1.0)]);
    assert_eq!(v.last_zero_index(), i32::MAX - 1);

    let v = vec_of(&[(i32::MAX, 1.0), (i32::MAX - 1, 1.0), (i32::MAX - 3, 1.0)]);
    assert_eq!(v.last_zero_index(), i32::MAX - 2);
}

#[test]
fn test_multiply_divide_in_place() {
    let mut v = MutableSparseVector::from_vector(vec_of(&[(0, 2.0), (1, 4.0)]));
    v.multiply(3.0);
    assert_eq!(v.as_vector(), &vec_of(&[(0, 6.0), (1, 12.0)]));

    v.divide(6.0).unwrap();
    assert_eq!(v.as_vector(), &vec_of(&[(0, 1.0), (1, 2.0)]));

    assert!(v.divide(0.0).is_err());

    v.multiply(0.0);
    assert!(v.is_empty());
}

#[test]
fn test_transform_non_zero() {
    let mut v = MutableSparseVector::from_vector(vec_of(&[(0, 1.0), (1, 2.0), (2, 3.0)]));
    // mapping an entry to zero drops it
    v.transform_non_zero(|_, value| value - 2.0);
    v.check_invariants();
    assert_eq!(v.non_zero_count(), 2);
    assert_eq!(v.get(0), -1.0);
    assert_eq!(v.get(2), 1.0);
}

#[test]
fn test_transform_range() {
    let mut v = MutableSparseVector::from_vector(vec_of(&[(1, 2.0)]));
    v.transform(0..=3, |index, value| value + index as f64);
    v.check_invariants();
    assert_eq!(v.get(0), 0.0);
    assert_eq!(v.get(1), 3.0);
    assert_eq!(v.get(2), 2.0);
    assert_eq!(v.get(3), 3.0);
}

#[test]
fn test_vector_add_sub() {
    let mut v = MutableSparseVector::from_vector(vec_of(&[(0, 1.0), (1, 2.0)]));
    v.add_vector(&vec_of(&[(1, -2.0), (2, 5.0)]));
    v.check_invariants();
    assert_eq!(v.as_vector(), &vec_of(&[(0, 1.0), (2, 5.0)]));

    v.sub_vector(&vec_of(&[(0, 1.0), (2, 2.0)]));
    assert_eq!(v.as_vector(), &vec_of(&[(2, 3.0)]));
}

#[test]
fn test_iteration() {
    let v = vec_of(&[(5, 1.0), (-2, 2.0), (9, 3.0)]);
    let entries: Vec<_> = v.iter_non_zero().collect();
    assert_eq!(entries, vec![(-2, 2.0), (5, 1.0), (9, 3.0)]);

    let mut visited = Vec::new();
    v.for_each(4..=6, |i, value| visited.push((i, value)));
    assert_eq!(visited, vec![(4, 0.0), (5, 1.0), (6, 0.0)]);
}

#[test]
fn test_equality_with_nan() {
    let a = vec_of(&[(0, f64::NAN), (1, 2.0)]);
    let b = vec_of(&[(0, f64::NAN), (1, 2.0)]);
    assert_eq!(a, b);

    let c = vec_of(&[(0, 1.0), (1, 2.0)]);
    assert_ne!(a, c);
}

#[test]
fn test_view_and_copy_semantics() {
    let mut v = MutableSparseVector::from_vector(vec_of(&[(0, 1.0)]));
    let snapshot = v.to_vector();
    v.set(1, 2.0);
    assert_eq!(snapshot.non_zero_count(), 1);
    assert_eq!(v.non_zero_count(), 2);

    let copy = v.clone();
    v.clear();
    assert_eq!(copy.non_zero_count(), 2);
    assert!(v.is_empty());
}
