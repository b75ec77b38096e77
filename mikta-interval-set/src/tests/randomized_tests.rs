//! Randomized mutation tests mirrored against a dense reference bit set.

use crate::{MutableSegmentSet, SegmentSet};

const DOMAIN: i64 = 1000;

/// Dense reference over [0, DOMAIN].
struct Reference {
    bits: Vec<bool>,
}

impl Reference {
    fn new() -> Reference {
        Reference {
            bits: vec![false; (DOMAIN + 1) as usize],
        }
    }

    fn add_range(&mut self, lo: i64, hi: i64) {
        for i in lo..=hi {
            self.bits[i as usize] = true;
        }
    }

    fn remove_range(&mut self, lo: i64, hi: i64) {
        for i in lo..=hi {
            self.bits[i as usize] = false;
        }
    }

    fn flip_range(&mut self, lo: i64, hi: i64) {
        for i in lo..=hi {
            self.bits[i as usize] = !self.bits[i as usize];
        }
    }

    fn contains(&self, i: i64) -> bool {
        self.bits[i as usize]
    }

    fn count(&self) -> u64 {
        self.bits.iter().filter(|&&b| b).count() as u64
    }
}

fn random_range() -> (i64, i64) {
    let lo = fastrand::i64(0..=DOMAIN);
    let hi = fastrand::i64(lo..=DOMAIN);
    (lo, hi)
}

#[track_caller]
fn assert_matches_reference(set: &SegmentSet, reference: &Reference) {
    set.check_invariants();
    for i in 0..=DOMAIN {
        assert_eq!(
            set.contains(i),
            reference.contains(i),
            "membership mismatch at {i}"
        );
    }
    assert_eq!(set.len(), reference.count());
}

#[test]
fn test_random_mutations_match_dense_reference() {
    fastrand::seed(901267354);

    let mut set = MutableSegmentSet::new();
    let mut reference = Reference::new();

    for _ in 0..400 {
        let (lo, hi) = random_range();
        match fastrand::u8(0..3) {
            0 => {
                set.add_range(lo..=hi);
                reference.add_range(lo, hi);
            }
            1 => {
                set.remove_range(lo..=hi);
                reference.remove_range(lo, hi);
            }
            2 => {
                set.flip_range(lo..=hi);
                reference.flip_range(lo, hi);
            }
            _ => unreachable!(),
        }
        assert_matches_reference(set.as_set(), &reference);
    }
}

#[test]
fn test_random_navigation_matches_dense_reference() {
    fastrand::seed(5561230987);

    let mut set = MutableSegmentSet::new();
    let mut reference = Reference::new();
    for _ in 0..40 {
        let (lo, hi) = random_range();
        set.add_range(lo..=hi);
        reference.add_range(lo, hi);
    }

    for _ in 0..500 {
        let from = fastrand::i64(0..=DOMAIN);

        let expected_next = (from..=DOMAIN).find(|&i| reference.contains(i));
        let actual_next = set.find_next(from).filter(|&v| v <= DOMAIN);
        assert_eq!(actual_next, expected_next, "next from {from}");

        let expected_prev = (0..=from).rev().find(|&i| reference.contains(i));
        assert_eq!(set.find_previous(from), expected_prev, "previous from {from}");

        let expected_next_absent = (from..=DOMAIN).find(|&i| !reference.contains(i));
        let actual_next_absent = set.find_next_absent(from).filter(|&v| v <= DOMAIN);
        assert_eq!(
            actual_next_absent, expected_next_absent,
            "next absent from {from}"
        );

        let expected_prev_absent = (0..=from).rev().find(|&i| !reference.contains(i));
        let actual_prev_absent = set.find_previous_absent(from).filter(|&v| v >= 0);
        assert_eq!(
            actual_prev_absent, expected_prev_absent,
            "previous absent from {from}"
        );
    }
}

fn random_set(segments: usize) -> SegmentSet {
    let mut set = MutableSegmentSet::new();
    for _ in 0..segments {
        let (lo, hi) = random_range();
        set.add_range(lo..=hi.min(lo + 50));
    }
    set.into_set()
}

#[test]
fn test_set_theoretic_laws() {
    fastrand::seed(77120934);

    for _ in 0..50 {
        let a = random_set(8);
        let b = random_set(8);

        let union = a.union(&b);
        let intersection = a.intersect(&b);
        let xor = a.xor(&b);
        union.check_invariants();
        intersection.check_invariants();
        xor.check_invariants();

        for i in 0..=DOMAIN {
            let in_a = a.contains(i);
            let in_b = b.contains(i);
            assert_eq!(union.contains(i), in_a || in_b);
            assert_eq!(intersection.contains(i), in_a && in_b);
            assert_eq!(xor.contains(i), in_a ^ in_b);
        }

        // A ∩ B ⊆ A and A ⊆ A ∪ B
        assert_eq!(intersection.intersect(&a), intersection);
        assert_eq!(a.union(&union), union);

        // (A ∪ B) \ (A ∩ B) = A ⊕ B
        let mut difference = MutableSegmentSet::from_set(union.clone());
        for range in intersection.ranges() {
            difference.remove_range(range);
        }
        assert_eq!(difference.into_set(), xor);
    }
}

#[test]
fn test_shift_round_trip() {
    fastrand::seed(31337554);

    for _ in 0..50 {
        let set = random_set(6);
        let amount = fastrand::i64(0..10_000);
        assert_eq!(set.shifted_right(amount).shifted_left(amount), set);
        assert_eq!(set.shifted_left(amount).shifted_right(amount), set);
    }
}

#[test]
fn test_subset_matches_dense_reference() {
    fastrand::seed(6650211388);

    for _ in 0..50 {
        let set = random_set(8);
        let (lo, hi) = random_range();
        let sub = set.subset(lo..=hi);
        sub.check_invariants();
        for i in 0..=DOMAIN {
            let expected = set.contains(i) && i >= lo && i <= hi;
            assert_eq!(sub.contains(i), expected, "subset mismatch at {i}");
        }
    }
}

#[test]
fn test_absent_ranges_cover_complement() {
    fastrand::seed(40900415);

    for _ in 0..50 {
        let set = random_set(8);
        let (lo, hi) = random_range();

        let mut absent = vec![false; (DOMAIN + 1) as usize];
        for range in set.absent_ranges(lo..=hi) {
            for i in range {
                absent[i as usize] = true;
            }
        }
        for i in 0..=DOMAIN {
            let expected = !set.contains(i) && i >= lo && i <= hi;
            assert_eq!(absent[i as usize], expected, "gap mismatch at {i}");
        }
    }
}
