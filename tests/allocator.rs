//! Identifier allocation tests.

use vidframes::{VidframesError, allocator::parse_identifier, next_identifier};

// ── next_identifier ──────────────────────────────────────────────

#[test]
fn empty_set_allocates_one() {
    assert_eq!(next_identifier(&[]).unwrap(), 1);
}

#[test]
fn contiguous_set_allocates_successor() {
    assert_eq!(next_identifier(&[1, 2, 3]).unwrap(), 4);
}

#[test]
fn first_gap_is_filled() {
    assert_eq!(next_identifier(&[1, 2, 4, 5]).unwrap(), 3);
    assert_eq!(next_identifier(&[2, 3, 4]).unwrap(), 1);
    assert_eq!(next_identifier(&[5, 5, 6]).unwrap(), 1);
}

#[test]
fn zero_is_never_allocated() {
    assert_eq!(next_identifier(&[0]).unwrap(), 1);
    assert_eq!(next_identifier(&[0, 1, 2]).unwrap(), 3);
}

#[test]
fn input_order_does_not_matter() {
    assert_eq!(next_identifier(&[4, 1, 2]).unwrap(), 3);
    assert_eq!(next_identifier(&[3, 2, 1]).unwrap(), 4);
}

#[test]
fn duplicates_are_tolerated() {
    assert_eq!(next_identifier(&[1, 1, 2]).unwrap(), 3);
    assert_eq!(next_identifier(&[1, 2, 2, 4]).unwrap(), 3);
}

#[test]
fn negative_identifier_is_rejected() {
    let result = next_identifier(&[1, -3, 2]);
    assert!(matches!(result, Err(VidframesError::InvalidIdentifier(-3))));
}

#[test]
fn allocation_is_fresh_and_minimal() {
    let sets: [&[i64]; 6] = [&[], &[1], &[2], &[1, 3], &[1, 2, 3, 7], &[0, 2, 9, 10]];
    for used in sets {
        let next = next_identifier(used).unwrap() as i64;
        assert!(next >= 1);
        assert!(!used.contains(&next), "{next} already in {used:?}");
        for smaller in 1..next {
            assert!(used.contains(&smaller), "{smaller} was free in {used:?}");
        }
    }
}

#[test]
fn allocating_twice_gives_distinct_identifiers() {
    let mut used = vec![1, 3];
    let first = next_identifier(&used).unwrap();
    used.push(first as i64);
    let second = next_identifier(&used).unwrap();
    assert_eq!((first, second), (2, 4));
}

#[test]
fn repeated_calls_agree() {
    let used = [1, 2, 5];
    assert_eq!(next_identifier(&used).unwrap(), next_identifier(&used).unwrap());
}

// ── parse_identifier ─────────────────────────────────────────────

#[test]
fn parses_trailing_number() {
    assert_eq!(parse_identifier("Patient_007"), Some(7));
    assert_eq!(parse_identifier("Sequence_1234"), Some(1234));
    assert_eq!(parse_identifier("a_b_12"), Some(12));
}

#[test]
fn rejects_names_without_number() {
    assert_eq!(parse_identifier("Patient"), None);
    assert_eq!(parse_identifier("Patient_abc"), None);
    assert_eq!(parse_identifier("Patient_"), None);
}
