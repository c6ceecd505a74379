//! Integration tests for `AssocVector`
//!
//! Shared-value aliasing, reference counting, and compaction.

use tuesday_ecs::{AssocVector, ErrorKind};

use crate::init_logging;

fn letters() -> AssocVector<u32, String> {
    let mut store = AssocVector::new();
    store.insert(1, "A".to_string()).unwrap();
    store.insert(2, "B".to_string()).unwrap();
    store.insert_shared_with(3, &1).unwrap();
    store
}

// =============================================================================
// Shared Values
// =============================================================================

#[test]
fn shared_key_sees_owner_value() {
    init_logging();
    let store = letters();

    assert_eq!(store.len(), 3);
    assert_eq!(store.values().len(), 2);
    assert_eq!(store[&3], "A");
    assert_eq!(store.ref_count(&1), Some(2));
    assert_eq!(store.ref_count(&2), Some(1));
}

#[test]
fn writes_through_alias_are_visible() {
    init_logging();
    let mut store = letters();

    store[&3].push('!');
    assert_eq!(store[&1], "A!");
    assert_eq!(store[&2], "B");
}

#[test]
fn value_survives_until_last_key() {
    init_logging();
    let mut store = letters();

    assert!(store.erase(&1));
    assert_eq!(store[&3], "A");
    assert_eq!(store.values().len(), 2);

    assert!(store.erase(&3));
    assert_eq!(store.values(), &["B".to_string()]);
    assert_eq!(store.keys(), &[2]);
    store.check_invariants().unwrap();
}

#[test]
fn sharing_through_a_handle() {
    init_logging();
    let mut store = letters();
    let handle = store.value_ref(&2).unwrap();

    store.insert_shared(4, handle).unwrap();
    assert_eq!(store[&4], "B");
    assert_eq!(store.ref_count(&2), Some(2));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn duplicate_key_is_rejected_without_change() {
    init_logging();
    let mut store = letters();

    let err = store.insert(2, "Z".to_string()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateKey(_)));
    assert_eq!(store[&2], "B");

    let err = store.insert_shared_with(2, &1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateKey(_)));
    assert_eq!(store.ref_count(&1), Some(2));
    store.check_invariants().unwrap();
}

#[test]
fn stale_handle_is_rejected() {
    init_logging();
    let mut store = letters();
    let handle = store.value_ref(&2).unwrap();
    store.erase(&2);

    let err = store.insert_shared(9, handle).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownValueRef(_)));
    assert!(!store.contains_key(&9));
}

#[test]
fn missing_key_lookups() {
    let store = letters();
    assert!(store.get(&99).is_none());
    assert!(store.at(&99).unwrap_err().is_not_found());
    assert_eq!(store.ref_count(&99), None);
}

// =============================================================================
// Compaction
// =============================================================================

#[test]
fn erase_everything_in_mixed_order() {
    init_logging();
    let mut store = AssocVector::new();
    for k in 0..20u32 {
        if k % 3 == 0 {
            store.insert(k, k * 10).unwrap();
        } else {
            store.insert_shared_with(k, &(k - k % 3)).unwrap();
        }
    }
    assert_eq!(store.values().len(), 7);

    for k in [5, 0, 19, 7, 3, 12, 1, 18, 2, 4] {
        assert!(store.erase(&k));
        store.check_invariants().unwrap();
    }
    for (key, value) in &store {
        assert_eq!(*value, (key - key % 3) * 10);
    }

    let rest: Vec<u32> = store.keys().to_vec();
    for k in rest {
        store.erase(&k);
    }
    assert!(store.is_empty());
    assert!(store.values().is_empty());
}
