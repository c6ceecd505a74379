//! Integration tests for type tags, trait sets and entity ids

use tuesday_foundation::{EntityAllocator, EntityId, EntityState, TraitSet, TypeTag};

struct Position;
struct Velocity;
struct Mass;

// =============================================================================
// Type Tags
// =============================================================================

#[test]
fn tags_are_stable() {
    let first = TypeTag::of::<Position>();
    let again = TypeTag::of::<Position>();
    assert_eq!(first, again);
    assert_ne!(first, TypeTag::of::<Velocity>());
    assert_eq!(TypeTag::lookup::<Position>(), Some(first));
}

// =============================================================================
// Trait Sets
// =============================================================================

#[test]
fn trait_matching_is_superset() {
    let p = TypeTag::of::<Position>();
    let v = TypeTag::of::<Velocity>();
    let m = TypeTag::of::<Mass>();

    let movable = TraitSet::from_tags(&[p, v]).unwrap();
    let body = TraitSet::from_tags(&[p, v, m]).unwrap();
    let statue = TraitSet::from_tags(&[p, m]).unwrap();

    assert!(body.matches(&movable));
    assert!(movable.matches(&movable));
    assert!(!statue.matches(&movable));
    assert!(!movable.matches(&body));
}

#[test]
fn empty_requirement_matches_all() {
    let p = TypeTag::of::<Position>();
    let empty = TraitSet::default();
    assert!(TraitSet::from_tags(&[p]).unwrap().matches(&empty));
    assert!(empty.matches(&empty));
}

// =============================================================================
// Entity Ids
// =============================================================================

#[test]
fn allocator_hands_out_increasing_ids() {
    let mut alloc = EntityAllocator::new();
    let ids: Vec<EntityId> = (0..5).map(|_| alloc.allocate()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(ids.iter().all(|id| !id.is_null()));
    assert_eq!(format!("{}", ids[0]), "#1");
}
