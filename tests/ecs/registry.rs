//! Integration tests for `EntityRegistry`
//!
//! Inserts, erases, and the consistency of the three stores.

use tuesday_ecs::{
    EntityAllocator, EntityId, EntityRegistry, ErrorKind, RegistryConfig, TraitSet, TypeTag,
};
use tuesday_foundation::EntityState;

use crate::init_logging;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(i32);

#[derive(Debug, Clone, PartialEq)]
struct Name(String);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frozen;

// =============================================================================
// Insert / Erase
// =============================================================================

#[test]
fn insert_records_state() {
    init_logging();
    let mut registry = EntityRegistry::<EntityId>::new();
    let e = EntityId::new(1);

    registry
        .insert_with(e, (Health(10), Name("orc".into())))
        .unwrap();

    let state = registry.state(&e).unwrap();
    assert!(state.contains(TypeTag::of::<Health>()));
    assert!(state.contains(TypeTag::of::<Name>()));
    assert!(!state.contains(TypeTag::of::<Frozen>()));
    assert_eq!(registry.component::<Name>(&e).unwrap().0, "orc");
}

#[test]
fn erase_removes_components() {
    init_logging();
    let mut registry = EntityRegistry::<EntityId>::new();
    let mut alloc = EntityAllocator::new();
    let a = alloc.allocate();
    let b = alloc.allocate();

    registry.insert_with(a, (Health(1), Frozen)).unwrap();
    registry.insert_with(b, (Health(2),)).unwrap();
    assert!(registry.erase(&a));

    let health = registry.find_component::<Health>().unwrap();
    assert_eq!(health.len(), 1);
    assert_eq!(health[b], Health(2));
    assert!(registry.find_component::<Frozen>().unwrap().is_empty());
    assert!(!registry.erase(&a));
}

#[test]
fn reinsert_after_erase() {
    init_logging();
    let mut registry = EntityRegistry::<EntityId>::new();
    let e = EntityId::new(3);

    registry.insert_with(e, (Health(1),)).unwrap();
    registry.erase(&e);
    registry.insert_with(e, (Health(2), Frozen)).unwrap();

    assert_eq!(registry.component::<Health>(&e).unwrap(), &Health(2));
    assert_eq!(registry.len(), 1);
}

#[test]
fn duplicate_insert_changes_nothing() {
    init_logging();
    let mut registry = EntityRegistry::<EntityId>::new();
    let e = EntityId::new(1);
    registry.insert(e).unwrap();

    let err = registry.insert_with(e, (Health(5),)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateEntity(_)));
    assert_eq!(registry.state(&e), Some(&TraitSet::new()));
    assert!(registry.find_component::<Health>().is_none());
}

#[test]
fn strict_registry_refuses_conflicts() {
    init_logging();
    let config = RegistryConfig::strict().with_storage_capacity(16);
    let mut registry = EntityRegistry::<EntityId>::with_config(config);
    let e = EntityId::new(1);
    registry.use_component::<Health>().insert(e, Health(99));

    let err = registry.insert_with(e, (Frozen, Health(1))).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::ComponentConflict { component, .. } if component.ends_with("Health")
    ));
    assert!(!registry.contains(&e));
    assert!(registry.find_component::<Frozen>().is_none());
}

// =============================================================================
// Component Storage Registration
// =============================================================================

#[test]
fn make_component_twice_fails() {
    let mut registry = EntityRegistry::<EntityId>::new();
    registry.make_component::<Health>().unwrap();

    let err = registry.make_component::<Health>().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AlreadyRegistered { .. }));
}

#[test]
fn use_component_is_idempotent() {
    let mut registry = EntityRegistry::<EntityId>::new();
    registry.use_component::<Health>().insert(EntityId::new(1), Health(3));
    assert_eq!(registry.use_component::<Health>().len(), 1);
    assert_eq!(registry.components().len(), 1);
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn entities_iterate_in_order() {
    let mut registry = EntityRegistry::<EntityId>::new();
    for raw in [9, 4, 6] {
        registry.insert(EntityId::new(raw)).unwrap();
    }

    let order: Vec<u32> = registry.entities().map(|(e, _)| e.raw()).collect();
    assert_eq!(order, vec![4, 6, 9]);
}

#[test]
fn matching_uses_superset_rule() {
    let mut registry = EntityRegistry::<EntityId>::new();
    registry.insert_with(EntityId::new(1), (Health(1),)).unwrap();
    registry
        .insert_with(EntityId::new(2), (Health(1), Frozen))
        .unwrap();
    registry.insert_with(EntityId::new(3), (Frozen,)).unwrap();

    let frozen = TraitSet::from_tags(&[TypeTag::of::<Frozen>()]).unwrap();
    let hit: Vec<u32> = registry.matching(&frozen).map(EntityId::raw).collect();
    assert_eq!(hit, vec![2, 3]);

    let everything: Vec<_> = registry.matching(&TraitSet::new()).collect();
    assert_eq!(everything.len(), 3);
}

// =============================================================================
// Property Tests
// =============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tuesday_ecs::{Requirements, System, SystemBase};

    #[derive(Default)]
    struct Wounded {
        base: SystemBase<EntityId>,
    }

    impl System<EntityId> for Wounded {
        fn requirements(&self) -> Requirements {
            Requirements::of::<(Health, Frozen)>()
        }
        fn base(&self) -> &SystemBase<EntityId> {
            &self.base
        }
        fn base_mut(&mut self) -> &mut SystemBase<EntityId> {
            &mut self.base
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert { raw: u32, health: bool, frozen: bool },
        Erase(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u32..24, any::<bool>(), any::<bool>())
                .prop_map(|(raw, health, frozen)| Op::Insert { raw, health, frozen }),
            (1u32..24).prop_map(Op::Erase),
        ]
    }

    proptest! {
        #[test]
        fn membership_equals_matching_entities(ops in proptest::collection::vec(op(), 0..80)) {
            let mut registry = EntityRegistry::<EntityId>::new();
            registry.use_system::<Wounded>().unwrap();

            for op in ops {
                match op {
                    Op::Insert { raw, health, frozen } => {
                        let e = EntityId::new(raw);
                        let _ = match (health, frozen) {
                            (true, true) => registry.insert_with(e, (Health(1), Frozen)),
                            (true, false) => registry.insert_with(e, (Health(1),)),
                            (false, true) => registry.insert_with(e, (Frozen,)),
                            (false, false) => registry.insert(e),
                        };
                    }
                    Op::Erase(raw) => {
                        registry.erase(&EntityId::new(raw));
                    }
                }
            }

            let mut members = registry.find_system::<Wounded>().unwrap().entities().to_vec();
            members.sort_unstable();
            let required = registry.systems().kind_of::<Wounded>().unwrap().clone();
            let expected: Vec<_> = registry.matching(&required).collect();
            prop_assert_eq!(members, expected);

            let health = registry.find_component::<Health>().map_or(0, |s| s.len());
            let with_health = registry
                .entities()
                .filter(|(_, s)| s.contains(TypeTag::of::<Health>()))
                .count();
            prop_assert_eq!(health, with_health);
        }
    }
}
