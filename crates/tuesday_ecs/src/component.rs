//! Component storage and the type-indexed component registry.
//!
//! Each component type gets one [`ComponentStorage`], an [`AssocVector`]
//! keyed by entity. The [`ComponentRegistry`] owns the storages behind the
//! type-erased [`ErasedStorage`] interface and creates them on first use.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use tuesday_foundation::{Category, EntityKey, Error, ErrorKind, Result, TypeTag};

use crate::assoc_vector::{self, AssocVector};

/// Marker for types that can be stored as components.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Type-erased view of a component storage.
pub trait ErasedStorage<E>: Any {
    /// Removes the entity's value, returning true if it had one.
    fn erase(&mut self, entity: &E) -> bool;

    /// Checks if the entity has a value in this storage.
    fn contains(&self, entity: &E) -> bool;

    /// Returns the number of entities with a value.
    fn len(&self) -> usize;

    /// Returns true if no entity has a value.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the component type name.
    fn component_name(&self) -> &'static str;

    /// Upcasts for downcasting to the concrete storage.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete storage.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage of one component type, keyed by entity.
///
/// Entities never share a value here; the underlying [`AssocVector`] is
/// used for its compaction bookkeeping.
#[derive(Debug, Clone)]
pub struct ComponentStorage<E, C> {
    data: AssocVector<E, C>,
}

impl<E: EntityKey, C: Component> Default for ComponentStorage<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey, C: Component> ComponentStorage<E, C> {
    /// Creates a new empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: AssocVector::new(),
        }
    }

    /// Creates an empty storage with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: AssocVector::with_capacity(capacity),
        }
    }

    /// Stores a value for an entity.
    ///
    /// Returns false and keeps the existing value if the entity already has
    /// one; this is not an update operation.
    pub fn insert(&mut self, entity: E, component: C) -> bool {
        if self.data.contains_key(&entity) {
            return false;
        }
        self.data.insert(entity, component).is_ok()
    }

    /// Removes the entity's value, returning true if it had one.
    pub fn erase(&mut self, entity: &E) -> bool {
        self.data.erase(entity)
    }

    /// Checks if the entity has a value.
    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.data.contains_key(entity)
    }

    /// Gets the entity's value.
    #[must_use]
    pub fn get(&self, entity: &E) -> Option<&C> {
        self.data.get(entity)
    }

    /// Gets the entity's value mutably.
    pub fn get_mut(&mut self, entity: &E) -> Option<&mut C> {
        self.data.get_mut(entity)
    }

    /// Gets the entity's value.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the entity has no value.
    pub fn at(&self, entity: &E) -> Result<&C> {
        self.data.at(entity)
    }

    /// Gets the entity's value mutably.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the entity has no value.
    pub fn at_mut(&mut self, entity: &E) -> Result<&mut C> {
        self.data.at_mut(entity)
    }

    /// Returns the number of entities with a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no entity has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the entities in dense order.
    #[must_use]
    pub fn entities(&self) -> &[E] {
        self.data.keys()
    }

    /// Returns the values in dense order.
    #[must_use]
    pub fn values(&self) -> &[C] {
        self.data.values()
    }

    /// Returns the values for in-place mutation.
    pub fn values_mut(&mut self) -> &mut [C] {
        self.data.values_mut()
    }

    /// Iterates `(entity, value)` pairs.
    pub fn iter(&self) -> assoc_vector::Iter<'_, E, C> {
        self.data.iter()
    }
}

impl<E: EntityKey, C: Component> ErasedStorage<E> for ComponentStorage<E, C> {
    fn erase(&mut self, entity: &E) -> bool {
        ComponentStorage::erase(self, entity)
    }

    fn contains(&self, entity: &E) -> bool {
        ComponentStorage::contains(self, entity)
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<E: EntityKey, C: Component> Index<E> for ComponentStorage<E, C> {
    type Output = C;

    fn index(&self, entity: E) -> &C {
        &self.data[&entity]
    }
}

impl<E: EntityKey, C: Component> IndexMut<E> for ComponentStorage<E, C> {
    fn index_mut(&mut self, entity: E) -> &mut C {
        &mut self.data[&entity]
    }
}

impl<'a, E: EntityKey, C: Component> IntoIterator for &'a ComponentStorage<E, C> {
    type Item = (&'a E, &'a C);
    type IntoIter = assoc_vector::Iter<'a, E, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Bundles
// =============================================================================

/// A set of component values inserted together for one entity.
///
/// Implemented for `()` and tuples of up to eight component types.
pub trait Bundle: 'static {
    /// Returns the tags of the bundle's component types, in tuple order.
    fn tags() -> Vec<TypeTag>;

    /// Moves each value into its type's storage, creating storages as needed.
    fn insert_into<E: EntityKey>(self, entity: E, registry: &mut ComponentRegistry<E>);

    /// Returns the first component type for which `entity` already has a
    /// value in `registry`.
    fn conflict<E: EntityKey>(entity: &E, registry: &ComponentRegistry<E>) -> Option<TypeTag>;
}

impl Bundle for () {
    fn tags() -> Vec<TypeTag> {
        Vec::new()
    }

    fn insert_into<E: EntityKey>(self, _entity: E, _registry: &mut ComponentRegistry<E>) {}

    fn conflict<E: EntityKey>(_entity: &E, _registry: &ComponentRegistry<E>) -> Option<TypeTag> {
        None
    }
}

macro_rules! impl_bundle {
    ($($ty:ident: $var:ident),+) => {
        impl<$($ty: Component),+> Bundle for ($($ty,)+) {
            fn tags() -> Vec<TypeTag> {
                vec![$(TypeTag::of::<$ty>()),+]
            }

            fn insert_into<E: EntityKey>(self, entity: E, registry: &mut ComponentRegistry<E>) {
                let ($($var,)+) = self;
                $(
                    if !registry.get_or_make::<$ty>().insert(entity, $var) {
                        log::warn!(
                            "{entity:?} already has {}; existing value kept",
                            type_name::<$ty>()
                        );
                    }
                )+
            }

            fn conflict<E: EntityKey>(entity: &E, registry: &ComponentRegistry<E>) -> Option<TypeTag> {
                $(
                    if registry.contains::<$ty>(entity) {
                        return Some(TypeTag::of::<$ty>());
                    }
                )+
                None
            }
        }
    };
}

impl_bundle!(A: a);
impl_bundle!(A: a, B: b);
impl_bundle!(A: a, B: b, C: c);
impl_bundle!(A: a, B: b, C: c, D: d);
impl_bundle!(A: a, B: b, C: c, D: d, F: f);
impl_bundle!(A: a, B: b, C: c, D: d, F: f, G: g);
impl_bundle!(A: a, B: b, C: c, D: d, F: f, G: g, H: h);
impl_bundle!(A: a, B: b, C: c, D: d, F: f, G: g, H: h, I: i);

/// Returns the bundle's type tags after checking they are pairwise distinct.
///
/// # Errors
///
/// Returns `DuplicateComponent` naming the first repeated type.
pub fn bundle_tags<B: Bundle>() -> Result<Vec<TypeTag>> {
    let tags = B::tags();
    for (i, tag) in tags.iter().enumerate() {
        if tags[..i].contains(tag) {
            return Err(Error::new(ErrorKind::DuplicateComponent(tag.name())));
        }
    }
    Ok(tags)
}

// =============================================================================
// Registry
// =============================================================================

/// Type-indexed collection of component storages.
pub struct ComponentRegistry<E> {
    index: HashMap<TypeTag, usize>,
    storages: Vec<Box<dyn ErasedStorage<E>>>,
    storage_capacity: usize,
}

impl<E: EntityKey> Default for ComponentRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey> ComponentRegistry<E> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage_capacity(0)
    }

    /// Creates a registry whose storages start with room for `capacity`
    /// entities each.
    #[must_use]
    pub fn with_storage_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            storages: Vec::new(),
            storage_capacity: capacity,
        }
    }

    /// Returns the number of component storages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storages.len()
    }

    /// Returns true if no storage has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Returns the storage for `C`, if it has been created.
    #[must_use]
    pub fn find<C: Component>(&self) -> Option<&ComponentStorage<E, C>> {
        let slot = self.slot_of::<C>()?;
        (*self.storages[slot]).as_any().downcast_ref()
    }

    /// Returns the storage for `C` mutably, if it has been created.
    pub fn find_mut<C: Component>(&mut self) -> Option<&mut ComponentStorage<E, C>> {
        let slot = self.slot_of::<C>()?;
        (*self.storages[slot]).as_any_mut().downcast_mut()
    }

    /// Creates the storage for `C`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the storage exists.
    pub fn make<C: Component>(&mut self) -> Result<&mut ComponentStorage<E, C>> {
        let tag = TypeTag::of::<C>();
        if self.index.contains_key(&tag) {
            return Err(Error::already_registered(
                Category::Component,
                type_name::<C>(),
            ));
        }
        let slot = self.push_storage::<C>(tag);
        (*self.storages[slot])
            .as_any_mut()
            .downcast_mut()
            .ok_or_else(|| Error::internal(format!("storage for {tag:?} has a foreign type")))
    }

    /// Returns the storage for `C`, creating it on first use.
    pub fn get_or_make<C: Component>(&mut self) -> &mut ComponentStorage<E, C> {
        let tag = TypeTag::of::<C>();
        let slot = match self.index.get(&tag) {
            Some(&slot) => slot,
            None => self.push_storage::<C>(tag),
        };
        match (*self.storages[slot]).as_any_mut().downcast_mut() {
            Some(storage) => storage,
            None => unreachable!("storage for {tag:?} has a foreign type"),
        }
    }

    /// Checks if `entity` has a value of type `C`.
    #[must_use]
    pub fn contains<C: Component>(&self, entity: &E) -> bool {
        self.find::<C>().is_some_and(|s| s.contains(entity))
    }

    /// Inserts a bundle of component values for `entity`.
    ///
    /// Values for types the entity already has are dropped; the stored
    /// value is kept.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateComponent` if the bundle repeats a type. Nothing is
    /// inserted in that case.
    pub fn insert<B: Bundle>(&mut self, entity: E, bundle: B) -> Result<()> {
        bundle_tags::<B>()?;
        bundle.insert_into(entity, self);
        Ok(())
    }

    /// Removes `entity` from every storage, returning how many held it.
    pub fn erase(&mut self, entity: &E) -> usize {
        let mut removed = 0;
        for storage in &mut self.storages {
            if storage.erase(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Iterates the component type names of all storages.
    pub fn component_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.storages.iter().map(|s| s.component_name())
    }

    // --- Private helpers ---

    fn slot_of<C: Component>(&self) -> Option<usize> {
        let tag = TypeTag::lookup::<C>()?;
        self.index.get(&tag).copied()
    }

    fn push_storage<C: Component>(&mut self, tag: TypeTag) -> usize {
        let slot = self.storages.len();
        self.storages.push(Box::new(ComponentStorage::<E, C>::with_capacity(
            self.storage_capacity,
        )));
        self.index.insert(tag, slot);
        log::debug!("created component storage for {}", tag.name());
        slot
    }
}

impl<E> std::fmt::Debug for ComponentRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("storages", &self.index.len())
            .finish_non_exhaustive()
    }
}
