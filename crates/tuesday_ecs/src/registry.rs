//! The entity registry: the facade tying entities, components and systems
//! together.
//!
//! Every entity is recorded with the [`EntityState`] derived from the
//! component types it was inserted with. That state decides which systems
//! the entity joins, and is used again on erase to leave exactly those
//! systems.

use std::any::type_name;
use std::collections::BTreeMap;

use tuesday_foundation::{
    Category, EntityKey, EntityState, Error, ErrorContext, ErrorKind, Result, TraitSet,
};

use crate::component::{Bundle, Component, ComponentRegistry, ComponentStorage, bundle_tags};
use crate::config::RegistryConfig;
use crate::system::{System, SystemRegistry};

/// Owns the entity map, the component registry and the system registry,
/// and keeps the three consistent.
///
/// ```
/// use tuesday_ecs::{EntityRegistry, EntityId};
///
/// struct Position(f32, f32);
///
/// let mut registry: EntityRegistry<EntityId> = EntityRegistry::new();
/// let e = EntityId::new(1);
/// registry.insert_with(e, (Position(0.0, 0.0),)).unwrap();
/// assert!(registry.contains(&e));
/// assert_eq!(registry.component::<Position>(&e).unwrap().0, 0.0);
/// ```
#[derive(Debug)]
pub struct EntityRegistry<E, S = TraitSet> {
    config: RegistryConfig,
    entities: BTreeMap<E, S>,
    components: ComponentRegistry<E>,
    systems: SystemRegistry<E, S>,
}

impl<E: EntityKey, S: EntityState> Default for EntityRegistry<E, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey, S: EntityState> EntityRegistry<E, S> {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            components: ComponentRegistry::with_storage_capacity(config.storage_capacity),
            systems: SystemRegistry::new(),
            entities: BTreeMap::new(),
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // --- Entities ---

    /// Inserts `entity` with no components.
    ///
    /// The entity joins every system with an empty requirement.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntity` if `entity` is already registered.
    pub fn insert(&mut self, entity: E) -> Result<()> {
        self.insert_with(entity, ())
    }

    /// Inserts `entity` with the components in `bundle`.
    ///
    /// The entity's state is built from the bundle's component types and
    /// the entity joins every system that state matches.
    ///
    /// # Errors
    ///
    /// - `DuplicateComponent` if the bundle repeats a type
    /// - `CapacityExceeded` if the state cannot represent a type
    /// - `DuplicateEntity` if `entity` is already registered
    /// - `ComponentConflict` in strict mode, if `entity` already has a value
    ///   of one of the bundle's types
    ///
    /// Nothing is changed when an error is returned. The error carries an
    /// [`ErrorContext`] naming the operation and the entity.
    pub fn insert_with<B: Bundle>(&mut self, entity: E, bundle: B) -> Result<()> {
        self.try_insert(entity, bundle).map_err(|err| {
            err.with_context(
                ErrorContext::new()
                    .with_operation("EntityRegistry::insert_with")
                    .with_frame(format!("{entity:?}")),
            )
        })
    }

    fn try_insert<B: Bundle>(&mut self, entity: E, bundle: B) -> Result<()> {
        let tags = bundle_tags::<B>()?;
        let state = S::from_tags(&tags)?;
        if self.entities.contains_key(&entity) {
            return Err(Error::duplicate_entity(&entity));
        }
        if self.config.strict_components {
            if let Some(tag) = B::conflict(&entity, &self.components) {
                return Err(Error::new(ErrorKind::ComponentConflict {
                    entity: format!("{entity:?}"),
                    component: tag.name(),
                }));
            }
        }

        bundle.insert_into(entity, &mut self.components);
        let joined = self.systems.insert(entity, &state);
        self.entities.insert(entity, state);
        log::trace!("inserted {entity:?} with {} components, {joined} systems", tags.len());
        Ok(())
    }

    /// Removes `entity` with all its components and system memberships.
    ///
    /// Returns false if `entity` was not registered.
    pub fn erase(&mut self, entity: &E) -> bool {
        let Some(state) = self.entities.remove(entity) else {
            return false;
        };
        let components = self.components.erase(entity);
        let systems = self.systems.erase_matching(entity, &state);
        log::trace!("erased {entity:?} from {components} storages, {systems} systems");
        true
    }

    /// Checks if `entity` is registered.
    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.entities.contains_key(entity)
    }

    /// Returns the state `entity` was inserted with.
    #[must_use]
    pub fn state(&self, entity: &E) -> Option<&S> {
        self.entities.get(entity)
    }

    /// Returns the state `entity` was inserted with.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if `entity` is not registered.
    pub fn try_state(&self, entity: &E) -> Result<&S> {
        self.entities
            .get(entity)
            .ok_or_else(|| Error::entity_not_found(entity))
    }

    /// Returns the number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates registered entities and their states, in entity order.
    pub fn entities(&self) -> impl Iterator<Item = (E, &S)> + '_ {
        self.entities.iter().map(|(e, s)| (*e, s))
    }

    /// Iterates the entities whose state matches `required`, in entity
    /// order.
    pub fn matching<'a>(&'a self, required: &'a S) -> impl Iterator<Item = E> + 'a {
        self.entities
            .iter()
            .filter(move |(_, state)| state.matches(required))
            .map(|(e, _)| *e)
    }

    // --- Components ---

    /// Returns the storage for `C`, creating it on first use.
    pub fn use_component<C: Component>(&mut self) -> &mut ComponentStorage<E, C> {
        self.components.get_or_make::<C>()
    }

    /// Creates the storage for `C`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the storage exists.
    pub fn make_component<C: Component>(&mut self) -> Result<&mut ComponentStorage<E, C>> {
        self.components.make::<C>()
    }

    /// Returns the storage for `C`, if it has been created.
    #[must_use]
    pub fn find_component<C: Component>(&self) -> Option<&ComponentStorage<E, C>> {
        self.components.find::<C>()
    }

    /// Returns the storage for `C` mutably, if it has been created.
    pub fn find_component_mut<C: Component>(&mut self) -> Option<&mut ComponentStorage<E, C>> {
        self.components.find_mut::<C>()
    }

    /// Returns `entity`'s value of type `C`.
    ///
    /// # Errors
    ///
    /// - `EntityNotFound` if `entity` is not registered
    /// - `NotRegistered` if no storage for `C` exists
    /// - `KeyNotFound` if `entity` has no value of type `C`
    pub fn component<C: Component>(&self, entity: &E) -> Result<&C> {
        self.try_state(entity)?;
        self.components
            .find::<C>()
            .ok_or_else(|| Error::not_registered(Category::Component, type_name::<C>()))?
            .at(entity)
    }

    /// Returns the component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry<E> {
        &self.components
    }

    // --- Systems ---

    /// Returns the system of type `T`, registering a default one on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns the state's error if the system's requirements cannot be
    /// represented.
    pub fn use_system<T: System<E> + Default>(&mut self) -> Result<&mut T> {
        if self.systems.find::<T>().is_none() {
            return self.make_system(T::default());
        }
        self.find_system_mut::<T>()
            .ok_or_else(|| Error::not_registered(Category::System, type_name::<T>()))
    }

    /// Registers `system`.
    ///
    /// With [`RegistryConfig::backfill_systems`] set, every registered
    /// entity whose state matches the system's requirements is enrolled.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if a system of type `T` exists, or the
    /// state's error if the requirements cannot be represented.
    pub fn make_system<T: System<E>>(&mut self, system: T) -> Result<&mut T> {
        self.systems.make(system)?;
        if self.config.backfill_systems {
            let enrolled = self.systems.enrol::<T, _>(&self.entities);
            log::debug!("enrolled {enrolled} existing entities in {}", type_name::<T>());
        }
        self.find_system_mut::<T>()
            .ok_or_else(|| Error::internal(format!("system {} vanished", type_name::<T>())))
    }

    /// Returns the system of type `T`, if registered.
    #[must_use]
    pub fn find_system<T: System<E>>(&self) -> Option<&T> {
        self.systems.find::<T>()
    }

    /// Returns the system of type `T` mutably, if registered.
    pub fn find_system_mut<T: System<E>>(&mut self) -> Option<&mut T> {
        self.systems.find_mut::<T>()
    }

    /// Lends system `T` and the component registry to `update`.
    ///
    /// ```
    /// use tuesday_ecs::{EntityId, EntityRegistry, Requirements, System, SystemBase};
    ///
    /// struct Counter(u32);
    ///
    /// #[derive(Default)]
    /// struct Tick {
    ///     base: SystemBase<EntityId>,
    /// }
    ///
    /// impl System<EntityId> for Tick {
    ///     fn requirements(&self) -> Requirements {
    ///         Requirements::new().with::<Counter>()
    ///     }
    ///     fn base(&self) -> &SystemBase<EntityId> {
    ///         &self.base
    ///     }
    ///     fn base_mut(&mut self) -> &mut SystemBase<EntityId> {
    ///         &mut self.base
    ///     }
    /// }
    ///
    /// let mut registry: EntityRegistry<EntityId> = EntityRegistry::new();
    /// registry.use_system::<Tick>().unwrap();
    /// let e = EntityId::new(1);
    /// registry.insert_with(e, (Counter(0),)).unwrap();
    ///
    /// registry
    ///     .run_system::<Tick, _>(|tick, components| {
    ///         let counters = components.get_or_make::<Counter>();
    ///         for entity in tick.entities() {
    ///             counters[*entity].0 += 1;
    ///         }
    ///     })
    ///     .unwrap();
    /// assert_eq!(registry.component::<Counter>(&e).unwrap().0, 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `NotRegistered` if no system of type `T` exists.
    pub fn run_system<T, R>(
        &mut self,
        update: impl FnOnce(&mut T, &mut ComponentRegistry<E>) -> R,
    ) -> Result<R>
    where
        T: System<E>,
    {
        let system = self
            .systems
            .find_mut::<T>()
            .ok_or_else(|| Error::not_registered(Category::System, type_name::<T>()))?;
        Ok(update(system, &mut self.components))
    }

    /// Returns the system registry.
    #[must_use]
    pub fn systems(&self) -> &SystemRegistry<E, S> {
        &self.systems
    }
}
