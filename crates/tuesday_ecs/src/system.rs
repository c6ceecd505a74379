//! Systems and the system registry.
//!
//! A system declares the component types it requires and keeps the list of
//! entities whose state satisfies that requirement. The registry holds one
//! instance per system type and keeps every membership list in sync as
//! entities come and go.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use tuesday_foundation::{Category, EntityKey, EntityState, Error, Result, TypeTag};

use crate::component::{Bundle, Component};

// =============================================================================
// Membership
// =============================================================================

/// Membership list shared by every system: the entities it currently
/// operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemBase<E> {
    entities: Vec<E>,
}

impl<E> Default for SystemBase<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
        }
    }
}

impl<E: EntityKey> SystemBase<E> {
    /// Creates an empty membership list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty membership list with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
        }
    }

    /// Appends `entity`, returning false if it was already a member.
    pub fn insert(&mut self, entity: E) -> bool {
        if self.entities.contains(&entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Removes `entity`, returning whether it was a member.
    ///
    /// The last member takes the removed one's position.
    pub fn erase(&mut self, entity: &E) -> bool {
        match self.entities.iter().position(|e| e == entity) {
            Some(pos) => {
                self.entities.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Checks if `entity` is a member.
    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.entities.contains(entity)
    }

    /// Returns the members in unspecified order.
    #[must_use]
    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// Requirements
// =============================================================================

/// The component types a system requires.
///
/// ```
/// use tuesday_ecs::Requirements;
///
/// struct Position;
/// struct Velocity;
///
/// let req = Requirements::new().with::<Position>().with::<Velocity>();
/// assert_eq!(req.tags().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    tags: Vec<TypeTag>,
}

impl Requirements {
    /// Creates an empty requirement, matched by every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a requirement for every component type in bundle `B`.
    #[must_use]
    pub fn of<B: Bundle>() -> Self {
        B::tags().into_iter().fold(Self::new(), Self::with_tag)
    }

    /// Adds component type `C`.
    #[must_use]
    pub fn with<C: Component>(self) -> Self {
        self.with_tag(TypeTag::of::<C>())
    }

    /// Adds an already resolved type tag. Repeats are ignored.
    #[must_use]
    pub fn with_tag(mut self, tag: TypeTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Returns the required tags.
    #[must_use]
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }
}

// =============================================================================
// System trait
// =============================================================================

/// A unit of behavior that operates on every entity carrying a fixed set of
/// component types.
///
/// Implementors store a [`SystemBase`] and expose it through
/// [`base`](System::base) and [`base_mut`](System::base_mut); the
/// registry maintains it.
pub trait System<E: EntityKey>: 'static {
    /// Returns the component types this system requires.
    ///
    /// Read once, when the system is registered.
    fn requirements(&self) -> Requirements;

    /// Returns the membership list.
    fn base(&self) -> &SystemBase<E>;

    /// Returns the membership list mutably.
    fn base_mut(&mut self) -> &mut SystemBase<E>;

    /// Returns the entities this system currently operates on.
    fn entities(&self) -> &[E] {
        self.base().entities()
    }
}

/// Object-safe view of a registered system.
trait AnySystem<E>: Any {
    fn membership_mut(&mut self) -> &mut SystemBase<E>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: EntityKey, T: System<E>> AnySystem<E> for T {
    fn membership_mut(&mut self) -> &mut SystemBase<E> {
        System::base_mut(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Registry
// =============================================================================

struct SystemEntry<E, S> {
    kind: S,
    name: &'static str,
    system: Box<dyn AnySystem<E>>,
}

/// Type-indexed collection of systems, each paired with the entity state
/// an entity must match to be a member.
///
/// Systems are keyed by `TypeId`, so registering one does not take up a
/// [`TypeTag`] index.
pub struct SystemRegistry<E, S> {
    index: HashMap<TypeId, usize>,
    systems: Vec<SystemEntry<E, S>>,
}

impl<E: EntityKey, S: EntityState> Default for SystemRegistry<E, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey, S: EntityState> SystemRegistry<E, S> {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            systems: Vec::new(),
        }
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Returns the system of type `T`, if registered.
    #[must_use]
    pub fn find<T: System<E>>(&self) -> Option<&T> {
        let slot = self.slot_of::<T>()?;
        (*self.systems[slot].system).as_any().downcast_ref()
    }

    /// Returns the system of type `T` mutably, if registered.
    pub fn find_mut<T: System<E>>(&mut self) -> Option<&mut T> {
        let slot = self.slot_of::<T>()?;
        (*self.systems[slot].system).as_any_mut().downcast_mut()
    }

    /// Returns the state an entity must match to be a member of `T`.
    #[must_use]
    pub fn kind_of<T: System<E>>(&self) -> Option<&S> {
        let slot = self.slot_of::<T>()?;
        Some(&self.systems[slot].kind)
    }

    /// Registers `system`.
    ///
    /// The new system keeps whatever members it was constructed with;
    /// existing entities are not enrolled (see [`enrol`](Self::enrol)).
    /// Inserting an entity that is already a member leaves it listed once.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if a system of type `T` exists, or the
    /// state's error if the requirements cannot be represented. The
    /// registry is unchanged on error.
    pub fn make<T: System<E>>(&mut self, system: T) -> Result<&mut T> {
        let id = TypeId::of::<T>();
        let name = type_name::<T>();
        if self.index.contains_key(&id) {
            return Err(Error::already_registered(Category::System, name));
        }
        let kind = S::from_tags(system.requirements().tags())?;
        let slot = self.systems.len();
        self.systems.push(SystemEntry {
            kind,
            name,
            system: Box::new(system),
        });
        self.index.insert(id, slot);
        log::debug!("registered system {name}");

        (*self.systems[slot].system)
            .as_any_mut()
            .downcast_mut()
            .ok_or_else(|| Error::internal(format!("system {name} has a foreign type")))
    }

    /// Returns the system of type `T`, registering a default one on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns the state's error if the requirements cannot be represented.
    pub fn get_or_make<T: System<E> + Default>(&mut self) -> Result<&mut T> {
        if self.slot_of::<T>().is_none() {
            return self.make(T::default());
        }
        self.find_mut::<T>().ok_or_else(|| {
            Error::internal(format!("system {} has a foreign type", type_name::<T>()))
        })
    }

    /// Adds `entity` to every system whose requirement `state` matches,
    /// returning how many systems took it. Systems already listing it are
    /// left as they are.
    pub fn insert(&mut self, entity: E, state: &S) -> usize {
        let mut added = 0;
        for entry in &mut self.systems {
            if state.matches(&entry.kind) && entry.system.membership_mut().insert(entity) {
                added += 1;
            }
        }
        added
    }

    /// Removes `entity` from every system whose requirement `state`
    /// matches, returning how many systems held it.
    ///
    /// A matching system may not list the entity, e.g. one registered after
    /// it without backfilling; that system is skipped.
    pub fn erase_matching(&mut self, entity: &E, state: &S) -> usize {
        let mut removed = 0;
        for entry in &mut self.systems {
            if state.matches(&entry.kind) && entry.system.membership_mut().erase(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Removes `entity` from every system, returning how many held it.
    pub fn erase(&mut self, entity: &E) -> usize {
        let mut removed = 0;
        for entry in &mut self.systems {
            if entry.system.membership_mut().erase(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Adds each matching entity in `entities` to system `T`, skipping
    /// current members. Returns how many were added.
    pub fn enrol<'a, T, I>(&mut self, entities: I) -> usize
    where
        T: System<E>,
        I: IntoIterator<Item = (&'a E, &'a S)>,
        S: 'a,
    {
        let Some(slot) = self.slot_of::<T>() else {
            return 0;
        };
        let entry = &mut self.systems[slot];
        let mut added = 0;
        for (entity, state) in entities {
            if state.matches(&entry.kind) && entry.system.membership_mut().insert(*entity) {
                added += 1;
            }
        }
        added
    }

    /// Iterates the type names of all registered systems.
    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().map(|entry| entry.name)
    }

    fn slot_of<T: System<E>>(&self) -> Option<usize> {
        self.index.get(&TypeId::of::<T>()).copied()
    }
}

impl<E, S> std::fmt::Debug for SystemRegistry<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("systems", &self.index.len())
            .finish_non_exhaustive()
    }
}
