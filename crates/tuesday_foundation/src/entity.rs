//! Entity identifiers.
//!
//! The registry is generic over its entity type; anything satisfying
//! [`EntityKey`] can be used. [`EntityId`] is the ready-made choice, handed
//! out by a monotonic [`EntityAllocator`].

use std::fmt;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bounds required of an entity type: an opaque, totally ordered,
/// hashable key.
pub trait EntityKey: Copy + Eq + Ord + Hash + fmt::Debug + 'static {}

impl<T> EntityKey for T where T: Copy + Eq + Ord + Hash + fmt::Debug + 'static {}

/// Opaque entity identifier.
///
/// Identifiers are unique within a process run when allocated through a
/// single [`EntityAllocator`]; `0` is reserved as the null sentinel.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an entity ID from a raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns a sentinel value representing "no entity".
    #[must_use]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw value of this ID.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityId(null)")
        } else {
            write!(f, "EntityId({})", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic entity ID allocator.
///
/// IDs start at 1 and are never reused.
#[derive(Debug, Clone, Default)]
pub struct EntityAllocator {
    last: u32,
}

impl EntityAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Returns the next unused ID.
    ///
    /// # Panics
    ///
    /// Panics if the `u32` ID space is exhausted.
    pub fn allocate(&mut self) -> EntityId {
        self.last = self.last.checked_add(1).expect("entity id space exhausted");
        EntityId(self.last)
    }

    /// Returns how many IDs have been handed out.
    #[must_use]
    pub const fn allocated(&self) -> u32 {
        self.last
    }
}
