//! Per-entity trait state: which component types an entity carries.
//!
//! An [`EntityState`] is built once from the component types an entity is
//! inserted with and is compared against a system's required set with
//! [`EntityState::matches`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::type_tag::TypeTag;

/// Contract for per-entity trait states.
///
/// `state.matches(required)` must hold iff every component type present in
/// `required` is also present in `state`.
pub trait EntityState: Clone + Eq + fmt::Debug + Default + 'static {
    /// Builds a state containing exactly the given component types.
    ///
    /// # Errors
    ///
    /// Returns an error if a tag cannot be represented by this state type.
    fn from_tags(tags: &[TypeTag]) -> Result<Self>;

    /// Returns true if `self` is a superset of `required`.
    fn matches(&self, required: &Self) -> bool;
}

const WORDS: usize = 4;

/// Fixed-width bitset with one bit per [`TypeTag`] index.
///
/// Holds up to [`TraitSet::CAPACITY`] distinct component types.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraitSet {
    words: [u64; WORDS],
}

impl TraitSet {
    /// Number of distinct type tags a `TraitSet` can hold.
    pub const CAPACITY: usize = WORDS * 64;

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Adds a type tag to the set.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if the tag index does not fit.
    pub fn insert(&mut self, tag: TypeTag) -> Result<()> {
        let (word, bit) = Self::position(tag)?;
        self.words[word] |= 1 << bit;
        Ok(())
    }

    /// Checks if the set contains a type tag.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        Self::position(tag).is_ok_and(|(word, bit)| self.words[word] & (1 << bit) != 0)
    }

    /// Returns the number of type tags in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Iterates the tag indices in the set, ascending.
    // CAPACITY is far below u32::MAX
    #[allow(clippy::cast_possible_truncation)]
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..Self::CAPACITY).filter_map(move |i| {
            let set = self.words[i / 64] & (1 << (i % 64)) != 0;
            set.then_some(i as u32)
        })
    }

    fn position(tag: TypeTag) -> Result<(usize, usize)> {
        let index = tag.index() as usize;
        if index >= Self::CAPACITY {
            return Err(Error::new(ErrorKind::CapacityExceeded {
                tag: tag.index(),
                capacity: Self::CAPACITY,
            }));
        }
        Ok((index / 64, index % 64))
    }
}

impl EntityState for TraitSet {
    fn from_tags(tags: &[TypeTag]) -> Result<Self> {
        let mut set = Self::new();
        for tag in tags {
            set.insert(*tag)?;
        }
        Ok(set)
    }

    fn matches(&self, required: &Self) -> bool {
        self.words
            .iter()
            .zip(required.words.iter())
            .all(|(have, need)| have & need == *need)
    }
}

impl fmt::Debug for TraitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.indices()).finish()
    }
}
