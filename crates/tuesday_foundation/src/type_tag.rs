//! Runtime type tags for component and system types.
//!
//! Each distinct Rust type seen by [`TypeTag::of`] is assigned a small,
//! dense index the first time it is seen. The assignment is process-global
//! and stable for the lifetime of the process, so tags can be used as bit
//! positions in an [`EntityState`](crate::EntityState).

use std::any::{TypeId, type_name};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock, PoisonError};

/// Stable per-type identifier.
///
/// Equality, ordering and hashing use the index only; the name is carried
/// for diagnostics.
#[derive(Copy, Clone)]
pub struct TypeTag {
    index: u32,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag for `T`, assigning a new index on first use.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` types are tagged.
    #[must_use]
    pub fn of<T: 'static + ?Sized>() -> Self {
        let mut table = table().lock().unwrap_or_else(PoisonError::into_inner);
        table.tag_for(TypeId::of::<T>(), type_name::<T>())
    }

    /// Returns the tag for `T` only if one has already been assigned.
    #[must_use]
    pub fn lookup<T: 'static + ?Sized>() -> Option<Self> {
        let table = table().lock().unwrap_or_else(PoisonError::into_inner);
        table.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the dense index of this tag.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the Rust type name this tag was assigned to.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Returns the number of tags assigned so far in this process.
    #[must_use]
    pub fn assigned() -> usize {
        let table = table().lock().unwrap_or_else(PoisonError::into_inner);
        table.by_type.len()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl PartialOrd for TypeTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({}: {})", self.index, self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Assignment table shared by the whole process.
#[derive(Default)]
struct TagTable {
    by_type: HashMap<TypeId, TypeTag>,
}

impl TagTable {
    fn tag_for(&mut self, id: TypeId, name: &'static str) -> TypeTag {
        if let Some(&tag) = self.by_type.get(&id) {
            return tag;
        }

        let index = u32::try_from(self.by_type.len()).expect("too many type tags");
        let tag = TypeTag { index, name };
        self.by_type.insert(id, tag);
        log::debug!("assigned {tag:?}");
        tag
    }
}

fn table() -> &'static Mutex<TagTable> {
    static TABLE: OnceLock<Mutex<TagTable>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(TagTable::default()))
}
