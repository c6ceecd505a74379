//! Associative vector with shared, reference-counted values.
//!
//! Keys and values live in two dense arrays. Several keys may point at the
//! same value slot; the slot is released when its last key is erased.
//!
//! ```text
//! index: key ──► (key_slot, ref)        keys:   [k0, k1, k2, ...]
//! refs:  ref ──► (value_slot, count)    values: [v0, v1, ...]
//!                                       owners: [r0, r1, ...]
//! ```
//!
//! `keys[slot]` is the back-index for `index`, `owners[slot]` is the
//! back-index for `refs`. Both arrays are compacted with swap-and-pop.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use tuesday_foundation::{Error, Result};

/// Opaque handle to an inserted key and the value it refers to.
///
/// The value part stays valid while at least one key shares the value.
/// The key slot is the position at insertion time and goes stale once
/// the key is moved by compaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueRef {
    key_slot: usize,
    id: u64,
}

impl ValueRef {
    /// Returns the key slot recorded when this handle was created.
    #[must_use]
    pub const fn key_slot(self) -> usize {
        self.key_slot
    }

    /// Returns the raw value reference id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.id
    }
}

#[derive(Copy, Clone, Debug)]
struct KeyEntry {
    key_slot: usize,
    value: u64,
}

#[derive(Copy, Clone, Debug)]
struct RefEntry {
    value_slot: usize,
    count: usize,
}

/// Dense key→value map where values may be shared between keys.
#[derive(Clone)]
pub struct AssocVector<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    owners: Vec<u64>,
    index: HashMap<K, KeyEntry>,
    refs: HashMap<u64, RefEntry>,
    next_ref: u64,
}

impl<K, V> Default for AssocVector<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            owners: Vec::new(),
            index: HashMap::new(),
            refs: HashMap::new(),
            next_ref: 0,
        }
    }
}

impl<K, V> AssocVector<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Creates a new empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty vector with room for `capacity` keys and values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            refs: HashMap::with_capacity(capacity),
            next_ref: 0,
        }
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the keys in dense order.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Returns the distinct stored values in dense order.
    #[must_use]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Returns the distinct stored values for in-place mutation.
    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Checks if a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts a key with a new value.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the key is already present; nothing is
    /// modified in that case.
    pub fn insert(&mut self, key: K, value: V) -> Result<ValueRef> {
        self.emplace(key, || value)
    }

    /// Inserts a key with a value built by `make`.
    ///
    /// `make` runs only when the key is absent and before any state is
    /// touched, so a panic in it leaves the vector unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the key is already present.
    pub fn emplace(&mut self, key: K, make: impl FnOnce() -> V) -> Result<ValueRef> {
        if self.index.contains_key(&key) {
            return Err(Error::duplicate_key(&key));
        }
        let value = make();

        let id = self.next_ref;
        self.next_ref += 1;

        let key_slot = self.keys.len();
        let value_slot = self.values.len();
        self.keys.push(key.clone());
        self.values.push(value);
        self.owners.push(id);
        self.refs.insert(id, RefEntry { value_slot, count: 1 });
        self.index.insert(key, KeyEntry { key_slot, value: id });

        Ok(ValueRef { key_slot, id })
    }

    /// Inserts a key that shares the value behind `target`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownValueRef` if `target` no longer refers to a live
    /// value, or `DuplicateKey` if `key` is already present.
    pub fn insert_shared(&mut self, key: K, target: ValueRef) -> Result<ValueRef> {
        if !self.refs.contains_key(&target.id) {
            return Err(Error::unknown_value_ref(target.id));
        }
        if self.index.contains_key(&key) {
            return Err(Error::duplicate_key(&key));
        }

        let key_slot = self.keys.len();
        self.keys.push(key.clone());
        self.index.insert(
            key,
            KeyEntry {
                key_slot,
                value: target.id,
            },
        );
        if let Some(entry) = self.refs.get_mut(&target.id) {
            entry.count += 1;
        }

        Ok(ValueRef {
            key_slot,
            id: target.id,
        })
    }

    /// Inserts a key that shares the value of an existing key.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if `existing` is absent, or `DuplicateKey` if
    /// `key` is already present.
    pub fn insert_shared_with(&mut self, key: K, existing: &K) -> Result<ValueRef> {
        let target = self.value_ref(existing)?;
        self.insert_shared(key, target)
    }

    /// Returns the handle for a key.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key is absent.
    pub fn value_ref(&self, key: &K) -> Result<ValueRef> {
        self.index
            .get(key)
            .map(|entry| ValueRef {
                key_slot: entry.key_slot,
                id: entry.value,
            })
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Returns how many keys share the value of `key`.
    #[must_use]
    pub fn ref_count(&self, key: &K) -> Option<usize> {
        let entry = self.index.get(key)?;
        self.refs.get(&entry.value).map(|r| r.count)
    }

    /// Removes a key.
    ///
    /// The value is dropped only when no other key shares it.
    /// Returns true if the key was present.
    pub fn erase(&mut self, key: &K) -> bool {
        let Some(entry) = self.index.remove(key) else {
            return false;
        };
        self.remove_key_slot(entry.key_slot);
        self.release(entry.value);
        true
    }

    /// Removes the key recorded in `handle`, if it still occupies the
    /// recorded slot and refers to the recorded value.
    pub fn erase_ref(&mut self, handle: ValueRef) -> bool {
        let Some(key) = self.keys.get(handle.key_slot) else {
            return false;
        };
        let current = self.index.get(key).map(|entry| entry.value);
        if current != Some(handle.id) {
            return false;
        }
        let key = key.clone();
        self.erase(&key)
    }

    /// Gets the value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.value_slot(key)?;
        self.values.get(slot)
    }

    /// Gets the value for a key mutably.
    ///
    /// The change is visible through every key sharing the value.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.value_slot(key)?;
        self.values.get_mut(slot)
    }

    /// Gets the value for a key.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key is absent.
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or_else(|| Error::key_not_found(key))
    }

    /// Gets the value for a key mutably.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the key is absent.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        let slot = self.value_slot(key).ok_or_else(|| Error::key_not_found(key))?;
        Ok(&mut self.values[slot])
    }

    /// Iterates `(key, value)` pairs in dense key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            vec: self,
            keys: self.keys.iter(),
        }
    }

    /// Verifies the internal bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error describing the first broken invariant.
    pub fn check_invariants(&self) -> Result<()> {
        if self.keys.len() != self.index.len() {
            return Err(Error::internal(format!(
                "{} keys but {} index entries",
                self.keys.len(),
                self.index.len()
            )));
        }
        if self.values.len() != self.refs.len() || self.values.len() != self.owners.len() {
            return Err(Error::internal(format!(
                "{} values, {} refs, {} owners",
                self.values.len(),
                self.refs.len(),
                self.owners.len()
            )));
        }

        let mut counts: HashMap<u64, usize> = HashMap::new();
        for (slot, key) in self.keys.iter().enumerate() {
            let entry = self
                .index
                .get(key)
                .ok_or_else(|| Error::internal(format!("key {key:?} missing from index")))?;
            if entry.key_slot != slot {
                return Err(Error::internal(format!(
                    "key {key:?} at slot {slot} indexed at {}",
                    entry.key_slot
                )));
            }
            *counts.entry(entry.value).or_default() += 1;
        }

        for (slot, id) in self.owners.iter().enumerate() {
            let entry = self
                .refs
                .get(id)
                .ok_or_else(|| Error::internal(format!("value slot {slot} owned by dead ref #{id}")))?;
            if entry.value_slot != slot {
                return Err(Error::internal(format!(
                    "ref #{id} at slot {slot} indexed at {}",
                    entry.value_slot
                )));
            }
            let keys = counts.get(id).copied().unwrap_or(0);
            if entry.count == 0 || entry.count != keys {
                return Err(Error::internal(format!(
                    "ref #{id} counts {} but {keys} keys point at it",
                    entry.count
                )));
            }
        }

        Ok(())
    }

    // --- Private helpers ---

    fn value_slot(&self, key: &K) -> Option<usize> {
        let entry = self.index.get(key)?;
        self.refs.get(&entry.value).map(|r| r.value_slot)
    }

    /// Swap-and-pop `keys[slot]`, repairing the index entry of the key that
    /// moves into it. The removed key must already be gone from `index`.
    fn remove_key_slot(&mut self, slot: usize) {
        let last = self.keys.len() - 1;
        if slot != last {
            if let Some(moved) = self.index.get_mut(&self.keys[last]) {
                moved.key_slot = slot;
            }
        }
        self.keys.swap_remove(slot);
    }

    /// Drops one reference to value `id`, releasing its slot at zero.
    fn release(&mut self, id: u64) {
        debug_assert!(
            self.refs.contains_key(&id),
            "release of unknown value reference #{id}"
        );
        let Some(entry) = self.refs.get_mut(&id) else {
            log::error!("release of unknown value reference #{id}");
            return;
        };
        debug_assert!(entry.count != 0, "value reference #{id} already released");

        if entry.count > 1 {
            entry.count -= 1;
            return;
        }

        let slot = entry.value_slot;
        self.refs.remove(&id);

        let last = self.values.len() - 1;
        if slot != last {
            let moved = self.owners[last];
            if let Some(entry) = self.refs.get_mut(&moved) {
                entry.value_slot = slot;
            }
        }
        self.values.swap_remove(slot);
        self.owners.swap_remove(slot);
    }
}

impl<K, V> Index<&K> for AssocVector<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is absent.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", Error::key_not_found(key)),
        }
    }
}

impl<K, V> IndexMut<&K> for AssocVector<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// # Panics
    ///
    /// Panics if the key is absent.
    fn index_mut(&mut self, key: &K) -> &mut V {
        match self.value_slot(key) {
            Some(slot) => &mut self.values[slot],
            None => panic!("{}", Error::key_not_found(key)),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AssocVector<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssocVector")
            .field("keys", &self.keys)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(key, value)` pairs of an [`AssocVector`].
pub struct Iter<'a, K, V> {
    vec: &'a AssocVector<K, V>,
    keys: std::slice::Iter<'a, K>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        let vec: &'a AssocVector<K, V> = self.vec;
        vec.get(key).map(|value| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> where K: Clone + Eq + Hash + fmt::Debug {}

impl<'a, K, V> IntoIterator for &'a AssocVector<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
