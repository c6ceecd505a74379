//! Configuration for the entity registry.

/// Configuration for an [`EntityRegistry`](crate::EntityRegistry).
///
/// Controls storage preallocation and how strictly inserts are checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Initial capacity of every component storage the registry creates.
    pub storage_capacity: usize,

    /// Enrol existing entities in systems registered after them.
    pub backfill_systems: bool,

    /// Reject inserts that would keep a stale component value instead of
    /// storing the new one.
    pub strict_components: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            storage_capacity: 0,
            backfill_systems: true,
            strict_components: false,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration that rejects conflicting component inserts.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_components: true,
            ..Self::default()
        }
    }

    /// Builder method to set the storage capacity.
    #[must_use]
    pub fn with_storage_capacity(mut self, capacity: usize) -> Self {
        self.storage_capacity = capacity;
        self
    }

    /// Builder method to set system backfilling.
    #[must_use]
    pub fn with_backfill_systems(mut self, backfill: bool) -> Self {
        self.backfill_systems = backfill;
        self
    }

    /// Builder method to set strict component checking.
    #[must_use]
    pub fn with_strict_components(mut self, strict: bool) -> Self {
        self.strict_components = strict;
        self
    }
}
