//! Tuesday - entity-component-system core
//!
//! This crate re-exports both layers of the tuesday system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: tuesday_ecs        — Shared-value storage, components, systems, entity registry
//! Layer 0: tuesday_foundation — Core types (TypeTag, TraitSet, EntityId, Error)
//! ```

pub use tuesday_ecs as ecs;
pub use tuesday_foundation as foundation;
