//! Entity-component-system core for tuesday.
//!
//! This crate provides:
//! - [`AssocVector`] - Packed key/value store whose keys may share one value
//! - [`ComponentRegistry`] - One [`ComponentStorage`] per component type
//! - [`SystemRegistry`] - Systems and the entities each operates on
//! - [`EntityRegistry`] - Facade keeping entities, components and systems in step
//!
//! Everything is single-threaded and driven by the caller; the registry
//! never runs a system on its own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assoc_vector;
pub mod component;
pub mod config;
pub mod registry;
pub mod system;

pub use assoc_vector::{AssocVector, ValueRef};
pub use component::{Bundle, Component, ComponentRegistry, ComponentStorage, ErasedStorage};
pub use config::RegistryConfig;
pub use registry::EntityRegistry;
pub use system::{Requirements, System, SystemBase, SystemRegistry};

pub use tuesday_foundation::{
    EntityAllocator, EntityId, EntityKey, EntityState, Error, ErrorKind, Result, TraitSet,
    TypeTag,
};
