//! Core types for the tuesday ECS.
//!
//! This crate provides:
//! - [`EntityId`] - Opaque entity identifiers and the [`EntityKey`] bound
//! - [`TypeTag`] - Stable runtime identity for component and system types
//! - [`EntityState`] - Per-entity trait state, with the [`TraitSet`] bitset
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod state;
pub mod type_tag;

pub use entity::{EntityAllocator, EntityId, EntityKey};
pub use error::{Category, Error, ErrorContext, ErrorKind, Result};
pub use state::{EntityState, TraitSet};
pub use type_tag::TypeTag;
