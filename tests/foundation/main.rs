//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Error, TypeTag, TraitSet, and EntityId.

mod errors;
mod state;
