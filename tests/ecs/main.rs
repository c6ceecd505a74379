//! Integration tests for Layer 1: ECS
//!
//! Tests for the shared-value store, the entity registry, and systems driven
//! through it.

mod assoc_vector;
mod registry;

/// Routes `log` output to the test harness; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
