//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use tuesday_foundation::{Category, EntityId, Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_duplicate_entity() {
    let err = Error::duplicate_entity(&EntityId::new(42));
    assert!(matches!(err.kind, ErrorKind::DuplicateEntity(_)));
    assert!(format!("{err}").contains("42"));
}

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found(&EntityId::new(5));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn error_unknown_value_ref() {
    let err = Error::unknown_value_ref(9);
    assert!(matches!(err.kind, ErrorKind::UnknownValueRef(9)));
    assert!(err.is_not_found());
}

#[test]
fn error_registration() {
    let err = Error::already_registered(Category::System, "Physics");
    assert_eq!(format!("{err}"), "system already registered: Physics");
    assert!(!err.is_not_found());

    let err = Error::not_registered(Category::Component, "Position");
    assert_eq!(format!("{err}"), "component not registered: Position");
    assert!(err.is_not_found());
}

// =============================================================================
// Error Display
// =============================================================================

#[test]
fn error_display_key_not_found() {
    let err = Error::key_not_found(&"missing");
    assert_eq!(format!("{err}"), "key not found: \"missing\"");
}

#[test]
fn error_display_capacity() {
    let err = Error::new(ErrorKind::CapacityExceeded {
        tag: 300,
        capacity: 256,
    });
    let msg = format!("{err}");
    assert!(msg.contains("300"));
    assert!(msg.contains("256"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let ctx = ErrorContext::new()
        .with_operation("EntityRegistry::insert_with")
        .with_frame("spawn_wave");
    let err = Error::internal("broken").with_context(ctx);

    let context = err.context.as_ref().unwrap();
    assert_eq!(context.operation.as_deref(), Some("EntityRegistry::insert_with"));
    assert_eq!(context.stack, vec!["spawn_wave".to_string()]);
    assert!(format!("{context}").contains("in spawn_wave"));
}
