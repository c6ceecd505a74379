//! Error types for the tuesday ECS.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

/// The main error type for tuesday operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a duplicate key error.
    #[must_use]
    pub fn duplicate_key(key: &impl fmt::Debug) -> Self {
        Self::new(ErrorKind::DuplicateKey(format!("{key:?}")))
    }

    /// Creates a key not found error.
    #[must_use]
    pub fn key_not_found(key: &impl fmt::Debug) -> Self {
        Self::new(ErrorKind::KeyNotFound(format!("{key:?}")))
    }

    /// Creates an unknown value reference error.
    #[must_use]
    pub fn unknown_value_ref(id: u64) -> Self {
        Self::new(ErrorKind::UnknownValueRef(id))
    }

    /// Creates a duplicate entity error.
    #[must_use]
    pub fn duplicate_entity(entity: &impl fmt::Debug) -> Self {
        Self::new(ErrorKind::DuplicateEntity(format!("{entity:?}")))
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity: &impl fmt::Debug) -> Self {
        Self::new(ErrorKind::EntityNotFound(format!("{entity:?}")))
    }

    /// Creates an "already registered" error for a component or system type.
    #[must_use]
    pub fn already_registered(category: Category, name: &'static str) -> Self {
        Self::new(ErrorKind::AlreadyRegistered { category, name })
    }

    /// Creates a "not registered" error for a component or system type.
    #[must_use]
    pub fn not_registered(category: Category, name: &'static str) -> Self {
        Self::new(ErrorKind::NotRegistered { category, name })
    }

    /// Creates an internal invariant violation error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error reports a missing key, entity, or reference.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::KeyNotFound(_)
                | ErrorKind::EntityNotFound(_)
                | ErrorKind::UnknownValueRef(_)
                | ErrorKind::NotRegistered { .. }
        )
    }
}

/// What kind of type a registration error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A component type.
    Component,
    /// A system type.
    System,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Key is already present in an associative store.
    #[error("key already exists: {0}")]
    DuplicateKey(String),

    /// Key is not present in an associative store.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Value reference does not resolve to a live value.
    #[error("unknown value reference: #{0}")]
    UnknownValueRef(u64),

    /// Entity is already registered.
    #[error("entity already exists: {0}")]
    DuplicateEntity(String),

    /// Entity is not registered.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Component or system type was registered twice.
    #[error("{category} already registered: {name}")]
    AlreadyRegistered {
        /// Component or system.
        category: Category,
        /// Type name of the offending registration.
        name: &'static str,
    },

    /// Component or system type was never registered.
    #[error("{category} not registered: {name}")]
    NotRegistered {
        /// Component or system.
        category: Category,
        /// Type name that was looked up.
        name: &'static str,
    },

    /// The same component type appears more than once in a bundle.
    #[error("duplicate component type in bundle: {0}")]
    DuplicateComponent(&'static str),

    /// A storage already holds a value for the entity being inserted.
    #[error("component {component} already present on entity {entity}")]
    ComponentConflict {
        /// Entity being inserted.
        entity: String,
        /// Component type that already had a value.
        component: &'static str,
    },

    /// A type tag does not fit in a fixed-width state.
    #[error("type tag {tag} exceeds state capacity of {capacity} bits")]
    CapacityExceeded {
        /// Index of the tag that did not fit.
        tag: u32,
        /// Number of bits the state can hold.
        capacity: usize,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation that failed, e.g. `"EntityRegistry::insert_with"`.
    pub operation: Option<String>,
    /// Chain of callers, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "in {operation}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias for tuesday operations.
pub type Result<T> = std::result::Result<T, Error>;
