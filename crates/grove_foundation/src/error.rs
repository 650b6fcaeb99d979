//! Error types for the Grove system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::Entity;

/// The main error type for Grove operations.
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
    ///
    /// Context already attached is kept; only missing fields are filled in.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(match self.context.take() {
            Some(existing) => existing.merge(context),
            None => context,
        });
        self
    }

    /// Creates an empty slot error.
    #[must_use]
    pub fn not_found(index: usize) -> Self {
        Self::new(ErrorKind::NotFound { index })
    }

    /// Creates an out-of-range error.
    #[must_use]
    pub fn out_of_range(index: usize, size: usize) -> Self {
        Self::new(ErrorKind::OutOfRange { index, size })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity: Entity) -> Self {
        Self::new(ErrorKind::EntityNotFound(entity))
    }

    /// Creates a missing component error.
    #[must_use]
    pub fn component_not_found(entity: Entity, component: &'static str) -> Self {
        Self::new(ErrorKind::ComponentNotFound { entity, component })
    }

    /// Creates an unknown system tag error.
    #[must_use]
    pub fn system_not_found(tag: impl Into<String>) -> Self {
        Self::new(ErrorKind::SystemNotFound(tag.into()))
    }

    /// Creates a duplicate system tag error.
    #[must_use]
    pub fn duplicate_system(tag: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateSystem(tag.into()))
    }

    /// Creates a repeated component type error.
    #[must_use]
    pub fn duplicate_component(component: &'static str) -> Self {
        Self::new(ErrorKind::DuplicateComponent(component))
    }

    /// Creates an error for a `*_last` call made before anything was used.
    #[must_use]
    pub fn no_last_used(what: &'static str) -> Self {
        Self::new(ErrorKind::NoLastUsed(what))
    }

    /// Creates an error raised from inside a system callback.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Callback(message.into()))
    }

    /// Returns true if this is a "value absent" error of any flavor.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NotFound { .. }
                | ErrorKind::EntityNotFound(_)
                | ErrorKind::ComponentNotFound { .. }
        )
    }

    /// Returns true if this is an out-of-range error.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, ErrorKind::OutOfRange { .. })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A slot inside capacity holds no value.
    #[error("slot {index} is empty")]
    NotFound {
        /// The slot that was accessed.
        index: usize,
    },

    /// An index beyond the current capacity was accessed.
    #[error("index out of range: {index} (size {size})")]
    OutOfRange {
        /// The index that was accessed.
        index: usize,
        /// The capacity at the time of access.
        size: usize,
    },

    /// The entity is not live.
    #[error("entity not found: {0}")]
    EntityNotFound(Entity),

    /// Component not present on a live entity.
    #[error("component not found: {component} on {entity}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// No system is registered under the tag.
    #[error("system not found: {0}")]
    SystemNotFound(String),

    /// A system is already registered under the tag.
    #[error("system already registered: {0}")]
    DuplicateSystem(String),

    /// A component type appears more than once in a single query.
    #[error("component requested twice in one query: {0}")]
    DuplicateComponent(&'static str),

    /// A `*_last` convenience call had nothing to refer to.
    #[error("no {0} has been used yet")]
    NoLastUsed(&'static str),

    /// Failure reported by a system callback.
    #[error("system callback failed: {0}")]
    Callback(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Tag of the system that was running.
    pub system: Option<String>,
    /// Entity being visited.
    pub entity: Option<Entity>,
    /// Tick number.
    pub tick: Option<u64>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system tag.
    #[must_use]
    pub fn with_system(mut self, tag: impl Into<String>) -> Self {
        self.system = Some(tag.into());
        self
    }

    /// Sets the entity.
    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Sets the tick number.
    #[must_use]
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    fn merge(self, outer: Self) -> Self {
        Self {
            system: self.system.or(outer.system),
            entity: self.entity.or(outer.entity),
            tick: self.tick.or(outer.tick),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(system) = &self.system {
            write!(f, "in system '{system}'")?;
            sep = " ";
        }
        if let Some(entity) = self.entity {
            write!(f, "{sep}at {entity}")?;
            sep = " ";
        }
        if let Some(tick) = self.tick {
            write!(f, "{sep}during tick {tick}")?;
        }
        Ok(())
    }
}

/// Result type alias for Grove operations.
pub type Result<T> = std::result::Result<T, Error>;
