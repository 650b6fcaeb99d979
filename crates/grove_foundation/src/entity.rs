//! Entity handles.

use std::fmt;

/// Raw entity identifier: an index into the entity table.
pub type EntityId = usize;

/// Dense index assigned to a component type.
pub type ComponentIndex = usize;

/// Handle to one logical object in the store.
///
/// An `Entity` is a reference, not an owner: the component row it denotes
/// lives in the entity store and is dropped when the entity is killed.
/// Ids are reused after a kill, so a handle kept past its entity's death may
/// later denote a different entity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: EntityId,
}

impl Entity {
    /// Creates a handle for the given id.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self { id }
    }

    /// Returns the raw id of this entity.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }
}

impl From<EntityId> for Entity {
    fn from(id: EntityId) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}
