//! Component type interning.
//!
//! Component types are interned to dense integer indices the first time they
//! are seen. The index is what component rows are keyed by, so the hot paths
//! never touch `TypeId` hashing after registration.

use std::any::{TypeId, type_name};
use std::collections::HashMap;

use crate::entity::ComponentIndex;

/// Interner from component types to dense [`ComponentIndex`] values.
///
/// Indices start at 0 and increase by one per new type. There is no removal:
/// once a type has an index it keeps it for the lifetime of the registry.
/// It is not thread-safe; use external synchronization if needed.
#[derive(Clone, Debug, Default)]
pub struct TypeIndexRegistry {
    /// Map from type to its index.
    indices: HashMap<TypeId, ComponentIndex>,
    /// Type names, by index.
    names: Vec<&'static str>,
}

impl TypeIndexRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `T`, assigning the next free one if `T` is new.
    pub fn index_of<T: 'static>(&mut self) -> ComponentIndex {
        if let Some(&index) = self.indices.get(&TypeId::of::<T>()) {
            return index;
        }

        let index = self.names.len();
        self.indices.insert(TypeId::of::<T>(), index);
        self.names.push(type_name::<T>());
        tracing::debug!(index, component = type_name::<T>(), "component type registered");
        index
    }

    /// Returns the index of `T` if it has been registered.
    #[must_use]
    pub fn lookup<T: 'static>(&self) -> Option<ComponentIndex> {
        self.indices.get(&TypeId::of::<T>()).copied()
    }

    /// Returns true if `T` has been registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.indices.contains_key(&TypeId::of::<T>())
    }

    /// Gets the type name registered at `index`.
    #[must_use]
    pub fn name_of(&self, index: ComponentIndex) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over `(index, type name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentIndex, &'static str)> + '_ {
        self.names.iter().copied().enumerate()
    }
}
