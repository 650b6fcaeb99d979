//! Configuration for registry storage growth.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default growth step of the entity table.
pub const DEFAULT_ENTITY_CHUNK: usize = 8192;

/// Default growth step of each entity's component row.
pub const DEFAULT_COMPONENT_CHUNK: usize = 50;

/// Configuration for a registry's slot tables.
///
/// Controls how many slots the entity table and each component row add per
/// growth step. Larger chunks trade memory for fewer reallocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistryConfig {
    /// Slots added to the entity table per growth step.
    pub entity_chunk: usize,

    /// Slots added to a component row per growth step.
    pub component_chunk: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            entity_chunk: DEFAULT_ENTITY_CHUNK,
            component_chunk: DEFAULT_COMPONENT_CHUNK,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration for small worlds and tests.
    #[must_use]
    pub fn small() -> Self {
        Self {
            entity_chunk: 64,
            component_chunk: 8,
        }
    }

    /// Builder method to set the entity chunk.
    #[must_use]
    pub fn with_entity_chunk(mut self, chunk: usize) -> Self {
        self.entity_chunk = chunk;
        self
    }

    /// Builder method to set the component chunk.
    #[must_use]
    pub fn with_component_chunk(mut self, chunk: usize) -> Self {
        self.component_chunk = chunk;
        self
    }

    /// Returns a copy with every chunk at least one slot.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            entity_chunk: self.entity_chunk.max(1),
            component_chunk: self.component_chunk.max(1),
        }
    }
}
