//! Grove - Sparse-slot entity-component store
//!
//! This crate re-exports all layers of the Grove system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: grove_storage    - Entity store, systems, registry, views
//! Layer 0: grove_foundation - Core types (Entity, SlotTable, Error)
//! ```

pub use grove_foundation as foundation;
pub use grove_storage as storage;

/// The types most programs need.
pub mod prelude {
    pub use grove_foundation::{Entity, Error, ErrorKind, RegistryConfig, Result};
    pub use grove_storage::{ComponentSet, Registry, View};
}
