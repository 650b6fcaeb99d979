//! Core types, sparse slot tables, and type indexing for Grove.
//!
//! This crate provides:
//! - [`Entity`] - Reusable entity handles
//! - [`SlotTable`] - Chunk-grown, explicitly nullable indexed storage
//! - [`TypeIndexRegistry`] - Component type to dense index interning
//! - [`Error`] - Rich error types with context
//! - [`RegistryConfig`] - Storage growth configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod entity;
pub mod error;
pub mod intern;
pub mod slots;

pub use config::RegistryConfig;
pub use entity::{ComponentIndex, Entity, EntityId};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use intern::TypeIndexRegistry;
pub use slots::SlotTable;
