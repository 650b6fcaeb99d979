//! Entity store, systems, registry, and views for Grove.
//!
//! This crate provides:
//! - [`EntityStore`] - Entity id allocation with reuse and trailing compaction
//! - [`ComponentSet`] - Tuples of component types used by systems and views
//! - [`System`] - Tagged callbacks with incrementally maintained working sets
//! - [`Registry`] - The facade tying entities, components and systems together
//! - [`View`] - Borrowed bulk queries over component combinations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod entity;
pub mod registry;
pub mod system;
pub mod view;

pub use component::{Component, ComponentRow, ComponentSet};
pub use entity::EntityStore;
pub use registry::Registry;
pub use system::{System, SystemFn, SystemId};
pub use view::View;
