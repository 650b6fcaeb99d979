//! Systems: a dependency set, a callback, and an incrementally maintained
//! working set.
//!
//! A system never scans the world on its own. The registry notifies it after
//! every emplace, remove and kill, and the system keeps its member list equal
//! to the live entities whose rows hold every dependency.
//!
//! While the system runs, the member list may change under it (a callback can
//! kill the entity it was handed, or emplace onto others). A cursor tracks
//! the next member to visit; removals at or before the cursor pull it back so
//! the entity shifted into the vacated position is still visited and nothing
//! is visited twice. Members appended mid-run are visited in the same run.

use std::fmt;

use grove_foundation::{ComponentIndex, Entity, Result};

use crate::component::ComponentRow;
use crate::entity::EntityStore;
use crate::registry::Registry;

/// A system update callback.
pub type SystemFn = Box<dyn FnMut(Entity, &mut Registry) -> Result<()>>;

/// Registration-order identity of a system.
///
/// Tags can be removed and reused; ids never are, so a tick can tell a
/// removed system from a new one registered under the same tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub(crate) u64);

/// A tagged callback over the entities holding a set of components.
pub struct System {
    id: SystemId,
    tag: String,
    dependencies: Vec<ComponentIndex>,
    members: Vec<Entity>,
    callback: Option<SystemFn>,
    /// Next member to visit; `None` outside a run.
    cursor: Option<usize>,
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("dependencies", &self.dependencies)
            .field("members", &self.members)
            .field("has_callback", &self.callback.is_some())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl System {
    pub(crate) fn new(id: SystemId, tag: String, callback: Option<SystemFn>) -> Self {
        Self {
            id,
            tag,
            dependencies: Vec::new(),
            members: Vec::new(),
            callback,
            cursor: None,
        }
    }

    /// Returns the system's id.
    #[must_use]
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Returns the system's tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the component indices this system requires.
    #[must_use]
    pub fn dependencies(&self) -> &[ComponentIndex] {
        &self.dependencies
    }

    /// Returns the working set, in visiting order.
    #[must_use]
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Returns true if a callback is installed.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Adds a dependency. Returns false if it was already present.
    pub fn add_dependency(&mut self, index: ComponentIndex) -> bool {
        if self.dependencies.contains(&index) {
            return false;
        }
        self.dependencies.push(index);
        true
    }

    /// Returns true if `row` holds every dependency.
    #[must_use]
    pub fn matches(&self, row: &ComponentRow) -> bool {
        self.dependencies.iter().all(|&index| row.is_set(index))
    }

    /// Re-evaluates one entity after its row changed.
    ///
    /// Returns true if membership changed.
    pub fn on_entity_update(&mut self, entity: Entity, row: &ComponentRow) -> bool {
        let position = self.position(entity);
        match (self.matches(row), position) {
            (true, None) => {
                self.members.push(entity);
                true
            }
            (false, Some(position)) => {
                self.remove_at(position);
                true
            }
            _ => false,
        }
    }

    /// Drops a killed entity from the working set.
    ///
    /// Returns true if it was a member.
    pub fn on_entity_delete(&mut self, entity: Entity) -> bool {
        match self.position(entity) {
            Some(position) => {
                self.remove_at(position);
                true
            }
            None => false,
        }
    }

    /// Re-evaluates every live entity.
    pub(crate) fn refresh(&mut self, entities: &EntityStore) {
        for (entity, row) in entities.rows() {
            self.on_entity_update(entity, row);
        }
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        self.members.iter().position(|&member| member == entity)
    }

    fn remove_at(&mut self, position: usize) {
        self.members.remove(position);
        if let Some(cursor) = self.cursor.as_mut() {
            if position < *cursor {
                *cursor -= 1;
            }
        }
    }

    pub(crate) fn set_callback(&mut self, callback: SystemFn) -> Option<SystemFn> {
        self.callback.replace(callback)
    }

    /// Takes the callback out and rewinds the cursor for a new run.
    pub(crate) fn start_run(&mut self) -> Option<SystemFn> {
        let callback = self.callback.take()?;
        self.cursor = Some(0);
        Some(callback)
    }

    /// Returns the member under the cursor and advances past it.
    pub(crate) fn next_member(&mut self) -> Option<Entity> {
        let cursor = self.cursor.as_mut()?;
        let entity = *self.members.get(*cursor)?;
        *cursor += 1;
        Some(entity)
    }

    /// Ends a run, reinstalling `callback` unless one was set meanwhile.
    pub(crate) fn finish_run(&mut self, callback: SystemFn) {
        self.cursor = None;
        if self.callback.is_none() {
            self.callback = Some(callback);
        }
    }
}
