//! Entity lifecycle management with id reuse and trailing compaction.
//!
//! The `EntityStore` owns every entity's component row and decides which id a
//! new entity receives. Killed ids are reclaimed and reissued smallest-first;
//! killing the entity at the top of the id range shrinks the range instead,
//! swallowing any reclaimed ids that become trailing holes.

use std::collections::BTreeSet;

use grove_foundation::{Entity, EntityId, Error, RegistryConfig, Result, SlotTable};

use crate::component::ComponentRow;

/// Owns component rows and entity id bookkeeping.
#[derive(Debug)]
pub struct EntityStore {
    /// One row per live entity, indexed by id.
    rows: SlotTable<ComponentRow>,
    /// Ids below the frontier that are free for reuse.
    reclaimed: BTreeSet<EntityId>,
    /// The next id to allocate when nothing is reclaimed.
    frontier: EntityId,
    /// Growth step of new component rows.
    component_chunk: usize,
    /// Number of component types every row must have room for.
    component_types: usize,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl EntityStore {
    /// Creates an empty entity store.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let config = config.normalized();
        Self {
            rows: SlotTable::with_chunk(config.entity_chunk),
            reclaimed: BTreeSet::new(),
            frontier: 0,
            component_chunk: config.component_chunk,
            component_types: 0,
        }
    }

    /// Spawns a new entity with an empty row.
    ///
    /// Reuses the smallest reclaimed id when there is one.
    pub fn spawn(&mut self) -> Entity {
        let id = if let Some(id) = self.reclaimed.pop_first() {
            id
        } else {
            let id = self.frontier;
            self.frontier += 1;
            id
        };

        self.rows.set(id, self.empty_row());
        tracing::trace!(entity = id, frontier = self.frontier, "entity spawned");
        Entity::new(id)
    }

    /// Kills an entity, returning its row.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live, or `OutOfRange` if
    /// its id is beyond the table's capacity.
    pub fn kill(&mut self, entity: Entity) -> Result<ComponentRow> {
        let id = entity.id();
        let row = self
            .rows
            .unset(id)?
            .ok_or_else(|| Error::entity_not_found(entity))?;

        if id + 1 == self.frontier {
            self.frontier -= 1;
            self.compact();
        } else {
            self.reclaimed.insert(id);
        }

        tracing::trace!(entity = id, frontier = self.frontier, "entity killed");
        Ok(row)
    }

    /// Strips reclaimed ids sitting directly below the frontier.
    fn compact(&mut self) {
        while let Some(&last) = self.reclaimed.last() {
            if last + 1 != self.frontier {
                break;
            }
            self.reclaimed.pop_last();
            self.frontier -= 1;
        }
    }

    fn empty_row(&self) -> ComponentRow {
        let mut row = ComponentRow::with_chunk(self.component_chunk);
        if self.component_types > 0 {
            row.reserve(self.component_types - 1);
        }
        row
    }

    /// Makes every row, present and future, fit `count` component types.
    pub fn reserve_components(&mut self, count: usize) {
        if count <= self.component_types {
            return;
        }
        self.component_types = count;
        for (_, row) in self.rows.iter_mut() {
            if let Some(row) = row {
                row.reserve(count - 1);
            }
        }
    }

    /// Checks if an entity is live.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.rows.is_set(entity.id())
    }

    /// Returns an entity's component row.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live, or `OutOfRange` if
    /// its id is beyond the table's capacity.
    pub fn row(&self, entity: Entity) -> Result<&ComponentRow> {
        self.rows
            .get(entity.id())
            .map_err(|err| Self::entity_error(entity, err))
    }

    /// Returns an entity's component row mutably.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::row`].
    pub fn row_mut(&mut self, entity: Entity) -> Result<&mut ComponentRow> {
        self.rows
            .get_mut(entity.id())
            .map_err(|err| Self::entity_error(entity, err))
    }

    fn entity_error(entity: Entity, err: Error) -> Error {
        if err.is_out_of_range() {
            err
        } else {
            Error::entity_not_found(entity)
        }
    }

    /// Iterates mutably over the rows of every id below the frontier.
    pub(crate) fn rows_mut(
        &mut self,
    ) -> impl Iterator<Item = (Entity, Option<&mut ComponentRow>)> + '_ {
        self.rows
            .iter_mut()
            .take(self.frontier)
            .map(|(id, row)| (Entity::new(id), row))
    }

    /// Returns the allocation frontier.
    ///
    /// This is an upper bound on live ids, not the live count: reclaimed ids
    /// below the frontier are holes.
    #[must_use]
    pub fn frontier(&self) -> EntityId {
        self.frontier
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the capacity of the entity table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rows.size()
    }

    /// Iterates over reclaimed ids, smallest first.
    pub fn reclaimed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.reclaimed.iter().copied()
    }

    /// Iterates over all live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.rows().map(|(entity, _)| entity)
    }

    /// Iterates over live entities and their rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = (Entity, &ComponentRow)> + '_ {
        self.rows
            .occupied()
            .map(|(id, row)| (Entity::new(id), row))
    }
}
