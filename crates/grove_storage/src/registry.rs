//! The registry: entities, components and systems behind one facade.
//!
//! Every mutation that can change which entities a system should see
//! (emplace, remove, kill) notifies every system in registration order before
//! returning, so system working sets are never stale.

use std::any::type_name;

use grove_foundation::{
    ComponentIndex, Entity, EntityId, Error, ErrorContext, RegistryConfig, Result,
    TypeIndexRegistry,
};

use crate::component::{ComponentSet, first_repeated};
use crate::entity::EntityStore;
use crate::system::{System, SystemFn, SystemId};
use crate::view::View;

/// An entity/component store with reactive systems.
///
/// # Example
///
/// ```
/// use grove_storage::Registry;
///
/// struct Health(i32);
///
/// let mut registry = Registry::new();
/// let e = registry.spawn_entity();
/// registry.emplace(e, Health(3)).unwrap();
///
/// registry
///     .add_system::<(Health,), _>("decay", |e, r| {
///         r.get_mut::<Health>(e)?.0 -= 1;
///         Ok(())
///     })
///     .unwrap();
///
/// registry.update().unwrap();
/// assert_eq!(registry.get::<Health>(e).unwrap().0, 2);
/// ```
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    types: TypeIndexRegistry,
    entities: EntityStore,
    /// Systems in registration order.
    systems: Vec<System>,
    next_system_id: u64,
    last_entity: Option<Entity>,
    last_system: Option<String>,
    tick: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with default growth settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given growth settings.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            types: TypeIndexRegistry::new(),
            entities: EntityStore::new(config),
            systems: Vec::new(),
            next_system_id: 0,
            last_entity: None,
            last_system: None,
            tick: 0,
        }
    }

    /// Returns the (normalized) configuration.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    // --- Component types ---

    /// Returns the index of `T`, registering it if needed.
    ///
    /// Registering a type grows every row so it has room for the new index.
    pub fn index_of<T: 'static>(&mut self) -> ComponentIndex {
        let index = self.types.index_of::<T>();
        self.entities.reserve_components(self.types.len());
        index
    }

    /// Returns the index of every type in `Q`, registering unknown ones.
    pub fn dependencies<Q: ComponentSet>(&mut self) -> Vec<ComponentIndex> {
        let indices = Q::register(&mut self.types);
        self.entities.reserve_components(self.types.len());
        indices
    }

    /// Assigns indices to every type in `Q` ahead of use.
    pub fn register_components<Q: ComponentSet>(&mut self) -> &mut Self {
        self.dependencies::<Q>();
        self
    }

    /// Returns the index of `T` without registering it.
    #[must_use]
    pub fn component_index<T: 'static>(&self) -> Option<ComponentIndex> {
        self.types.lookup::<T>()
    }

    /// Returns the component type interner.
    #[must_use]
    pub fn types(&self) -> &TypeIndexRegistry {
        &self.types
    }

    // --- Entities ---

    /// Spawns an entity with no components.
    pub fn spawn_entity(&mut self) -> Entity {
        let entity = self.entities.spawn();
        self.last_entity = Some(entity);
        entity
    }

    /// Kills an entity, dropping all of its components.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live, or `OutOfRange` if
    /// its id was never allocated.
    pub fn kill_entity(&mut self, entity: Entity) -> Result<&mut Self> {
        drop(self.entities.kill(entity)?);
        for system in &mut self.systems {
            system.on_entity_delete(entity);
        }
        Ok(self)
    }

    /// Checks if an entity is live.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the allocation frontier, an upper bound on live ids.
    #[must_use]
    pub fn entities_count(&self) -> EntityId {
        self.entities.frontier()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates over live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Returns the entity store.
    #[must_use]
    pub fn entity_store(&self) -> &EntityStore {
        &self.entities
    }

    /// Returns the most recently spawned or emplaced-on entity.
    #[must_use]
    pub fn last_entity(&self) -> Option<Entity> {
        self.last_entity
    }

    // --- Components ---

    /// Attaches `value` to `entity`, replacing any previous `T`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live, or `OutOfRange` if
    /// its id was never allocated.
    pub fn emplace<T: 'static>(&mut self, entity: Entity, value: T) -> Result<&mut Self> {
        self.entities.row(entity)?;
        let index = self.index_of::<T>();
        self.entities.row_mut(entity)?.set(index, Box::new(value));
        tracing::trace!(%entity, component = type_name::<T>(), "component emplaced");

        self.last_entity = Some(entity);
        self.notify_update(entity)?;
        Ok(self)
    }

    /// Attaches `value` to the last used entity.
    ///
    /// # Errors
    ///
    /// Returns `NoLastUsed` if no entity has been spawned or emplaced on, and
    /// otherwise the errors of [`Registry::emplace`].
    pub fn emplace_last<T: 'static>(&mut self, value: T) -> Result<&mut Self> {
        let entity = self.last_entity.ok_or_else(|| Error::no_last_used("entity"))?;
        self.emplace(entity, value)
    }

    /// Detaches `T` from `entity`. Removing an absent component is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Result<&mut Self> {
        let row = self.entities.row_mut(entity)?;
        if let Some(index) = self.types.lookup::<T>() {
            row.unset(index)?;
            tracing::trace!(%entity, component = type_name::<T>(), "component removed");
        }
        self.notify_update(entity)?;
        Ok(self)
    }

    /// Detaches every type in `Q` from `entity`.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is not live.
    pub fn remove_many<Q: ComponentSet>(&mut self, entity: Entity) -> Result<&mut Self> {
        self.entities.row(entity)?;
        let indices = self.dependencies::<Q>();
        let row = self.entities.row_mut(entity)?;
        for index in indices {
            row.unset(index)?;
        }
        tracing::trace!(%entity, components = ?Q::names(), "components removed");
        self.notify_update(entity)?;
        Ok(self)
    }

    /// Returns true if `entity` is live and holds a `T`.
    #[must_use]
    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.types
            .lookup::<T>()
            .is_some_and(|index| self.has_index(entity, index))
    }

    /// Returns true if `entity` is live and holds a component at `index`.
    #[must_use]
    pub fn has_index(&self, entity: Entity, index: ComponentIndex) -> bool {
        self.entities
            .row(entity)
            .is_ok_and(|row| row.is_set(index))
    }

    /// Returns a reference to `entity`'s `T`.
    ///
    /// # Errors
    ///
    /// Returns `ComponentNotFound` if the entity has no `T`, `EntityNotFound`
    /// if it is not live, or `OutOfRange` if its id was never allocated.
    pub fn get<T: 'static>(&self, entity: Entity) -> Result<&T> {
        let row = self.entities.row(entity)?;
        self.types
            .lookup::<T>()
            .and_then(|index| row.get(index).ok())
            .and_then(|component| component.downcast_ref::<T>())
            .ok_or_else(|| Error::component_not_found(entity, type_name::<T>()))
    }

    /// Returns a mutable reference to `entity`'s `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::get`].
    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Result<&mut T> {
        let index = self.types.lookup::<T>();
        let row = self.entities.row_mut(entity)?;
        let component = match index {
            Some(index) => row.get_mut(index).ok(),
            None => None,
        };
        component
            .and_then(|component| component.downcast_mut::<T>())
            .ok_or_else(|| Error::component_not_found(entity, type_name::<T>()))
    }

    fn notify_update(&mut self, entity: Entity) -> Result<()> {
        let row = self.entities.row(entity)?;
        for system in &mut self.systems {
            system.on_entity_update(entity, row);
        }
        Ok(())
    }

    // --- Systems ---

    /// Registers a system over the entities holding every type in `Q`.
    ///
    /// The working set is filled from the current live entities immediately.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSystem` if `tag` is already registered.
    pub fn add_system<Q, F>(&mut self, tag: impl Into<String>, update: F) -> Result<&mut Self>
    where
        Q: ComponentSet,
        F: FnMut(Entity, &mut Registry) -> Result<()> + 'static,
    {
        self.insert_system::<Q>(tag.into(), Some(Box::new(update)))
    }

    /// Registers a system with no callback yet.
    ///
    /// It tracks its working set like any other system; ticks skip it until
    /// [`Registry::set_system_update`] installs a callback.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSystem` if `tag` is already registered.
    pub fn declare_system<Q: ComponentSet>(&mut self, tag: impl Into<String>) -> Result<&mut Self> {
        self.insert_system::<Q>(tag.into(), None)
    }

    fn insert_system<Q: ComponentSet>(
        &mut self,
        tag: String,
        callback: Option<SystemFn>,
    ) -> Result<&mut Self> {
        if self.has_system(&tag) {
            return Err(Error::duplicate_system(tag));
        }

        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;

        let mut system = System::new(id, tag.clone(), callback);
        for index in self.dependencies::<Q>() {
            system.add_dependency(index);
        }
        system.refresh(&self.entities);
        tracing::debug!(
            system = %tag,
            dependencies = ?Q::names(),
            members = system.members().len(),
            "system added"
        );

        self.systems.push(system);
        self.last_system = Some(tag);
        Ok(self)
    }

    /// Adds the types in `Q` to an existing system's dependencies.
    ///
    /// Entities that no longer match leave the working set at once.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag.
    pub fn add_system_deps<Q: ComponentSet>(&mut self, tag: &str) -> Result<&mut Self> {
        let indices = self.dependencies::<Q>();
        let system = self
            .systems
            .iter_mut()
            .find(|system| system.tag() == tag)
            .ok_or_else(|| Error::system_not_found(tag))?;

        for index in indices {
            system.add_dependency(index);
        }
        system.refresh(&self.entities);
        tracing::debug!(system = %tag, dependencies = ?Q::names(), "system dependencies added");

        self.last_system = Some(tag.to_owned());
        Ok(self)
    }

    /// [`Registry::add_system_deps`] on the last registered or touched system.
    ///
    /// # Errors
    ///
    /// Returns `NoLastUsed` if no system has been used yet, or
    /// `SystemNotFound` if it has since been removed.
    pub fn add_system_deps_last<Q: ComponentSet>(&mut self) -> Result<&mut Self> {
        let tag = self.last_system_tag()?;
        self.add_system_deps::<Q>(&tag)
    }

    /// Replaces a system's callback.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag.
    pub fn set_system_update<F>(&mut self, tag: &str, update: F) -> Result<&mut Self>
    where
        F: FnMut(Entity, &mut Registry) -> Result<()> + 'static,
    {
        self.system_mut(tag)?.set_callback(Box::new(update));
        tracing::debug!(system = %tag, "system callback replaced");
        self.last_system = Some(tag.to_owned());
        Ok(self)
    }

    /// [`Registry::set_system_update`] on the last registered or touched
    /// system.
    ///
    /// # Errors
    ///
    /// Returns `NoLastUsed` if no system has been used yet, or
    /// `SystemNotFound` if it has since been removed.
    pub fn set_system_update_last<F>(&mut self, update: F) -> Result<&mut Self>
    where
        F: FnMut(Entity, &mut Registry) -> Result<()> + 'static,
    {
        let tag = self.last_system_tag()?;
        self.set_system_update(&tag, update)
    }

    fn last_system_tag(&self) -> Result<String> {
        self.last_system
            .clone()
            .ok_or_else(|| Error::no_last_used("system"))
    }

    /// Unregisters a system.
    ///
    /// A system removed while a tick is running is not run again in it.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag.
    pub fn remove_system(&mut self, tag: &str) -> Result<&mut Self> {
        let position = self
            .systems
            .iter()
            .position(|system| system.tag() == tag)
            .ok_or_else(|| Error::system_not_found(tag))?;
        self.systems.remove(position);
        tracing::debug!(system = %tag, "system removed");
        Ok(self)
    }

    /// Returns true if a system has this tag.
    #[must_use]
    pub fn has_system(&self, tag: &str) -> bool {
        self.systems.iter().any(|system| system.tag() == tag)
    }

    /// Iterates over system tags in registration order.
    pub fn system_tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.systems.iter().map(System::tag)
    }

    /// Returns a system by tag.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag.
    pub fn system(&self, tag: &str) -> Result<&System> {
        self.systems
            .iter()
            .find(|system| system.tag() == tag)
            .ok_or_else(|| Error::system_not_found(tag))
    }

    fn system_mut(&mut self, tag: &str) -> Result<&mut System> {
        self.systems
            .iter_mut()
            .find(|system| system.tag() == tag)
            .ok_or_else(|| Error::system_not_found(tag))
    }

    /// Returns a system's working set.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag.
    pub fn system_members(&self, tag: &str) -> Result<&[Entity]> {
        self.system(tag).map(System::members)
    }

    // --- Ticks ---

    /// Returns the number of ticks run so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Runs every system once, in registration order.
    ///
    /// Systems registered during the tick first run on the next one.
    ///
    /// # Errors
    ///
    /// The first callback error aborts the tick and is returned with the
    /// system tag, entity and tick attached. Changes made before it are kept.
    pub fn update(&mut self) -> Result<&mut Self> {
        self.tick += 1;
        let _span = tracing::debug_span!("tick", tick = self.tick).entered();

        let ids: Vec<SystemId> = self.systems.iter().map(System::id).collect();
        for id in ids {
            self.run_system(id)?;
        }
        Ok(self)
    }

    /// Runs a single system once, outside of a tick.
    ///
    /// # Errors
    ///
    /// Returns `SystemNotFound` if no system has this tag, or the callback's
    /// error as in [`Registry::update`].
    pub fn update_system(&mut self, tag: &str) -> Result<&mut Self> {
        let id = self.system(tag)?.id();
        self.run_system(id)?;
        Ok(self)
    }

    fn system_by_id(&mut self, id: SystemId) -> Option<&mut System> {
        self.systems.iter_mut().find(|system| system.id() == id)
    }

    fn run_system(&mut self, id: SystemId) -> Result<()> {
        let Some(system) = self.system_by_id(id) else {
            return Ok(());
        };
        let tag = system.tag().to_owned();
        let Some(mut callback) = system.start_run() else {
            return Ok(());
        };
        let _span = tracing::debug_span!("system", system = %tag).entered();

        let result = loop {
            let Some(entity) = self.system_by_id(id).and_then(System::next_member) else {
                break Ok(());
            };
            if let Err(err) = callback(entity, self) {
                break Err(err.with_context(
                    ErrorContext::new()
                        .with_system(tag.clone())
                        .with_entity(entity)
                        .with_tick(self.tick),
                ));
            }
        };

        if let Some(system) = self.system_by_id(id) {
            system.finish_run(callback);
        }
        if let Err(err) = &result {
            tracing::warn!(system = %tag, error = %err, "system callback failed");
        }
        result
    }

    // --- Views ---

    /// Borrows the components in `Q` of every live entity holding them all.
    ///
    /// Entities are captured in id order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateComponent` if a type appears twice in `Q`.
    pub fn view<Q: ComponentSet>(&mut self) -> Result<View<'_, Q>> {
        let indices = self.dependencies::<Q>();
        if let Some(name) = first_repeated::<Q>(&indices) {
            return Err(Error::duplicate_component(name));
        }

        let items = self
            .entities
            .rows_mut()
            .filter_map(|(entity, row)| {
                let slots = row?.get_disjoint_mut(&indices)?;
                Q::fetch(slots).map(|refs| (entity, refs))
            })
            .collect();
        Ok(View::new(items))
    }
}
