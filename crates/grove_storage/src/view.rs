//! Bulk read/write queries over component combinations.

use std::fmt;

use grove_foundation::Entity;

use crate::component::ComponentSet;

/// The captured `(entity, components)` tuples of a [`Registry::view`] call.
///
/// A view mutably borrows its registry, so no entity can be spawned, killed or
/// changed while it exists. To mutate the registry based on a view, take
/// [`View::entities`] first and drop the view.
///
/// [`Registry::view`]: crate::Registry::view
pub struct View<'r, Q: ComponentSet> {
    items: Vec<(Entity, Q::Refs<'r>)>,
}

impl<'r, Q: ComponentSet> View<'r, Q> {
    pub(crate) fn new(items: Vec<(Entity, Q::Refs<'r>)>) -> Self {
        Self { items }
    }

    /// Returns the number of captured entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no entity matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the captured entities, in capture order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.items.iter().map(|(entity, _)| *entity).collect()
    }

    /// Calls `f` with each entity's components.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Q::Refs<'r>),
    {
        for (_, refs) in &mut self.items {
            f(refs);
        }
    }

    /// Calls `f` with each entity and its components.
    pub fn each_entity<F>(&mut self, mut f: F)
    where
        F: FnMut(Entity, &mut Q::Refs<'r>),
    {
        for (entity, refs) in &mut self.items {
            f(*entity, refs);
        }
    }

    /// Iterates over the captured tuples.
    pub fn iter(&self) -> std::slice::Iter<'_, (Entity, Q::Refs<'r>)> {
        self.items.iter()
    }

    /// Iterates mutably over the captured tuples.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, (Entity, Q::Refs<'r>)> {
        self.items.iter_mut()
    }
}

impl<Q: ComponentSet> fmt::Debug for View<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("entities", &self.entities())
            .finish_non_exhaustive()
    }
}

impl<'r, Q: ComponentSet> IntoIterator for View<'r, Q> {
    type Item = (Entity, Q::Refs<'r>);
    type IntoIter = std::vec::IntoIter<(Entity, Q::Refs<'r>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'v, 'r, Q: ComponentSet> IntoIterator for &'v mut View<'r, Q> {
    type Item = &'v mut (Entity, Q::Refs<'r>);
    type IntoIter = std::slice::IterMut<'v, (Entity, Q::Refs<'r>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}
