//! Type-erased component storage and component type lists.
//!
//! Each live entity owns a [`ComponentRow`]: a slot table keyed by
//! [`ComponentIndex`] whose values are boxed, type-erased components. A
//! [`ComponentSet`] is a compile-time list of component types (a tuple) that
//! systems and views use to name their dependencies.

use std::any::{Any, type_name};

use grove_foundation::{ComponentIndex, SlotTable, TypeIndexRegistry};

/// A type-erased component value.
pub type Component = Box<dyn Any>;

/// Per-entity sparse mapping from component index to component value.
pub type ComponentRow = SlotTable<Component>;

/// A tuple of component types.
///
/// Implemented for tuples of one to eight `'static` types:
///
/// ```ignore
/// registry.view::<(Position, Velocity)>()?;
/// registry.add_system::<(Health,), _>("regen", |e, r| { ... });
/// ```
pub trait ComponentSet: 'static {
    /// Mutable references to one entity's components, in tuple order.
    type Refs<'a>;

    /// Number of types in the set.
    const LEN: usize;

    /// Returns the index of every type, registering unknown ones.
    fn register(types: &mut TypeIndexRegistry) -> Vec<ComponentIndex>;

    /// Returns the index of every type, or `None` if any is unregistered.
    fn lookup(types: &TypeIndexRegistry) -> Option<Vec<ComponentIndex>>;

    /// Returns the type names, in tuple order.
    fn names() -> Vec<&'static str>;

    /// Downcasts one entity's slots (in tuple order) to typed references.
    fn fetch<'a>(slots: Vec<&'a mut Component>) -> Option<Self::Refs<'a>>;
}

macro_rules! impl_component_set {
    ($len:expr; $($name:ident),+) => {
        impl<$($name: 'static),+> ComponentSet for ($($name,)+) {
            type Refs<'a> = ($(&'a mut $name,)+);

            const LEN: usize = $len;

            fn register(types: &mut TypeIndexRegistry) -> Vec<ComponentIndex> {
                vec![$(types.index_of::<$name>()),+]
            }

            fn lookup(types: &TypeIndexRegistry) -> Option<Vec<ComponentIndex>> {
                Some(vec![$(types.lookup::<$name>()?),+])
            }

            fn names() -> Vec<&'static str> {
                vec![$(type_name::<$name>()),+]
            }

            fn fetch<'a>(slots: Vec<&'a mut Component>) -> Option<Self::Refs<'a>> {
                let mut slots = slots.into_iter();
                Some(($(slots.next()?.downcast_mut::<$name>()?,)+))
            }
        }
    };
}

impl_component_set!(1; A);
impl_component_set!(2; A, B);
impl_component_set!(3; A, B, C);
impl_component_set!(4; A, B, C, D);
impl_component_set!(5; A, B, C, D, E);
impl_component_set!(6; A, B, C, D, E, F);
impl_component_set!(7; A, B, C, D, E, F, G);
impl_component_set!(8; A, B, C, D, E, F, G, H);

/// Returns the name of the first type that appears twice in `indices`.
pub(crate) fn first_repeated<Q: ComponentSet>(indices: &[ComponentIndex]) -> Option<&'static str> {
    let names = Q::names();
    indices.iter().enumerate().find_map(|(position, index)| {
        indices[..position]
            .contains(index)
            .then(|| names[position])
    })
}
