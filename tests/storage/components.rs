//! Integration tests for component storage
//!
//! Tests emplace/remove/get round trips and type isolation.

use grove::foundation::{ErrorKind, RegistryConfig};
use grove::storage::Registry;

#[derive(Debug, Clone, PartialEq)]
struct Name(String);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Marker;

fn registry() -> Registry {
    Registry::with_config(RegistryConfig::small())
}

#[test]
fn has_round_trip() {
    let mut registry = registry();
    let e = registry.spawn_entity();

    registry.emplace(e, Health(10)).unwrap();
    assert!(registry.has::<Health>(e));

    registry.remove::<Health>(e).unwrap();
    assert!(!registry.has::<Health>(e));
}

#[test]
fn double_emplace_keeps_second_value() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Name("first".into())).unwrap();
    registry.emplace(e, Name("second".into())).unwrap();

    assert_eq!(registry.get::<Name>(e).unwrap(), &Name("second".into()));
}

#[test]
fn components_are_per_entity() {
    let mut registry = registry();
    let a = registry.spawn_entity();
    let b = registry.spawn_entity();
    registry.emplace(a, Health(1)).unwrap();
    registry.emplace(b, Health(2)).unwrap();

    registry.get_mut::<Health>(a).unwrap().0 = 100;
    assert_eq!(registry.get::<Health>(b).unwrap(), &Health(2));
}

#[test]
fn same_shape_different_types_do_not_collide() {
    #[derive(Debug, PartialEq)]
    struct Meters(f32);
    #[derive(Debug, PartialEq)]
    struct Seconds(f32);

    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Meters(1.0)).unwrap();
    assert!(!registry.has::<Seconds>(e));
    assert!(registry.get::<Seconds>(e).is_err());
}

#[test]
fn missing_component_error_names_type_and_entity() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.register_components::<(Health,)>();

    let err = registry.get::<Health>(e).unwrap_err();
    match err.kind {
        ErrorKind::ComponentNotFound { entity, component } => {
            assert_eq!(entity, e);
            assert!(component.ends_with("Health"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn chained_emplace_and_last_entity() {
    let mut registry = registry();
    registry.spawn_entity();
    registry
        .emplace_last(Health(5))
        .unwrap()
        .emplace_last(Marker)
        .unwrap();

    let e = registry.last_entity().unwrap();
    assert!(registry.has::<Health>(e));
    assert!(registry.has::<Marker>(e));
}

#[test]
fn remove_many_then_has_index() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry
        .emplace(e, Health(1))
        .unwrap()
        .emplace(e, Marker)
        .unwrap()
        .emplace(e, Name("n".into()))
        .unwrap();

    let marker = registry.component_index::<Marker>().unwrap();
    assert!(registry.has_index(e, marker));

    registry.remove_many::<(Health, Marker)>(e).unwrap();
    assert!(!registry.has_index(e, marker));
    assert!(registry.has::<Name>(e));
}

#[test]
fn removing_absent_component_is_harmless() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Health(1)).unwrap();
    registry.remove::<Name>(e).unwrap();
    registry.remove::<Name>(e).unwrap();
    assert!(registry.has::<Health>(e));
}

#[test]
fn component_indices_are_stable_across_entities() {
    let mut registry = registry();
    let a = registry.spawn_entity();
    registry.emplace(a, Marker).unwrap();
    let index = registry.component_index::<Marker>();

    for _ in 0..50 {
        let e = registry.spawn_entity();
        registry.emplace(e, Health(0)).unwrap();
    }
    assert_eq!(registry.component_index::<Marker>(), index);
    assert_eq!(registry.types().len(), 2);
}

#[test]
fn many_component_types_on_one_entity() {
    let mut registry = Registry::with_config(RegistryConfig::small().with_component_chunk(2));
    let e = registry.spawn_entity();
    registry
        .emplace(e, 1_u8)
        .unwrap()
        .emplace(e, 2_u16)
        .unwrap()
        .emplace(e, 3_u32)
        .unwrap()
        .emplace(e, 4_u64)
        .unwrap()
        .emplace(e, 5_i8)
        .unwrap();

    assert_eq!(*registry.get::<u8>(e).unwrap(), 1);
    assert_eq!(*registry.get::<u64>(e).unwrap(), 4);
    assert_eq!(*registry.get::<i8>(e).unwrap(), 5);
}
