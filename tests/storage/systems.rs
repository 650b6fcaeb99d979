//! Integration tests for systems
//!
//! Tests dependency gating, tick ordering, mutation during iteration, and
//! callback failure.

use std::cell::RefCell;
use std::rc::Rc;

use grove::foundation::{Entity, Error, ErrorKind, RegistryConfig};
use grove::storage::Registry;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Doomed;

fn registry() -> Registry {
    Registry::with_config(RegistryConfig::small())
}

fn recorder() -> (Rc<RefCell<Vec<Entity>>>, Rc<RefCell<Vec<Entity>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    (Rc::clone(&log), log)
}

// =============================================================================
// Dependency Gating
// =============================================================================

#[test]
fn system_sees_entity_only_with_all_dependencies() {
    let mut registry = registry();
    let (log, seen) = recorder();
    registry
        .add_system::<(Position, Velocity), _>("movement", move |e, _| {
            log.borrow_mut().push(e);
            Ok(())
        })
        .unwrap();

    let e = registry.spawn_entity();
    registry.emplace(e, Position(0)).unwrap();
    registry.update().unwrap();
    assert!(seen.borrow().is_empty());

    registry.emplace(e, Velocity(1)).unwrap();
    registry.update().unwrap();
    assert_eq!(*seen.borrow(), vec![e]);
}

#[test]
fn movement_integrates_velocity() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry
        .emplace(e, Position(0))
        .unwrap()
        .emplace(e, Velocity(3))
        .unwrap()
        .add_system::<(Position, Velocity), _>("movement", |e, r| {
            let velocity = *r.get::<Velocity>(e)?;
            r.get_mut::<Position>(e)?.0 += velocity.0;
            Ok(())
        })
        .unwrap();

    for _ in 0..4 {
        registry.update().unwrap();
    }
    assert_eq!(registry.get::<Position>(e).unwrap(), &Position(12));
}

#[test]
fn systems_run_in_registration_order() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Position(1)).unwrap();
    registry
        .add_system::<(Position,), _>("add", |e, r| {
            r.get_mut::<Position>(e)?.0 += 1;
            Ok(())
        })
        .unwrap()
        .add_system::<(Position,), _>("double", |e, r| {
            r.get_mut::<Position>(e)?.0 *= 2;
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(registry.get::<Position>(e).unwrap().0, 4);
}

// =============================================================================
// Mutation During Iteration
// =============================================================================

fn kill_all_in_one_tick(count: usize) {
    crate::init_tracing();
    let mut registry = registry();
    for _ in 0..count {
        let e = registry.spawn_entity();
        registry.emplace(e, Doomed).unwrap();
    }
    registry
        .add_system::<(Doomed,), _>("reaper", |e, r| {
            r.kill_entity(e)?;
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();

    assert_eq!(registry.live_count(), 0, "{count} entities");
    assert_eq!(registry.entities_count(), 0, "{count} entities");
    assert!(registry.system_members("reaper").unwrap().is_empty());
}

#[test]
fn self_killing_system_clears_one_entity() {
    kill_all_in_one_tick(1);
}

#[test]
fn self_killing_system_clears_two_entities() {
    kill_all_in_one_tick(2);
}

#[test]
fn self_killing_system_clears_a_hundred_entities() {
    kill_all_in_one_tick(100);
}

#[test]
fn removing_own_dependency_does_not_skip_neighbors() {
    let mut registry = registry();
    let entities: Vec<_> = (0..10)
        .map(|_| {
            let e = registry.spawn_entity();
            registry.emplace(e, Doomed).unwrap();
            e
        })
        .collect();

    let (log, seen) = recorder();
    registry
        .add_system::<(Doomed,), _>("pardon", move |e, r| {
            log.borrow_mut().push(e);
            r.remove::<Doomed>(e)?;
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(*seen.borrow(), entities);
    assert_eq!(registry.live_count(), 10);
}

#[test]
fn killing_a_later_member_skips_it() {
    let mut registry = registry();
    let entities: Vec<_> = (0..4)
        .map(|_| {
            let e = registry.spawn_entity();
            registry.emplace(e, Position(0)).unwrap();
            e
        })
        .collect();

    let victim = entities[3];
    let (log, seen) = recorder();
    registry
        .add_system::<(Position,), _>("hunter", move |e, r| {
            log.borrow_mut().push(e);
            if r.is_alive(victim) {
                r.kill_entity(victim)?;
            }
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(*seen.borrow(), entities[..3].to_vec());
}

#[test]
fn entities_spawned_mid_tick_are_visited_in_same_tick() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Position(3)).unwrap();

    // Each visited entity with a positive countdown spawns a successor
    registry
        .add_system::<(Position,), _>("spawner", |e, r| {
            let remaining = r.get::<Position>(e)?.0;
            if remaining > 0 {
                let child = r.spawn_entity();
                r.emplace(child, Position(remaining - 1))?;
                r.get_mut::<Position>(e)?.0 = 0;
            }
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(registry.live_count(), 4);
    assert!(registry.entities().all(|e| registry.get::<Position>(e).unwrap().0 == 0));
}

#[test]
fn view_driven_kill_all() {
    let mut registry = registry();
    for _ in 0..25 {
        let e = registry.spawn_entity();
        registry.emplace(e, Doomed).unwrap();
    }
    let trigger = registry.spawn_entity();
    registry.emplace(trigger, Position(0)).unwrap();

    registry
        .add_system::<(Position,), _>("purge", |_, r| {
            let doomed = r.view::<(Doomed,)>()?.entities();
            for e in doomed {
                r.kill_entity(e)?;
            }
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(registry.live_count(), 1);
    assert!(registry.is_alive(trigger));
}

// =============================================================================
// System Management
// =============================================================================

#[test]
fn system_removed_mid_tick_does_not_run() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Position(0)).unwrap();

    registry
        .add_system::<(Position,), _>("remover", |_, r| {
            if r.has_system("victim") {
                r.remove_system("victim")?;
            }
            Ok(())
        })
        .unwrap()
        .add_system::<(Position,), _>("victim", |e, r| {
            r.get_mut::<Position>(e)?.0 += 1;
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(registry.get::<Position>(e).unwrap().0, 0);
    assert_eq!(registry.system_tags().collect::<Vec<_>>(), vec!["remover"]);
}

#[test]
fn system_added_mid_tick_waits_for_next_tick() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Position(0)).unwrap();

    registry
        .add_system::<(Position,), _>("installer", |_, r| {
            if !r.has_system("counter") {
                r.add_system::<(Position,), _>("counter", |e, r| {
                    r.get_mut::<Position>(e)?.0 += 1;
                    Ok(())
                })?;
            }
            Ok(())
        })
        .unwrap();

    registry.update().unwrap();
    assert_eq!(registry.get::<Position>(e).unwrap().0, 0);
    registry.update().unwrap();
    assert_eq!(registry.get::<Position>(e).unwrap().0, 1);
}

#[test]
fn system_can_replace_its_own_callback() {
    let mut registry = registry();
    let e = registry.spawn_entity();
    registry.emplace(e, Position(0)).unwrap();

    registry
        .add_system::<(Position,), _>("once", |e, r| {
            r.get_mut::<Position>(e)?.0 += 10;
            r.set_system_update("once", |_, _| Ok(()))?;
            Ok(())
        })
        .unwrap();

    registry.update().unwrap().update().unwrap();
    assert_eq!(registry.get::<Position>(e).unwrap().0, 10);
}

#[test]
fn unknown_tags_are_reported() {
    let mut registry = registry();
    for err in [
        registry.remove_system("ghost").unwrap_err(),
        registry.update_system("ghost").unwrap_err(),
        registry.add_system_deps::<(Position,)>("ghost").unwrap_err(),
        registry.set_system_update("ghost", |_, _| Ok(())).unwrap_err(),
    ] {
        assert!(matches!(err.kind, ErrorKind::SystemNotFound(ref tag) if tag == "ghost"));
    }
}

// =============================================================================
// Failure
// =============================================================================

#[test]
fn callback_error_aborts_tick_with_context() {
    crate::init_tracing();
    let mut registry = registry();
    let a = registry.spawn_entity();
    let b = registry.spawn_entity();
    registry.emplace(a, Position(0)).unwrap();
    registry.emplace(b, Position(-1)).unwrap();

    registry
        .add_system::<(Position,), _>("validate", |e, r| {
            let position = r.get_mut::<Position>(e)?;
            if position.0 < 0 {
                return Err(Error::callback("negative position"));
            }
            position.0 += 1;
            Ok(())
        })
        .unwrap()
        .add_system::<(Position,), _>("after", |e, r| {
            r.get_mut::<Position>(e)?.0 += 100;
            Ok(())
        })
        .unwrap();

    let err = registry.update().unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Callback(_)));
    let context = err.context.unwrap();
    assert_eq!(context.system.as_deref(), Some("validate"));
    assert_eq!(context.entity, Some(b));
    assert_eq!(context.tick, Some(1));

    // Work done before the failure is kept; later systems never ran
    assert_eq!(registry.get::<Position>(a).unwrap().0, 1);
    assert_eq!(registry.system("validate").map(|s| s.has_callback()).ok(), Some(true));
}
