use std::sync::atomic::{AtomicU32, Ordering};

use strata_ecs::engine::component::{named, Component, ComponentDescriptor};
use strata_ecs::engine::world::World;
use strata_ecs::ECSError;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Mass(f32);
impl Component for Mass {}

#[derive(Debug, PartialEq)]
struct Marker;
impl Component for Marker {}

/// Checks row parity and slot consistency across every archetype.
fn check_invariants(world: &World) {
    for archetype in 0..world.archetype_count() as u32 {
        let table = world.table(archetype);
        for column in table.columns() {
            assert_eq!(
                column.len(),
                table.len(),
                "column {} length diverged from the roster",
                column.component_id()
            );
        }
        for (row, &entity) in table.entities().iter().enumerate() {
            let location = world.location(entity).expect("rostered entity is live");
            assert_eq!(location, (archetype, row as u32));
        }
    }
}

#[test]
fn spawn_despawn_respawn_reuses_id_with_new_generation() {
    let mut world = World::new();

    let e1 = world.spawn().unwrap().entity();
    assert_eq!((e1.generation, e1.id), (0, 0));
    assert_eq!(world.entity_count(), 1);

    world.despawn(e1).unwrap();
    assert_eq!(world.entity_count(), 0);
    assert!(!world.contains::<i32>(e1));

    let e2 = world.spawn().unwrap().entity();
    assert_eq!((e2.generation, e2.id), (1, 0));
    assert_ne!(e1, e2);
    assert!(world.location(e1).is_err(), "stale handle stays dead");
    check_invariants(&world);
}

#[test]
fn despawn_of_dead_entity_reports_unknown_entity() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();
    world.despawn(entity).unwrap();

    match world.despawn(entity) {
        Err(ECSError::UnknownEntity(error)) => assert_eq!(error.entity, entity),
        other => panic!("expected UnknownEntity, got {other:?}"),
    }
}

#[test]
fn component_interning_is_monotonic_and_name_aware() {
    let mut world = World::new();
    assert_eq!(world.component_id(&ComponentDescriptor::of::<i32>()), 0);
    assert_eq!(world.component_id(&ComponentDescriptor::named::<i32>("x")), 1);
    assert_eq!(world.component_id(&ComponentDescriptor::of::<i32>()), 0);
    assert_eq!(world.component_id(&ComponentDescriptor::of::<f32>()), 2);
}

#[test]
fn equal_component_sets_share_one_archetype() {
    let mut world = World::new();
    let first = world.spawn().unwrap().entity();
    let second = world.spawn().unwrap().entity();

    world.insert(first, 5i32).unwrap();
    world.insert(first, 1.0f32).unwrap();
    let archetypes_after_first = world.archetype_count();

    world.insert(second, 5i32).unwrap();
    world.insert(second, (1.0f32, 5i32)).unwrap();
    assert_eq!(world.archetype_count(), archetypes_after_first);

    let (archetype_a, _) = world.location(first).unwrap();
    let (archetype_b, _) = world.location(second).unwrap();
    assert_eq!(archetype_a, archetype_b);
    check_invariants(&world);
}

#[test]
fn reinserting_a_present_bundle_is_a_self_edge_and_clobbers() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();

    world.insert(entity, (Position { x: 1.0, y: 1.0 }, Mass(2.0))).unwrap();
    let archetypes = world.archetype_count();
    let location = world.location(entity).unwrap();

    world.insert(entity, (Position { x: 9.0, y: 9.0 }, Mass(3.0))).unwrap();
    assert_eq!(world.archetype_count(), archetypes, "no new archetype");
    assert_eq!(world.location(entity).unwrap(), location, "no migration");
    assert_eq!(*world.get::<Position>(entity), Position { x: 9.0, y: 9.0 });
    assert_eq!(*world.get::<Mass>(entity), Mass(3.0));
}

#[test]
fn nested_bundles_flatten_to_the_same_archetype() {
    let mut world = World::new();
    let nested = world.spawn().unwrap().entity();
    let flat = world.spawn().unwrap().entity();

    world
        .insert(
            nested,
            ((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }), Mass(1.0)),
        )
        .unwrap();
    world
        .insert(
            flat,
            (Position { x: 2.0, y: 2.0 }, Velocity { dx: 0.0, dy: 1.0 }, Mass(2.0)),
        )
        .unwrap();

    let (archetype_a, _) = world.location(nested).unwrap();
    let (archetype_b, _) = world.location(flat).unwrap();
    assert_eq!(archetype_a, archetype_b);
}

#[test]
fn duplicate_components_in_one_bundle_keep_the_last_value() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();
    world.insert(entity, (5i32, 7i32)).unwrap();

    assert_eq!(*world.get::<i32>(entity), 7);
    let (archetype, _) = world.location(entity).unwrap();
    assert_eq!(world.table(archetype).column_count(), 1);
    check_invariants(&world);
}

#[test]
fn empty_bundle_insertion_changes_nothing() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();
    let archetypes = world.archetype_count();

    world.insert(entity, ()).unwrap();
    assert_eq!(world.archetype_count(), archetypes);
    assert_eq!(world.location(entity).unwrap(), (0, 0));
}

#[test]
fn named_instances_of_one_type_are_independent_columns() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();
    world
        .insert(entity, (named("hp", 100i32), named("mp", 30i32)))
        .unwrap();

    assert!(world.contains_named::<i32>(entity, "hp"));
    assert!(world.contains_named::<i32>(entity, "mp"));
    assert!(
        !world.contains::<i32>(entity),
        "the unnamed instance is a different column"
    );
    assert_eq!(*world.get_named::<i32>(entity, "hp"), 100);
    assert_eq!(*world.get_named::<i32>(entity, "mp"), 30);

    *world.get_named_mut::<i32>(entity, "hp") -= 25;
    assert_eq!(*world.get_named::<i32>(entity, "hp"), 75);
    assert_eq!(*world.get_named::<i32>(entity, "mp"), 30);
}

#[test]
fn migration_moves_values_and_fixes_the_swapped_row() {
    let mut world = World::new();
    let a = world.spawn().unwrap().entity();
    let b = world.spawn().unwrap().entity();
    let c = world.spawn().unwrap().entity();
    for (entity, x) in [(a, 1.0f32), (b, 2.0), (c, 3.0)] {
        world.insert(entity, Position { x, y: 0.0 }).unwrap();
    }

    // Moving `a` out of the shared archetype relocates the tail row into
    // its hole; every survivor must still resolve.
    world.insert(a, Velocity { dx: 5.0, dy: 0.0 }).unwrap();
    assert_eq!(*world.get::<Position>(a), Position { x: 1.0, y: 0.0 });
    assert_eq!(*world.get::<Position>(b), Position { x: 2.0, y: 0.0 });
    assert_eq!(*world.get::<Position>(c), Position { x: 3.0, y: 0.0 });
    assert_eq!(*world.get::<Velocity>(a), Velocity { dx: 5.0, dy: 0.0 });
    check_invariants(&world);
}

#[test]
fn despawning_the_tail_row_skips_the_fixup_path() {
    let mut world = World::new();
    let first = world.spawn().unwrap().entity();
    let second = world.spawn().unwrap().entity();
    world.insert(first, Mass(1.0)).unwrap();
    world.insert(second, Mass(2.0)).unwrap();

    let before = world.location(first).unwrap();
    world.despawn(second).unwrap();
    assert_eq!(world.location(first).unwrap(), before);
    assert_eq!(*world.get::<Mass>(first), Mass(1.0));
    check_invariants(&world);
}

#[test]
fn spawning_past_initial_capacity_doubles_without_breaking_invariants() {
    let mut world = World::with_capacity(2, 4, 4).unwrap();
    let entities: Vec<_> = (0..40)
        .map(|i| {
            let entity = world.spawn().unwrap().entity();
            world.insert(entity, Mass(i as f32)).unwrap();
            entity
        })
        .collect();

    assert_eq!(world.entity_count(), 40);
    for (i, entity) in entities.iter().enumerate() {
        assert_eq!(*world.get::<Mass>(*entity), Mass(i as f32));
    }
    check_invariants(&world);
}

#[test]
fn zero_sized_components_are_tracked_by_length_only() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();
    world.insert(entity, (Marker, Mass(1.0))).unwrap();

    assert!(world.contains::<Marker>(entity));
    assert_eq!(*world.get::<Marker>(entity), Marker);
    world.despawn(entity).unwrap();
    assert_eq!(world.entity_count(), 0);
    check_invariants(&world);
}

static TRACKED_DROPS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct Tracked(#[allow(dead_code)] u32);
impl Component for Tracked {}

impl Drop for Tracked {
    fn drop(&mut self) {
        TRACKED_DROPS.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn component_values_are_dropped_exactly_once() {
    let mut world = World::new();
    let entity = world.spawn().unwrap().entity();

    world.insert(entity, Tracked(1)).unwrap();
    assert_eq!(TRACKED_DROPS.load(Ordering::Relaxed), 0);

    // Archetype migration moves the value bitwise; nothing drops.
    world.insert(entity, Mass(1.0)).unwrap();
    assert_eq!(TRACKED_DROPS.load(Ordering::Relaxed), 0);

    // Overwriting drops the previous value, once.
    world.insert(entity, Tracked(2)).unwrap();
    assert_eq!(TRACKED_DROPS.load(Ordering::Relaxed), 1);

    // Despawning drops the final value, once.
    world.despawn(entity).unwrap();
    assert_eq!(TRACKED_DROPS.load(Ordering::Relaxed), 2);
}

#[test]
fn entity_ref_supports_chained_insertion() {
    let mut world = World::new();
    let entity = {
        let mut spawned = world.spawn().unwrap();
        spawned
            .insert(Position { x: 1.0, y: 2.0 })
            .unwrap()
            .insert(Velocity { dx: 0.5, dy: 0.5 })
            .unwrap();
        assert!(spawned.contains::<Position>());
        spawned.entity()
    };
    assert_eq!(*world.get::<Velocity>(entity), Velocity { dx: 0.5, dy: 0.5 });
}

#[test]
fn clear_despawns_everything_and_invalidates_handles() {
    let mut world = World::new();
    let entities: Vec<_> = (0..3)
        .map(|i| {
            let entity = world.spawn().unwrap().entity();
            world.insert(entity, Mass(i as f32)).unwrap();
            entity
        })
        .collect();

    world.clear();
    assert_eq!(world.entity_count(), 0);
    for entity in &entities {
        assert!(world.location(*entity).is_err());
        assert!(!world.contains::<Mass>(*entity));
    }

    // The world stays usable: archetypes and interned ids survive.
    let fresh = world.spawn().unwrap().entity();
    world.insert(fresh, Mass(9.0)).unwrap();
    assert_eq!(*world.get::<Mass>(fresh), Mass(9.0));
    check_invariants(&world);
}

#[test]
fn type_map_clone_is_deep() {
    use strata_ecs::TypeMap;

    let mut map = TypeMap::new();
    map.put(41i32);
    map.put(String::from("shared"));

    let mut cloned = map.clone();
    *cloned.get_mut::<i32>().unwrap() += 1;
    cloned.get_mut::<String>().unwrap().push_str("-copy");

    assert_eq!(*map.get::<i32>(), 41, "original untouched by clone mutation");
    assert_eq!(map.get::<String>().as_str(), "shared");
    assert_eq!(*cloned.get::<i32>(), 42);
    assert_eq!(cloned.get::<String>().as_str(), "shared-copy");

    assert_eq!(map.remove::<i32>(), Some(41));
    assert!(!map.contains::<i32>());
    assert!(map.get_opt::<i32>().is_none());
    assert!(cloned.contains::<i32>());
}
