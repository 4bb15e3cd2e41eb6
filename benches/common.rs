#![allow(dead_code)]

use strata_ecs::engine::component::Component;
use strata_ecs::engine::world::World;

pub const ENTITIES_SMALL: usize = 10_000;
pub const ENTITIES_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
impl Component for Position {}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}
impl Component for Velocity {}

#[derive(Clone, Copy)]
pub struct Mass {
    pub value: f32,
}
impl Component for Mass {}

pub fn make_world(entity_capacity: usize) -> World {
    World::with_capacity(entity_capacity, 16, 16).unwrap()
}

pub fn populate(world: &mut World, count: usize) {
    for i in 0..count {
        let entity = world.spawn().unwrap().entity();
        world
            .insert(
                entity,
                (
                    Position {
                        x: i as f32,
                        y: 0.0,
                    },
                    Velocity { dx: 1.0, dy: 0.0 },
                ),
            )
            .unwrap();
    }
}
