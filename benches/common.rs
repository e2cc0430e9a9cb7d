#![allow(dead_code)]

use world_registry::engine::error::ECSResult;
use world_registry::{ComponentID, Entity, StoreConfig, WorldRegistry};

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

#[derive(Clone, Copy)]
pub struct Productivity {
    pub rate: f32,
}

pub struct Ids {
    pub position: ComponentID,
    pub wealth: ComponentID,
    pub productivity: ComponentID,
}

pub fn make_world(capacity: usize) -> (WorldRegistry, Ids) {
    let cfg = StoreConfig { column_capacity: capacity, ..StoreConfig::default() };
    let mut world = WorldRegistry::with_config(cfg).expect("valid bench config");
    let ids = Ids {
        position: world.register_component::<Position>(),
        wealth: world.register_component::<Wealth>(),
        productivity: world.register_component::<Productivity>(),
    };
    (world, ids)
}

pub fn populate(world: &mut WorldRegistry, ids: &Ids, agents: usize) -> ECSResult<Vec<Entity>> {
    let mut out = Vec::with_capacity(agents);
    for i in 0..agents {
        let entity = world.create_entity(&[ids.position, ids.wealth, ids.productivity])?;
        world.attach_component(entity, Position { x: i as f32, y: 0.0 })?;
        world.attach_component(entity, Wealth { value: 1.0 })?;
        world.attach_component(entity, Productivity { rate: 0.01 })?;
        out.push(entity);
    }
    Ok(out)
}
