use world_registry::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Velocity {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Speed {
    x: i32,
    y: i32,
    z: i32,
}

#[test]
fn multi_field_components_read_back_as_written() {
    let mut world = WorldRegistry::new();
    let velocity = world.register_component::<Velocity>();
    let speed = world.register_component::<Speed>();

    let e = world.create_entity(&[velocity, speed]).unwrap();
    world.attach_component(e, Velocity { x: 10, y: 2 }).unwrap();
    world.attach_component(e, Speed { x: 5, y: 3, z: 0 }).unwrap();

    assert_eq!(*world.get_component::<Velocity>(e).unwrap(), Velocity { x: 10, y: 2 });
    assert_eq!(*world.get_component::<Speed>(e).unwrap(), Speed { x: 5, y: 3, z: 0 });
    assert_eq!(world.signature_of(e).unwrap().components(), &[velocity, speed][..]);
}

#[test]
fn component_metadata_describes_the_registered_type() {
    let mut world = WorldRegistry::new();
    let velocity = world.register_component::<Velocity>();
    let speed = world.register_component::<Speed>();

    let meta = world.component_meta(speed).unwrap();
    assert_eq!(meta.component_id, speed);
    assert_eq!(meta.size, std::mem::size_of::<Speed>());
    assert!(meta.name.ends_with("Speed"));
    assert_eq!(world.component_meta(velocity).unwrap().size, 8);

    assert!(world.component_meta(speed + 100).unwrap_err().is_not_found());
}
