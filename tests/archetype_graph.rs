use std::collections::HashMap;

use world_registry::engine::component::ComponentRegistry;
use world_registry::engine::graph::ArchetypeGraph;
use world_registry::engine::ids::IdAllocator;
use world_registry::engine::types::Direction;
use world_registry::{ComponentID, Signature, StoreConfig, WorldRegistry};

struct Speed(f32);
struct Velocity(f32);
struct Acceleration(f32);
struct Gravity(f32);

fn counts(edges: &[ComponentID]) -> HashMap<ComponentID, usize> {
    let mut out = HashMap::new();
    for &c in edges {
        *out.entry(c).or_insert(0) += 1;
    }
    out
}

#[test]
fn dependency_graph_counts_each_reached_archetype_once() {
    let cfg = StoreConfig { column_capacity: 1, ..StoreConfig::default() };
    let mut world = WorldRegistry::with_config(cfg).unwrap();
    let s = world.register_component::<Speed>();
    let v = world.register_component::<Velocity>();
    let a = world.register_component::<Acceleration>();
    let g = world.register_component::<Gravity>();

    world.create_entity(&[s, a, v]).unwrap();
    world.create_entity(&[s, g, v, a]).unwrap();
    world.create_entity(&[s, g]).unwrap();
    world.create_entity(&[g]).unwrap();
    world.create_entity(&[g, v, a]).unwrap();
    world.create_entity(&[a, v, a]).unwrap();

    let edges = world.get_dependency_graph();
    assert_eq!(edges.len(), 9);
    assert_eq!(edges, vec![s, v, a, g, g, v, a, g, g]);

    let counts = counts(&edges);
    assert_eq!(counts[&s], 1);
    assert_eq!(counts[&v], 2);
    assert_eq!(counts[&a], 2);
    assert_eq!(counts[&g], 4);

    // root plus nine
    assert_eq!(world.archetype_count(), 10);
}

#[test]
fn archetypes_become_reclaimable_when_emptied() {
    let mut world = WorldRegistry::new();
    let s = world.register_component::<Speed>();
    let g = world.register_component::<Gravity>();

    let lone = world.create_entity(&[g]).unwrap();
    let pair = world.create_entity(&[s, g]).unwrap();
    assert!(world.reclaimable_archetypes().is_empty());

    world.delete_entity(lone).unwrap();
    let only_g = world.get_archetype_id(&[g]).unwrap();
    assert_eq!(world.reclaimable_archetypes(), vec![only_g]);

    // {s} still has a child, {s, g} still has an entity.
    world.delete_entity(pair).unwrap();
    let s_g = world.get_archetype_id(&[s, g]).unwrap();
    let mut reclaimable = world.reclaimable_archetypes();
    reclaimable.sort_unstable();
    assert_eq!(reclaimable, vec![only_g, s_g]);

    // Reclaimable archetypes stay cached and usable.
    let again = world.create_entity(&[g]).unwrap();
    assert_eq!(world.archetype_of(again).unwrap(), only_g);
    assert_eq!(world.reclaimable_archetypes(), vec![s_g]);
}

#[test]
fn relocation_moves_the_dependent_count() {
    let mut world = WorldRegistry::new();
    let s = world.register_component::<Speed>();
    world.register_component::<Velocity>();

    let e = world.create_entity(&[s]).unwrap();
    let only_s = world.archetype_of(e).unwrap();
    assert_eq!(world.archetype(only_s).unwrap().dependents(), 1);

    let s_v = world.add_component::<Velocity>(e).unwrap();
    // {s} keeps one dependent for the child it spawned.
    assert_eq!(world.archetype(only_s).unwrap().dependents(), 1);
    assert_eq!(world.archetype(s_v).unwrap().dependents(), 1);
}

#[test]
fn transitions_are_cached_in_both_directions() {
    let mut ids = IdAllocator::new();
    let mut registry = ComponentRegistry::new();
    let s = registry.register::<Speed>(&mut ids);
    let v = registry.register::<Velocity>(&mut ids);
    let mut graph = ArchetypeGraph::new(&mut ids, 16);

    let (only_s, created) = graph.add_node(&Signature::from_ids(&[s]), &registry, &mut ids).unwrap();
    assert_eq!(created, vec![only_s]);

    let (s_v, created) = graph.transition(only_s, v, Direction::Add, &registry, &mut ids).unwrap();
    assert_eq!(created, Some(s_v));
    assert_eq!(graph.get(only_s).unwrap().edge(v).unwrap().add, Some(s_v));
    assert_eq!(graph.get(s_v).unwrap().edge(v).unwrap().remove, Some(only_s));

    // Second traversal follows the cache.
    let (again, created) = graph.transition(only_s, v, Direction::Add, &registry, &mut ids).unwrap();
    assert_eq!((again, created), (s_v, None));
    let (back, created) = graph.transition(s_v, v, Direction::Remove, &registry, &mut ids).unwrap();
    assert_eq!((back, created), (only_s, None));

    // {v, s} built from the root resolves to the same archetype.
    let (same, created) = graph.add_node(&Signature::from_ids(&[v, s]), &registry, &mut ids).unwrap();
    assert_eq!(same, s_v);
    assert!(created.is_empty());
    assert_eq!(graph.len(), 3);
}

#[test]
fn removing_towards_unknown_parent_creates_it() {
    let mut ids = IdAllocator::new();
    let mut registry = ComponentRegistry::new();
    let s = registry.register::<Speed>(&mut ids);
    let v = registry.register::<Velocity>(&mut ids);
    let mut graph = ArchetypeGraph::new(&mut ids, 16);

    let (s_v, _) = graph.add_node(&Signature::from_ids(&[s, v]), &registry, &mut ids).unwrap();
    let (only_v, created) = graph.transition(s_v, s, Direction::Remove, &registry, &mut ids).unwrap();

    assert_eq!(created, Some(only_v));
    assert_eq!(graph.get(only_v).unwrap().signature().components(), &[v][..]);
    assert_eq!(graph.get(only_v).unwrap().edge(s).unwrap().add, Some(s_v));

    // The new parent is retained for its child; the child gains nothing.
    assert_eq!(graph.get(only_v).unwrap().dependents(), 1);
    assert_eq!(graph.get(s_v).unwrap().dependents(), 0);
    assert!(!graph.get(only_v).unwrap().is_reclaimable());
    assert!(graph.transition(only_v, s, Direction::Remove, &registry, &mut ids).is_err());
}

#[test]
fn linking_an_existing_child_retains_the_parent() {
    let mut world = WorldRegistry::new();
    let s = world.register_component::<Speed>();
    let g = world.register_component::<Gravity>();

    // {g} reaches {s, g} first; {s} is built afterwards and links to the
    // already existing {s, g}.
    let first = world.create_entity(&[g]).unwrap();
    world.add_component::<Speed>(first).unwrap();
    let second = world.create_entity(&[s, g]).unwrap();

    let only_s = world.get_archetype_id(&[s]).unwrap();
    let only_g = world.get_archetype_id(&[g]).unwrap();
    let s_g = world.get_archetype_id(&[s, g]).unwrap();
    assert_eq!(world.archetype(only_s).unwrap().edge(g).unwrap().add, Some(s_g));
    assert_eq!(world.archetype(only_s).unwrap().dependents(), 1);
    assert!(world.reclaimable_archetypes().is_empty());

    // Emptying {s, g} frees it, but never its parents.
    world.delete_entity(first).unwrap();
    world.delete_entity(second).unwrap();
    assert_eq!(world.reclaimable_archetypes(), vec![s_g]);
    assert!(world.archetype(only_s).unwrap().has_children());
    assert!(!world.archetype(only_g).unwrap().is_reclaimable());
}

#[test]
fn columns_follow_canonical_order() {
    let cfg = StoreConfig { column_capacity: 8, ..StoreConfig::default() };
    let mut world = WorldRegistry::with_config(cfg).unwrap();
    let s = world.register_component::<Speed>();
    let v = world.register_component::<Velocity>();
    let a = world.register_component::<Acceleration>();

    let id = world.register_archetype(&[a, s]).unwrap();
    let archetype = world.archetype(id).unwrap();
    assert_eq!(archetype.capacity(), 8);
    assert_eq!(archetype.column_value(s).unwrap(), 0);
    assert_eq!(archetype.column_value(a).unwrap(), 1);
    assert!(archetype.column_value(v).unwrap_err().is_not_found());

    let column = archetype.column(1).unwrap();
    assert_eq!(column.component_id(), a);
    assert_eq!(column.meta().size, std::mem::size_of::<Acceleration>());
    assert_eq!(column.capacity(), 8);
    assert!(column.is_empty());
}
