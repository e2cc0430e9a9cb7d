use world_registry::engine::error::ECSError;
use world_registry::engine::types::{DEFAULT_COLUMN_CAPACITY, DEFAULT_TICK_INTERVAL};
use world_registry::{StoreConfig, WorldRegistry};

#[test]
fn defaults_fill_missing_keys() {
    let cfg = StoreConfig::from_toml_str("column_capacity = 64\n").unwrap();
    assert_eq!(cfg.column_capacity, 64);
    assert_eq!(cfg.default_tick_interval, DEFAULT_TICK_INTERVAL);

    let empty = StoreConfig::from_toml_str("").unwrap();
    assert_eq!(empty, StoreConfig::default());
    assert_eq!(empty.column_capacity, DEFAULT_COLUMN_CAPACITY);
}

#[test]
fn toml_text_round_trips() {
    let cfg = StoreConfig { column_capacity: 512, default_tick_interval: 4 };
    let text = cfg.to_toml_string().unwrap();
    assert_eq!(StoreConfig::from_toml_str(&text).unwrap(), cfg);
}

#[test]
fn out_of_range_values_are_rejected() {
    assert!(matches!(
        StoreConfig::from_toml_str("column_capacity = 0"),
        Err(ECSError::InvalidConfig(_))
    ));
    assert_eq!(
        StoreConfig::from_toml_str("default_tick_interval = 0").unwrap_err(),
        ECSError::InvalidTickInterval
    );
    assert!(matches!(
        StoreConfig::from_toml_str("capacity = 10"),
        Err(ECSError::InvalidConfig(_))
    ));
    assert!(matches!(
        StoreConfig::from_toml_str("column_capacity = \"lots\""),
        Err(ECSError::InvalidConfig(_))
    ));

    let bad = StoreConfig { column_capacity: 0, ..StoreConfig::default() };
    assert!(WorldRegistry::with_config(bad).is_err());
}

#[test]
fn builder_systems_use_the_configured_interval() {
    #[derive(Debug)]
    struct Counter(u32);

    let cfg = StoreConfig::from_toml_str("default_tick_interval = 2").unwrap();
    let mut world = WorldRegistry::with_config(cfg).unwrap();
    let counter = world.register_component::<Counter>();
    let e = world.create_entity(&[counter]).unwrap();
    world.attach_component(e, Counter(0)).unwrap();

    world.system("count").for_each1::<Counter, _>(|c| c.0 += 1).unwrap();
    for _ in 0..4 {
        world.tick().unwrap();
    }
    assert_eq!(world.get_component::<Counter>(e).unwrap().0, 2);
}
