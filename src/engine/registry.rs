//! Store orchestration.
//!
//! [`WorldRegistry`] is the public entry point of the crate. It owns every
//! subsystem and keeps them consistent:
//!
//! * the [`IdAllocator`] issuing component, entity, archetype and system ids,
//! * the [`ComponentRegistry`] mapping Rust types to component ids,
//! * the [`ArchetypeGraph`] owning archetypes and their columns,
//! * the [`EntityIndex`] locating each entity's row,
//! * the [`ComponentIndex`] locating each component's column per archetype,
//! * the [`Scheduler`] holding systems and their match caches,
//! * the deferred [`Command`] queue.
//!
//! ## Consistency
//!
//! Whenever the graph creates an archetype, the registry records its columns
//! in the component index and offers it to every system's match cache before
//! the archetype is used.
//!
//! Moving an entity between archetypes reserves the destination row first.
//! That is the only step that can fail for a consistent store, so a failed
//! move leaves the entity where it was with all its values.
//!
//! ## Example
//! ```ignore
//! let mut world = WorldRegistry::new();
//! let speed = world.register_component::<Speed>();
//! let velocity = world.register_component::<Velocity>();
//!
//! let entity = world.create_entity(&[velocity, speed])?;
//! world.attach_component(entity, Speed(2.0))?;
//! world.attach_component(entity, Velocity(1.0))?;
//!
//! world.system("accelerate").for_each2::<Speed, Velocity, _>(|s, v| s.0 += v.0)?;
//! world.tick()?;
//! ```

use crate::engine::archetype::Archetype;
use crate::engine::commands::Command;
use crate::engine::component::{
    Component,
    ComponentMeta,
    ComponentRegistry,
};

use crate::engine::config::StoreConfig;
use crate::engine::entity::{
    ComponentIndex,
    Entity,
    EntityIndex,
    Record,
};

use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::graph::ArchetypeGraph;
use crate::engine::ids::IdAllocator;
use crate::engine::query::{
    RowView,
    SystemBuilder,
};

use crate::engine::scheduler::{
    ScheduledSystem,
    Scheduler,
};

use crate::engine::storage::Column;
use crate::engine::systems::FnSystem;
use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    Direction,
    EntityID,
    RowID,
    Signature,
    SystemID,
    Tick,
};


/// An in-process entity/component store.
///
/// ## Invariants
/// * Every live entity has exactly one record, and that record points at a
///   row of its archetype whose `entities` entry is the entity itself.
/// * For every archetype `a` and component `c` of `a`,
///   `component_index.column_of(c, a) == a.column_value(c)`.
/// * Every system's match cache lists exactly the archetypes whose signature
///   contains the system signature.

pub struct WorldRegistry {
    config: StoreConfig,
    ids: IdAllocator,
    components: ComponentRegistry,
    graph: ArchetypeGraph,
    entities: EntityIndex,
    component_index: ComponentIndex,
    scheduler: Scheduler,
    deferred: Vec<Command>,
    tick: Tick,
}

impl Default for WorldRegistry {
    fn default() -> Self {
        Self::build(StoreConfig::default())
    }
}

impl WorldRegistry {

    /// Creates a store with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a validated configuration.
    ///
    /// ## Errors
    /// `InvalidConfig` or `InvalidTickInterval` if `config` is out of range.

    pub fn with_config(config: StoreConfig) -> ECSResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        let mut ids = IdAllocator::new();
        let graph = ArchetypeGraph::new(&mut ids, config.column_capacity);
        Self {
            config,
            ids,
            components: ComponentRegistry::new(),
            graph,
            entities: EntityIndex::new(),
            component_index: ComponentIndex::new(),
            scheduler: Scheduler::new(),
            deferred: Vec::new(),
            tick: 0,
        }
    }

    /// Configuration the store was built with.
    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Registers `T` and returns its id. Idempotent.
    pub fn register_component<T: Component>(&mut self) -> ComponentID {
        self.components.register::<T>(&mut self.ids)
    }

    /// Id of a registered type.
    pub fn get_component_id<T: Component>(&self) -> ECSResult<ComponentID> {
        self.components.lookup::<T>()
    }

    /// Metadata of a registered component.
    pub fn component_meta(&self, component_id: ComponentID) -> ECSResult<&ComponentMeta> {
        self.components.meta(component_id)
    }

    /// Number of registered component types.
    #[inline]
    pub fn count_components(&self) -> usize {
        self.components.len()
    }

    // ---------------------------------------------------------------------
    // Archetypes
    // ---------------------------------------------------------------------

    /// Builds (or finds) the archetype for a component set.
    pub fn register_archetype(&mut self, component_ids: &[ComponentID]) -> ECSResult<ArchetypeID> {
        let signature = self.components.resolve_signature(component_ids)?;
        self.ensure_archetype(&signature)
    }

    /// Id of the archetype for a component set, in any order.
    ///
    /// ## Errors
    /// `NotFound` if no entity or registration has built it yet.

    pub fn get_archetype_id(&self, component_ids: &[ComponentID]) -> ECSResult<ArchetypeID> {
        let signature = self.components.resolve_signature(component_ids)?;
        self.graph
            .find(&signature)
            .ok_or(NotFound::ArchetypeForSignature.into())
    }

    /// Returns an archetype by id.
    pub fn archetype(&self, archetype_id: ArchetypeID) -> ECSResult<&Archetype> {
        self.graph.get(archetype_id)
    }

    /// Number of archetypes, root included.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.graph.len()
    }

    /// Edge components of every archetype reachable from the root; see
    /// [`ArchetypeGraph::dependency_graph`].
    pub fn get_dependency_graph(&self) -> Vec<ComponentID> {
        self.graph.dependency_graph()
    }

    /// Archetypes nothing depends on any more.
    pub fn reclaimable_archetypes(&self) -> Vec<ArchetypeID> {
        self.graph.reclaimable()
    }

    fn ensure_archetype(&mut self, signature: &Signature) -> ECSResult<ArchetypeID> {
        let (archetype_id, created) = self.graph.add_node(signature, &self.components, &mut self.ids)?;
        self.index_archetypes(&created)?;
        Ok(archetype_id)
    }

    fn index_archetypes(&mut self, created: &[ArchetypeID]) -> ECSResult<()> {
        for &archetype_id in created {
            let archetype = self.graph.get(archetype_id)?;
            self.component_index.insert_archetype(archetype);
            self.scheduler.on_archetype_created(archetype);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Creates an entity with the given components, all vacant.
    ///
    /// ## Errors
    /// - `InvalidSignature` for an empty list.
    /// - `NotFound` for an unregistered component.
    /// - `CapacityExceeded` if the archetype is full; no id is consumed.

    pub fn create_entity(&mut self, component_ids: &[ComponentID]) -> ECSResult<Entity> {
        let signature = self.components.resolve_signature(component_ids)?;
        let archetype_id = self.ensure_archetype(&signature)?;

        let archetype = self.graph.get_mut(archetype_id)?;
        archetype.ensure_room()?;
        let entity = Entity(self.ids.generate_entity());
        let row = archetype.assign_row(entity)?;
        archetype.retain();

        self.entities.insert(entity, Record { archetype: archetype_id, row });
        tracing::trace!(%entity, archetype_id, row, "created entity");
        Ok(entity)
    }

    /// Deletes an entity, dropping its values.
    pub fn delete_entity(&mut self, entity: Entity) -> ECSResult<()> {
        let record = self.entities.get(entity)?;
        let archetype = self.graph.get_mut(record.archetype)?;
        let moved = archetype.swap_remove_row(record.row)?;
        archetype.release();

        self.entities.remove(entity)?;
        if let Some(moved) = moved {
            self.entities.set_row(moved, record.row)?;
        }
        tracing::trace!(%entity, archetype_id = record.archetype, "deleted entity");
        Ok(())
    }

    /// Returns `true` if `entity` is alive.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Most recently issued entity id, `0` before the first entity.
    #[inline]
    pub fn get_id(&self) -> EntityID {
        self.ids.last_entity()
    }

    /// Archetype holding `entity`.
    pub fn archetype_of(&self, entity: Entity) -> ECSResult<ArchetypeID> {
        Ok(self.entities.get(entity)?.archetype)
    }

    /// Component set of `entity`.
    pub fn signature_of(&self, entity: Entity) -> ECSResult<&Signature> {
        let record = self.entities.get(entity)?;
        Ok(self.graph.get(record.archetype)?.signature())
    }

    // ---------------------------------------------------------------------
    // Component values
    // ---------------------------------------------------------------------

    /// Writes a value of registered type `T` for `entity`.
    pub fn attach_component<T: Component>(&mut self, entity: Entity, value: T) -> ECSResult<()> {
        let component_id = self.get_component_id::<T>()?;
        self.attach_component_by_id(entity, component_id, value)
    }

    /// Writes a value for `entity` under an explicit component id.
    ///
    /// ## Errors
    /// - `NotFound` if the entity is unknown or its archetype lacks the
    ///   component.
    /// - `TypeMismatch` if `T` is not the type registered under the id.

    pub fn attach_component_by_id<T: Component>(
        &mut self,
        entity: Entity,
        component_id: ComponentID,
        value: T,
    ) -> ECSResult<()> {
        let (column, row) = self.column_mut_for(entity, component_id)?;
        column.insert(row, value)
    }

    /// Reads the value of `T` for `entity`.
    pub fn get_component<T: Component>(&self, entity: Entity) -> ECSResult<&T> {
        let component_id = self.get_component_id::<T>()?;
        self.get_component_by_id(entity, component_id)
    }

    /// Reads a value by component id.
    ///
    /// ## Errors
    /// `NotFound` if the entity is unknown, its archetype lacks the
    /// component, or no value was attached yet.

    pub fn get_component_by_id<T: Component>(&self, entity: Entity, component_id: ComponentID) -> ECSResult<&T> {
        let (column, row) = self.column_for(entity, component_id)?;
        column.get(row).map_err(|e| vacant_as_value(e, entity, component_id))
    }

    /// Mutably reads the value of `T` for `entity`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> ECSResult<&mut T> {
        let component_id = self.get_component_id::<T>()?;
        self.get_component_by_id_mut(entity, component_id)
    }

    /// Mutably reads a value by component id.
    pub fn get_component_by_id_mut<T: Component>(
        &mut self,
        entity: Entity,
        component_id: ComponentID,
    ) -> ECSResult<&mut T> {
        let (column, row) = self.column_mut_for(entity, component_id)?;
        column.get_mut(row).map_err(|e| vacant_as_value(e, entity, component_id))
    }

    fn column_for(&self, entity: Entity, component_id: ComponentID) -> ECSResult<(&Column, RowID)> {
        let record = self.entities.get(entity)?;
        let index = self.component_index.column_of(component_id, record.archetype)?;
        let column = self
            .graph
            .get(record.archetype)?
            .column(index)
            .ok_or(NotFound::Component(component_id))?;
        Ok((column, record.row))
    }

    fn column_mut_for(&mut self, entity: Entity, component_id: ComponentID) -> ECSResult<(&mut Column, RowID)> {
        let record = self.entities.get(entity)?;
        let index = self.component_index.column_of(component_id, record.archetype)?;
        let column = self
            .graph
            .get_mut(record.archetype)?
            .column_mut(index)
            .ok_or(NotFound::Component(component_id))?;
        Ok((column, record.row))
    }

    // ---------------------------------------------------------------------
    // Structural changes
    // ---------------------------------------------------------------------

    /// Adds component `T` to `entity`, relocating it. The new slot is vacant.
    pub fn add_component<T: Component>(&mut self, entity: Entity) -> ECSResult<ArchetypeID> {
        let component_id = self.get_component_id::<T>()?;
        self.add_component_by_id(entity, component_id)
    }

    /// Adds a component by id. Adding a component the entity already has
    /// leaves it in place.
    pub fn add_component_by_id(&mut self, entity: Entity, component_id: ComponentID) -> ECSResult<ArchetypeID> {
        self.relocate(entity, component_id, Direction::Add)
    }

    /// Removes component `T` from `entity`, dropping its value.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> ECSResult<ArchetypeID> {
        let component_id = self.get_component_id::<T>()?;
        self.remove_component_by_id(entity, component_id)
    }

    /// Removes a component by id.
    ///
    /// Removing the last component moves the entity into the root archetype;
    /// it stays alive with an empty component set.
    pub fn remove_component_by_id(&mut self, entity: Entity, component_id: ComponentID) -> ECSResult<ArchetypeID> {
        self.relocate(entity, component_id, Direction::Remove)
    }

    /// Moves `entity` across one edge of the graph.
    ///
    /// ## Steps
    /// 1. Resolve (or create) the destination through the graph.
    /// 2. Reserve the destination row; values move only after this succeeds.
    /// 3. Move shared values, drop the removed one, retire the source row.
    /// 4. Update the entity's record and the record of any swap-moved entity.
    /// 5. Move the dependent count from source to destination.

    fn relocate(&mut self, entity: Entity, component_id: ComponentID, direction: Direction) -> ECSResult<ArchetypeID> {
        if !self.components.contains(component_id) {
            return Err(NotFound::Component(component_id).into());
        }
        let record = self.entities.get(entity)?;

        let (destination_id, created) = self.graph.transition(
            record.archetype,
            component_id,
            direction,
            &self.components,
            &mut self.ids,
        )?;
        if let Some(created) = created {
            self.index_archetypes(&[created])?;
        }
        if destination_id == record.archetype {
            return Ok(destination_id);
        }

        let (source, destination) = self.graph.pair_mut(record.archetype, destination_id)?;
        let (row, moved) = source.move_row_into(record.row, destination)?;
        destination.retain();
        source.release();

        self.entities.set(entity, Record { archetype: destination_id, row })?;
        if let Some(moved) = moved {
            self.entities.set_row(moved, record.row)?;
        }

        tracing::trace!(
            %entity,
            component_id,
            ?direction,
            from = record.archetype,
            to = destination_id,
            "relocated entity"
        );
        Ok(destination_id)
    }

    // ---------------------------------------------------------------------
    // Deferred commands
    // ---------------------------------------------------------------------

    /// Queues a structural command.
    pub fn defer(&mut self, command: Command) {
        self.deferred.push(command);
    }

    /// Number of queued commands.
    #[inline]
    pub fn pending_commands(&self) -> usize {
        self.deferred.len()
    }

    /// Applies every queued command in order.
    ///
    /// ## Behavior
    /// - A command failing with `NotFound` (typically an entity deleted by an
    ///   earlier command) is logged and skipped.
    /// - Any other failure stops application; the unapplied commands stay
    ///   queued and the error is returned.
    ///
    /// ## Returns
    /// The number of commands applied.

    pub fn apply_deferred_commands(&mut self) -> ECSResult<usize> {
        let mut queue = std::mem::take(&mut self.deferred).into_iter();
        let mut applied = 0;

        while let Some(command) = queue.next() {
            let target = command.target();
            match self.apply_command(command) {
                Ok(()) => applied += 1,
                Err(error) if error.is_not_found() => {
                    tracing::warn!(target_entity = ?target, %error, "skipped deferred command");
                }
                Err(error) => {
                    let mut rest: Vec<Command> = queue.by_ref().collect();
                    rest.append(&mut self.deferred);
                    self.deferred = rest;
                    return Err(error);
                }
            }
        }
        Ok(applied)
    }

    fn apply_command(&mut self, command: Command) -> ECSResult<()> {
        match command {
            Command::CreateEntity { components } => {
                self.create_entity(&components)?;
            }
            Command::Delete { entity } => {
                self.delete_entity(entity)?;
            }
            Command::AddComponent { entity, component_id, value } => {
                self.add_component_by_id(entity, component_id)?;
                if let Some(value) = value {
                    let (column, row) = self.column_mut_for(entity, component_id)?;
                    value.write_into(column, row)?;
                }
            }
            Command::RemoveComponent { entity, component_id } => {
                self.remove_component_by_id(entity, component_id)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Systems
    // ---------------------------------------------------------------------

    /// Starts building a named system.
    pub fn system(&mut self, name: impl Into<String>) -> SystemBuilder<'_> {
        SystemBuilder::new(self, name)
    }

    /// Registers a per-row callback over the entities having every component
    /// of `component_ids`, run every `tick_interval` ticks.
    ///
    /// ## Errors
    /// - `InvalidSignature` for an empty list.
    /// - `NotFound` for an unregistered component.
    /// - `InvalidTickInterval` for an interval of zero.

    pub fn register_system<F>(
        &mut self,
        component_ids: &[ComponentID],
        callback: F,
        tick_interval: Tick,
    ) -> ECSResult<SystemID>
    where
        F: FnMut(&mut RowView<'_>) + Send + 'static,
    {
        self.insert_system(None, component_ids, callback, Some(tick_interval))
    }

    /// Registers a callback under a unique `name`.
    ///
    /// `tick_interval` defaults to the configured one.
    ///
    /// ## Errors
    /// As [`register_system`](Self::register_system), plus
    /// `DuplicateRegistration` if `name` is taken.

    pub fn register_named_system<F>(
        &mut self,
        name: &str,
        component_ids: &[ComponentID],
        callback: F,
        tick_interval: Option<Tick>,
    ) -> ECSResult<SystemID>
    where
        F: FnMut(&mut RowView<'_>) + Send + 'static,
    {
        self.insert_system(Some(name), component_ids, callback, tick_interval)
    }

    fn insert_system<F>(
        &mut self,
        name: Option<&str>,
        component_ids: &[ComponentID],
        callback: F,
        tick_interval: Option<Tick>,
    ) -> ECSResult<SystemID>
    where
        F: FnMut(&mut RowView<'_>) + Send + 'static,
    {
        let signature = self.components.resolve_signature(component_ids)?;
        let tick_interval = tick_interval.unwrap_or(self.config.default_tick_interval);
        if tick_interval == 0 {
            return Err(ECSError::InvalidTickInterval);
        }
        if let Some(existing) = name.and_then(|n| self.scheduler.id_by_name(n)) {
            return Err(ECSError::DuplicateRegistration { name: name.unwrap_or_default().to_owned(), existing });
        }

        let system_id = self.ids.generate_system();
        let name = match name {
            Some(name) => name.to_owned(),
            None => format!("system-{system_id}"),
        };
        let system = FnSystem::new(system_id, name, signature, callback);
        self.scheduler.register(Box::new(system), tick_interval, &self.graph)
    }

    /// Stops a system from running and from advancing its counter.
    pub fn disable_system(&mut self, system_id: SystemID) -> ECSResult<()> {
        self.scheduler.set_enabled(system_id, false)
    }

    /// Re-enables a system.
    pub fn enable_system(&mut self, system_id: SystemID) -> ECSResult<()> {
        self.scheduler.set_enabled(system_id, true)
    }

    /// Whether a system takes part in ticks.
    pub fn is_system_enabled(&self, system_id: SystemID) -> ECSResult<bool> {
        Ok(self.scheduler.get(system_id)?.is_enabled())
    }

    /// Scheduling state of a system: its interval and matched archetypes.
    pub fn scheduled_system(&self, system_id: SystemID) -> ECSResult<&ScheduledSystem> {
        self.scheduler.get(system_id)
    }

    /// Number of registered systems.
    #[inline]
    pub fn system_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Number of ticks run so far.
    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Advances the store by one tick.
    ///
    /// ## Behavior
    /// 1. Applies commands queued outside of systems.
    /// 2. Visits systems in registration order. Each enabled system advances
    ///    its counter and runs when the counter reaches its interval.
    /// 3. After each run, applies the commands the system recorded, so later
    ///    systems observe the changes.

    pub fn tick(&mut self) -> ECSResult<()> {
        self.tick += 1;
        let _span = tracing::debug_span!("tick", tick = self.tick).entered();

        self.apply_deferred_commands()?;

        let mut ran = 0;
        let mut rows = 0;
        for system_id in self.scheduler.ids() {
            if !self.scheduler.advance(system_id)? {
                continue;
            }
            rows += self.scheduler.run(system_id, &mut self.graph, &self.component_index, &mut self.deferred)?;
            self.apply_deferred_commands()?;
            ran += 1;
        }

        tracing::debug!(ran, rows, "tick finished");
        Ok(())
    }
}

fn vacant_as_value(error: ECSError, entity: Entity, component: ComponentID) -> ECSError {
    match error {
        ECSError::NotFound(NotFound::Row { .. }) => NotFound::Value { entity, component }.into(),
        other => other,
    }
}
