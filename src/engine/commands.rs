//! # Commands
//!
//! Deferred structural mutations of the store.
//!
//! ## Purpose
//! System callbacks only see component values of the row they are visiting,
//! so they cannot create, delete or relocate entities directly. Instead they
//! record [`Command`] values which the
//! [`WorldRegistry`](crate::engine::registry::WorldRegistry) applies once the
//! system has finished iterating.
//!
//! ## Invariants
//! - Commands are applied in the order they were recorded.
//! - A command whose target entity vanished before it was applied is skipped.

use std::fmt;

use crate::engine::component::Component;
use crate::engine::entity::Entity;
use crate::engine::error::ECSResult;
use crate::engine::storage::Column;
use crate::engine::types::{
    ComponentID,
    RowID,
};


/// A component value waiting to be written into a column.
///
/// The concrete type is captured at construction, so the write stays type
/// checked by the destination [`Column`].

pub struct ComponentValue {
    write: Box<dyn FnOnce(&mut Column, RowID) -> ECSResult<()> + Send>,
}

impl ComponentValue {
    /// Wraps `value` for a deferred write.
    pub fn new<T: Component>(value: T) -> Self {
        Self { write: Box::new(move |column: &mut Column, row| column.insert(row, value)) }
    }

    /// Writes the value at `row` of `column`.
    pub fn write_into(self, column: &mut Column, row: RowID) -> ECSResult<()> {
        (self.write)(column, row)
    }
}

impl fmt::Debug for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentValue(..)")
    }
}

/// Represents a deferred store mutation.

#[derive(Debug)]
pub enum Command {
    /// Creates an entity with the given component set.
    CreateEntity {
        /// Components of the new entity, in any order.
        components: Vec<ComponentID>,
    },

    /// Deletes an entity and retires its row.
    Delete {
        /// Entity to remove.
        entity: Entity,
    },

    /// Adds a component to an entity, relocating it.
    ///
    /// ## Behavior
    /// - If the entity already has the component, no relocation happens.
    /// - `value`, when present, is written into the destination row.
    AddComponent {
        /// Target entity.
        entity: Entity,
        /// Component to add.
        component_id: ComponentID,
        /// Optional value to attach after the move.
        value: Option<ComponentValue>,
    },

    /// Removes a component from an entity, relocating it.
    ///
    /// The removed value is dropped.
    RemoveComponent {
        /// Target entity.
        entity: Entity,
        /// Component to remove.
        component_id: ComponentID,
    },
}

impl Command {
    /// `CreateEntity` for `components`.
    pub fn create(components: &[ComponentID]) -> Self {
        Command::CreateEntity { components: components.to_vec() }
    }

    /// `Delete` for `entity`.
    pub fn delete(entity: Entity) -> Self {
        Command::Delete { entity }
    }

    /// `AddComponent` carrying a value.
    pub fn add<T: Component>(entity: Entity, component_id: ComponentID, value: T) -> Self {
        Command::AddComponent { entity, component_id, value: Some(ComponentValue::new(value)) }
    }

    /// `AddComponent` that leaves the new slot vacant.
    pub fn add_empty(entity: Entity, component_id: ComponentID) -> Self {
        Command::AddComponent { entity, component_id, value: None }
    }

    /// `RemoveComponent` for `entity`.
    pub fn remove(entity: Entity, component_id: ComponentID) -> Self {
        Command::RemoveComponent { entity, component_id }
    }

    /// Entity targeted by the command, if any.
    pub fn target(&self) -> Option<Entity> {
        match self {
            Command::CreateEntity { .. } => None,
            Command::Delete { entity }
            | Command::AddComponent { entity, .. }
            | Command::RemoveComponent { entity, .. } => Some(*entity),
        }
    }
}
