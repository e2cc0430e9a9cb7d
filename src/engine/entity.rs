//! Entity handles and the two indices that locate data.
//!
//! * [`EntityIndex`] answers "where does this entity live": its archetype and
//!   row.
//! * [`ComponentIndex`] answers "which column holds this component inside
//!   that archetype".

use std::collections::HashMap;
use std::fmt;

use crate::engine::archetype::Archetype;
use crate::engine::error::{
    ECSResult,
    NotFound,
};

use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    EntityID,
    RowID,
};

/// Opaque handle of an entity.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Entity(pub EntityID);

impl Entity {
    /// Raw id.
    #[inline]
    pub fn id(self) -> EntityID {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityID> for Entity {
    fn from(id: EntityID) -> Self {
        Entity(id)
    }
}

/// Where an entity's row lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// Archetype holding the entity.
    pub archetype: ArchetypeID,
    /// Row inside that archetype.
    pub row: RowID,
}

/// Entity -> record mapping for every live entity.
#[derive(Debug, Default)]
pub struct EntityIndex {
    records: HashMap<Entity, Record>,
}

impl EntityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a live entity.
    #[inline]
    pub fn get(&self, entity: Entity) -> ECSResult<Record> {
        self.records.get(&entity).copied().ok_or(NotFound::Entity(entity).into())
    }

    /// Returns `true` if `entity` is alive.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Records a newly created entity.
    pub fn insert(&mut self, entity: Entity, record: Record) {
        self.records.insert(entity, record);
    }

    /// Overwrites the record of a live entity.
    pub fn set(&mut self, entity: Entity, record: Record) -> ECSResult<()> {
        let slot = self.records.get_mut(&entity).ok_or(NotFound::Entity(entity))?;
        *slot = record;
        Ok(())
    }

    /// Points a swap-moved entity at its new row.
    pub fn set_row(&mut self, entity: Entity, row: RowID) -> ECSResult<()> {
        let slot = self.records.get_mut(&entity).ok_or(NotFound::Entity(entity))?;
        slot.row = row;
        Ok(())
    }

    /// Forgets a deleted entity and returns its last record.
    pub fn remove(&mut self, entity: Entity) -> ECSResult<Record> {
        self.records.remove(&entity).ok_or(NotFound::Entity(entity).into())
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entity is alive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Component -> (archetype -> column index).
///
/// ## Invariants
/// - For every archetype `a` containing component `c`,
///   `map[c][a] == a.column_value(c)`.
/// - Entries are only added, never removed, since archetypes stay cached.
#[derive(Debug, Default)]
pub struct ComponentIndex {
    map: HashMap<ComponentID, HashMap<ArchetypeID, usize>>,
}

impl ComponentIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the column of every component of `archetype`.
    pub fn insert_archetype(&mut self, archetype: &Archetype) {
        for component_id in archetype.signature().iter() {
            if let Ok(column) = archetype.column_value(component_id) {
                self.map.entry(component_id).or_default().insert(archetype.id(), column);
            }
        }
    }

    /// Column of `component_id` inside `archetype_id`.
    pub fn column_of(&self, component_id: ComponentID, archetype_id: ArchetypeID) -> ECSResult<usize> {
        self.map
            .get(&component_id)
            .and_then(|archetypes| archetypes.get(&archetype_id))
            .copied()
            .ok_or(NotFound::Component(component_id).into())
    }
}
