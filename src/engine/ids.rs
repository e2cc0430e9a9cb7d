//! Identifier allocation.
//!
//! Every store owns one [`IdAllocator`] with four independent counters, one
//! per identifier kind. Each counter is incremented *before* its value is
//! handed out, so the first id of every kind is `1` and `0` never names a
//! live object.
//!
//! Identifiers are never reused. Deleting an entity does not return its id to
//! the allocator.

use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    EntityID,
    SystemID,
};


/// Monotonic per-kind id source.

#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    component: ComponentID,
    entity: EntityID,
    archetype: ArchetypeID,
    system: SystemID,
}

impl IdAllocator {
    /// Creates an allocator with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next component id.
    #[inline]
    pub fn generate_component(&mut self) -> ComponentID {
        self.component += 1;
        self.component
    }

    /// Issues the next entity id.
    #[inline]
    pub fn generate_entity(&mut self) -> EntityID {
        self.entity += 1;
        self.entity
    }

    /// Issues the next archetype id.
    #[inline]
    pub fn generate_archetype(&mut self) -> ArchetypeID {
        self.archetype += 1;
        self.archetype
    }

    /// Issues the next system id.
    #[inline]
    pub fn generate_system(&mut self) -> SystemID {
        self.system += 1;
        self.system
    }

    /// Most recently issued entity id, or `0` if none was issued yet.
    #[inline]
    pub fn last_entity(&self) -> EntityID {
        self.entity
    }
}
