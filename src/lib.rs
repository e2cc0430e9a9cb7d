//! # World Registry
//!
//! Archetype-based entity/component store for dynamically typed entities.
//!
//! Entities sharing the same set of components live together in one
//! *archetype*, stored column by column. Archetypes are linked into a graph
//! by single-component transitions, so adding or removing a component moves
//! an entity along one cached edge.
//!
//! ## Design Goals
//! - Runtime component registration, one registry per store
//! - Dense columnar storage with swap-remove compaction
//! - Order-insensitive archetype identity
//! - Tick-driven systems over component subsets
//! - Explicit, typed errors instead of panics

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]
#![deny(dead_code)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::registry::WorldRegistry;

pub use engine::config::StoreConfig;

pub use engine::entity::{
    Entity,
    Record,
};

pub use engine::component::{
    Component,
    ComponentMeta,
};

pub use engine::archetype::{
    Archetype,
    ArchetypeEdge,
};

pub use engine::query::{
    RowView,
    SystemBuilder,
};

pub use engine::systems::{
    System,
    FnSystem,
};

pub use engine::commands::Command;

pub use engine::error::{
    ECSResult,
    ECSError,
    NotFound,
};

pub use engine::types::{
    Signature,
    EntityID,
    ComponentID,
    ArchetypeID,
    SystemID,
    Tick,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use world_registry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        WorldRegistry,
        StoreConfig,
        Entity,
        Command,
        RowView,
        ECSResult,
        ECSError,
        NotFound,
        ComponentID,
        SystemID,
    };
}
