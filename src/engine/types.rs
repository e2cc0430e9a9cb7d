//! Core Identifiers and Signatures
//!
//! This module defines the **fundamental identifiers and the canonical
//! component signature** shared by every subsystem of the store: the type
//! registry, column storage, the archetype graph, the entity index and the
//! system scheduler.
//!
//! ## Identifiers
//!
//! All identifiers are plain 64-bit integers issued by the
//! [`IdAllocator`](crate::engine::ids::IdAllocator). They are:
//!
//! - monotonically increasing per kind,
//! - never reused within the lifetime of a store,
//! - copyable and cheap to hash.
//!
//! Entities are wrapped in the [`Entity`](crate::engine::entity::Entity)
//! handle so that an entity id cannot be passed where a component id is
//! expected.
//!
//! ## Signatures
//!
//! A [`Signature`] is the set of components that make up an archetype (or
//! that a system operates on). Internally it is kept **canonical**: sorted by
//! `ComponentID` with duplicates removed. Two signatures describe the same
//! archetype exactly when they compare equal, regardless of the order in which
//! callers listed the components.
//!
//! The canonical order is also the column order of an archetype, so the
//! position of a component inside a signature is the index of its column.

use std::fmt;


/// Unique identifier for a registered component type.
pub type ComponentID = u64;

/// Unique identifier for an archetype.
pub type ArchetypeID = u64;

/// Raw identifier of an entity.
pub type EntityID = u64;

/// Unique identifier for a registered system.
pub type SystemID = u64;

/// Row index inside an archetype.
pub type RowID = usize;

/// Simulation tick counter.
pub type Tick = u64;

/// Default per-column row capacity.
pub const DEFAULT_COLUMN_CAPACITY: usize = 100_000;

/// Default tick interval applied to systems registered without one.
pub const DEFAULT_TICK_INTERVAL: Tick = 1;

/// Canonical set of components.
///
/// ## Invariants
/// - `components` is strictly ascending (sorted, no duplicates).
/// - Equality and hashing are therefore set-based.

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    components: Vec<ComponentID>,
}

impl Signature {
    /// The empty signature (the archetype graph root).
    #[inline]
    pub fn empty() -> Self {
        Self { components: Vec::new() }
    }

    /// Builds a canonical signature from component ids in any order.
    ///
    /// Duplicate ids collapse into one entry.
    pub fn from_ids(component_ids: &[ComponentID]) -> Self {
        let mut components = component_ids.to_vec();
        components.sort_unstable();
        components.dedup();
        Self { components }
    }

    /// Returns the canonical component sequence.
    #[inline]
    pub fn components(&self) -> &[ComponentID] {
        &self.components
    }

    /// Number of components in the signature.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` for the empty signature.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` if `component_id` is part of this signature.
    #[inline]
    pub fn has(&self, component_id: ComponentID) -> bool {
        self.components.binary_search(&component_id).is_ok()
    }

    /// Position of `component_id` in canonical order, if present.
    #[inline]
    pub fn position(&self, component_id: ComponentID) -> Option<usize> {
        self.components.binary_search(&component_id).ok()
    }

    /// Returns `true` if every component of `other` is present in `self`.
    pub fn contains_all(&self, other: &Signature) -> bool {
        other.components.iter().all(|&c| self.has(c))
    }

    /// Returns a copy of this signature with `component_id` added.
    pub fn with(&self, component_id: ComponentID) -> Signature {
        let mut components = self.components.clone();
        if let Err(index) = components.binary_search(&component_id) {
            components.insert(index, component_id);
        }
        Signature { components }
    }

    /// Returns a copy of this signature with `component_id` removed.
    pub fn without(&self, component_id: ComponentID) -> Signature {
        let mut components = self.components.clone();
        if let Ok(index) = components.binary_search(&component_id) {
            components.remove(index);
        }
        Signature { components }
    }

    /// Iterates over the components in canonical order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = ComponentID> + '_ {
        self.components.iter().copied()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, component_id) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{component_id}")?;
        }
        f.write_str("}")
    }
}

/// Direction of a single-component archetype transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The destination has one more component.
    Add,
    /// The destination has one component fewer.
    Remove,
}
