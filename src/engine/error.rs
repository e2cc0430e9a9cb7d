//! Error types for the entity/component store.
//!
//! Every fallible operation of the store returns [`ECSResult`]. Failures are
//! reported through a single aggregate, [`ECSError`], whose variants carry
//! enough structured context to make logs actionable without reproducing the
//! issue.
//!
//! ## Kinds
//! * [`ECSError::NotFound`]: an entity, component, archetype, system or value
//!   is unknown. The payload ([`NotFound`]) says *what* was missing.
//! * [`ECSError::CapacityExceeded`]: a column has no free rows left.
//! * [`ECSError::DuplicateRegistration`]: a name was registered twice.
//! * [`ECSError::InvalidSignature`]: a component list was empty or malformed.
//! * [`ECSError::TypeMismatch`]: a typed access disagreed with the stored type.
//! * [`ECSError::InvalidTickInterval`]: a system interval of zero.
//!
//! ## Typical flow
//! Column and archetype code returns these errors directly; the
//! [`WorldRegistry`](crate::engine::registry::WorldRegistry) propagates them
//! with `?`. Callers that treat a miss as an empty result can use
//! [`ECSError::is_not_found`]:
//!
//! ```ignore
//! match world.get_component::<Speed>(entity) {
//!     Ok(speed) => println!("speed = {}", speed.0),
//!     Err(e) if e.is_not_found() => println!("no speed yet"),
//!     Err(e) => return Err(e),
//! }
//! ```

use thiserror::Error;

use crate::engine::entity::Entity;
use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    SystemID,
};


/// Describes which lookup missed.
///
/// ### Variants
/// * `Entity` - the entity was never created or has been deleted.
/// * `Component` - the component id is not registered, or the archetype does
///   not contain it.
/// * `ComponentType` - the Rust type was never registered.
/// * `Archetype` - no archetype exists for the id.
/// * `ArchetypeForSignature` - no archetype was built for a component set.
/// * `System` - the system id is unknown.
/// * `Row` - a column slot is vacant or beyond the assigned rows.
/// * `ArchetypeRow` - an archetype row index past the last row.
/// * `Value` - the entity's archetype contains the component but no value was
///   attached to the entity's row yet.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFound {
    /// Unknown or deleted entity.
    #[error("entity {0} not found")]
    Entity(Entity),

    /// Unknown component id, or component absent from an archetype.
    #[error("component {0} not found")]
    Component(ComponentID),

    /// Rust type never registered as a component.
    #[error("component type `{0}` is not registered")]
    ComponentType(&'static str),

    /// Unknown archetype.
    #[error("archetype {0} not found")]
    Archetype(ArchetypeID),

    /// No archetype has been built for a component set.
    #[error("no archetype exists for the requested component set")]
    ArchetypeForSignature,

    /// Unknown system.
    #[error("system {0} not found")]
    System(SystemID),

    /// A column slot is vacant or out of range.
    #[error("component {component} has no value at row {row}")]
    Row {
        /// Component stored by the column.
        component: ComponentID,

        /// Row that was read.
        row: usize,
    },

    /// An archetype row index past the last row.
    #[error("archetype {archetype} has no row {row}")]
    ArchetypeRow {
        /// Archetype that was indexed.
        archetype: ArchetypeID,

        /// Row that was requested.
        row: usize,
    },

    /// The slot exists but has not been written.
    #[error("entity {entity} has no value for component {component}")]
    Value {
        /// Entity whose row was read.
        entity: Entity,

        /// Component whose slot is vacant.
        component: ComponentID,
    },
}

/// Aggregate error for every store operation.

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ECSError {
    /// A lookup missed.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A column is full.
    #[error("column for component {component} is full (capacity {capacity})")]
    CapacityExceeded {
        /// Component whose column ran out of rows.
        component: ComponentID,

        /// Fixed row capacity of the column.
        capacity: usize,
    },

    /// A name was registered twice.
    #[error("`{name}` is already registered with id {existing}")]
    DuplicateRegistration {
        /// Name that was reused.
        name: String,

        /// Id issued for the first registration.
        existing: u64,
    },

    /// A component list cannot form a signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A typed access used the wrong Rust type.
    #[error("type mismatch: expected `{expected}`, got `{actual}`")]
    TypeMismatch {
        /// Type stored by the column.
        expected: &'static str,

        /// Type requested by the caller.
        actual: &'static str,
    },

    /// A system was registered with a zero tick interval.
    #[error("tick interval must be at least 1")]
    InvalidTickInterval,

    /// A configuration value is out of range or unparsable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ECSError {
    /// Returns `true` for every [`ECSError::NotFound`] variant.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ECSError::NotFound(_))
    }
}

/// Result alias used across the store.
pub type ECSResult<T> = Result<T, ECSError>;
