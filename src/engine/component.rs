//! # Component Registry
//!
//! This module assigns stable `ComponentID` values to Rust component types and
//! records the metadata column storage needs to hold them as raw bytes.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name, size,
//! alignment, drop glue) from runtime storage, so archetypes can hold
//! heterogeneous component columns as type-erased byte arenas.
//!
//! ## Design
//! - Every [`WorldRegistry`](crate::engine::registry::WorldRegistry) owns one
//!   registry. There is no process-global state, so independent stores never
//!   share ids.
//! - Ids are drawn from the store's
//!   [`IdAllocator`](crate::engine::ids::IdAllocator).
//! - Each registered type carries a [`ComponentMeta`] with a monomorphized
//!   drop function, which columns call when a value is overwritten or removed.
//!
//! ## Invariants
//! - Registering the same type twice returns the same id.
//! - Every entry in `by_type` has a matching `by_id` entry.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt,
    mem::{align_of, needs_drop, size_of},
    ptr,
};

use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::ids::IdAllocator;
use crate::engine::types::{
    ComponentID,
    Signature,
};


/// Marker for types that can be stored as components.
///
/// Implemented for every `Send + 'static` type.
pub trait Component: Send + 'static {}

impl<T: Send + 'static> Component for T {}

/// Type-erased destructor for a value stored in a column slot.
pub type DropFn = unsafe fn(*mut u8);

unsafe fn drop_in_place_as<T>(ptr: *mut u8) {
    // SAFETY: the caller guarantees `ptr` points to an initialized, aligned `T`.
    unsafe { ptr::drop_in_place(ptr.cast::<T>()) }
}

/// Describes a registered component type.
///
/// ## Fields
/// - `component_id`: identifier assigned by the registry.
/// - `name`: the Rust type name (`type_name::<T>()`).
/// - `type_id`: the runtime `TypeId`.
/// - `size` / `align`: layout of one value in bytes.
/// - `drop_fn`: destructor, `None` when the type has no drop glue.

#[derive(Copy, Clone)]
pub struct ComponentMeta {
    /// Runtime identifier assigned to this component type.
    pub component_id: ComponentID,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// Destructor for one stored value.
    pub drop_fn: Option<DropFn>,
}

impl ComponentMeta {
    /// Builds the metadata for `T` under `component_id`.
    #[inline]
    pub fn of<T: Component>(component_id: ComponentID) -> Self {
        Self {
            component_id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            drop_fn: if needs_drop::<T>() { Some(drop_in_place_as::<T> as DropFn) } else { None },
        }
    }

    /// Returns `true` if this metadata describes `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Fails with [`ECSError::TypeMismatch`] unless this metadata describes `T`.
    #[inline]
    pub fn expect_type<T: 'static>(&self) -> ECSResult<()> {
        if self.matches_type::<T>() {
            Ok(())
        } else {
            Err(ECSError::TypeMismatch { expected: self.name, actual: type_name::<T>() })
        }
    }
}

impl fmt::Debug for ComponentMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMeta")
            .field("component_id", &self.component_id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("needs_drop", &self.drop_fn.is_some())
            .finish()
    }
}

impl fmt::Display for ComponentMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentMeta {{ id: {}, name: {}, size: {}, align: {} }}",
            self.component_id, self.name, self.size, self.align
        )
    }
}

/// Mapping between Rust component types and `ComponentID` values.
///
/// ## Design
/// - `by_type` maps `TypeId -> ComponentID`.
/// - `by_id` maps `ComponentID -> ComponentMeta`.

#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentID>,
    by_id: HashMap<ComponentID, ComponentMeta>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `T` and returns its `ComponentID`.
    ///
    /// ## Behavior
    /// - If `T` is already registered, returns the existing id.
    /// - Otherwise draws a new id from `ids` and stores its metadata.

    pub fn register<T: Component>(&mut self, ids: &mut IdAllocator) -> ComponentID {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }

        let component_id = ids.generate_component();
        self.by_type.insert(type_id, component_id);
        self.by_id.insert(component_id, ComponentMeta::of::<T>(component_id));
        tracing::debug!(component_id, name = type_name::<T>(), "registered component");
        component_id
    }

    /// Returns the id of `T`, or `NotFound` if it was never registered.
    pub fn lookup<T: 'static>(&self) -> ECSResult<ComponentID> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(ECSError::NotFound(NotFound::ComponentType(type_name::<T>())))
    }

    /// Returns the metadata of a registered component.
    pub fn meta(&self, component_id: ComponentID) -> ECSResult<&ComponentMeta> {
        self.by_id
            .get(&component_id)
            .ok_or(ECSError::NotFound(NotFound::Component(component_id)))
    }

    /// Returns `true` if `component_id` is registered.
    #[inline]
    pub fn contains(&self, component_id: ComponentID) -> bool {
        self.by_id.contains_key(&component_id)
    }

    /// Builds the canonical signature for a list of component ids.
    ///
    /// ## Errors
    /// - `InvalidSignature` if the list is empty.
    /// - `NotFound` if any id is unregistered.

    pub fn resolve_signature(&self, component_ids: &[ComponentID]) -> ECSResult<Signature> {
        if component_ids.is_empty() {
            return Err(ECSError::InvalidSignature("component list is empty".into()));
        }
        if let Some(&missing) = component_ids.iter().find(|&&c| !self.contains(c)) {
            return Err(NotFound::Component(missing).into());
        }
        Ok(Signature::from_ids(component_ids))
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if nothing has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
