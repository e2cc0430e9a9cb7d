//! Row access for systems and builder-style system registration.
//!
//! ## Row views
//!
//! While a system runs, the scheduler hands its callback one [`RowView`] per
//! matching row. The view exposes:
//! * the entity owning the row,
//! * the component values named by the system signature, addressed by their
//!   position in the canonical signature (or by component id),
//! * a command buffer for structural changes, applied after the system.
//!
//! Typed access is checked: asking for the wrong Rust type yields
//! [`ECSError::TypeMismatch`], never a reinterpretation of bytes.
//!
//! ## Builders
//!
//! [`SystemBuilder`] assembles a system from Rust types instead of raw ids:
//!
//! ```ignore
//! world.system("integrate")
//!     .every(2)
//!     .for_each2::<Position, Velocity, _>(|p, v| {
//!         p.x += v.dx;
//!         p.y += v.dy;
//!     })?;
//! ```
//!
//! The typed finishers (`for_each1`, `for_each2`, `for_each3`) add their
//! component types to the signature themselves. `with::<T>()` adds extra
//! required components that the callback does not touch.

use crate::engine::archetype::Archetype;
use crate::engine::commands::Command;
use crate::engine::component::Component;
use crate::engine::entity::Entity;
use crate::engine::error::{
    ECSError,
    ECSResult,
};

use crate::engine::registry::WorldRegistry;
use crate::engine::types::{
    ComponentID,
    RowID,
    Signature,
    SystemID,
    Tick,
};


/// Access to one matching row during a system run.
///
/// `index` arguments are positions in the system's canonical signature:
/// `0` is the component with the smallest id.

pub struct RowView<'a> {
    entity: Entity,
    row: RowID,
    archetype: &'a mut Archetype,
    columns: &'a [usize],
    signature: &'a Signature,
    commands: &'a mut Vec<Command>,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(
        entity: Entity,
        row: RowID,
        archetype: &'a mut Archetype,
        columns: &'a [usize],
        signature: &'a Signature,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self { entity, row, archetype, columns, signature, commands }
    }

    /// Entity owning this row.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Row index inside the current archetype.
    #[inline]
    pub fn row(&self) -> RowID {
        self.row
    }

    /// The system signature the indices refer to.
    #[inline]
    pub fn signature(&self) -> &Signature {
        self.signature
    }

    /// Reads the component at signature position `index`.
    pub fn get<T: Component>(&self, index: usize) -> ECSResult<&T> {
        let column = self.column_index(index)?;
        self.archetype
            .column(column)
            .ok_or_else(|| out_of_range(index))?
            .get(self.row)
    }

    /// Mutably reads the component at signature position `index`.
    pub fn get_mut<T: Component>(&mut self, index: usize) -> ECSResult<&mut T> {
        let column = self.column_index(index)?;
        let row = self.row;
        self.archetype
            .column_mut(column)
            .ok_or_else(|| out_of_range(index))?
            .get_mut(row)
    }

    /// Reads a component by id. It must be part of the system signature.
    pub fn get_by_id<T: Component>(&self, component_id: ComponentID) -> ECSResult<&T> {
        self.get(self.position_of(component_id)?)
    }

    /// Mutably reads a component by id.
    pub fn get_by_id_mut<T: Component>(&mut self, component_id: ComponentID) -> ECSResult<&mut T> {
        let index = self.position_of(component_id)?;
        self.get_mut(index)
    }

    /// Borrows two distinct components mutably.
    pub fn get2_mut<A: Component, B: Component>(&mut self, a: usize, b: usize) -> ECSResult<(&mut A, &mut B)> {
        let wanted = [self.column_index(a)?, self.column_index(b)?];
        let row = self.row;
        match self.archetype.columns_many_mut(wanted) {
            [Some(ca), Some(cb)] => Ok((ca.get_mut::<A>(row)?, cb.get_mut::<B>(row)?)),
            _ => Err(aliased(&[a, b])),
        }
    }

    /// Borrows three distinct components mutably.
    pub fn get3_mut<A: Component, B: Component, C: Component>(
        &mut self,
        a: usize,
        b: usize,
        c: usize,
    ) -> ECSResult<(&mut A, &mut B, &mut C)> {
        let wanted = [self.column_index(a)?, self.column_index(b)?, self.column_index(c)?];
        let row = self.row;
        match self.archetype.columns_many_mut(wanted) {
            [Some(ca), Some(cb), Some(cc)] => Ok((ca.get_mut::<A>(row)?, cb.get_mut::<B>(row)?, cc.get_mut::<C>(row)?)),
            _ => Err(aliased(&[a, b, c])),
        }
    }

    /// Records a structural change to apply after the system finishes.
    #[inline]
    pub fn defer(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn column_index(&self, index: usize) -> ECSResult<usize> {
        self.columns.get(index).copied().ok_or_else(|| out_of_range(index))
    }

    fn position_of(&self, component_id: ComponentID) -> ECSResult<usize> {
        self.signature.position(component_id).ok_or_else(|| {
            ECSError::InvalidSignature(format!(
                "component {component_id} is not part of system signature {}",
                self.signature
            ))
        })
    }
}

fn out_of_range(index: usize) -> ECSError {
    ECSError::InvalidSignature(format!("system signature has no position {index}"))
}

fn aliased(indices: &[usize]) -> ECSError {
    ECSError::InvalidSignature(format!("positions {indices:?} must be distinct"))
}

/// Builder for systems keyed by Rust component types.
///
/// The builder borrows the store mutably and is consumed by its finisher.
/// Lookup failures are remembered and reported by the finisher, so calls can
/// be chained without intermediate `?`.

pub struct SystemBuilder<'w> {
    world: &'w mut WorldRegistry,
    name: String,
    components: Vec<ComponentID>,
    tick_interval: Option<Tick>,
    error: Option<ECSError>,
}

impl<'w> SystemBuilder<'w> {
    pub(crate) fn new(world: &'w mut WorldRegistry, name: impl Into<String>) -> Self {
        Self { world, name: name.into(), components: Vec::new(), tick_interval: None, error: None }
    }

    /// Requires component `T`. It must already be registered.
    pub fn with<T: Component>(mut self) -> Self {
        self.require::<T>();
        self
    }

    /// Requires a component by id.
    pub fn with_id(mut self, component_id: ComponentID) -> Self {
        self.components.push(component_id);
        self
    }

    /// Runs the system every `interval` ticks.
    pub fn every(mut self, interval: Tick) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Registers the system with an untyped per-row callback.
    pub fn each<F>(self, callback: F) -> ECSResult<SystemID>
    where
        F: FnMut(&mut RowView<'_>) + Send + 'static,
    {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.world.register_named_system(&self.name, &self.components, callback, self.tick_interval)
    }

    /// Registers a system over one component.
    pub fn for_each1<A, F>(mut self, mut f: F) -> ECSResult<SystemID>
    where
        A: Component,
        F: FnMut(&mut A) + Send + 'static,
    {
        let a = self.require::<A>();
        let [pa] = self.positions([a])?;
        self.each(move |row| {
            if let Ok(va) = row.get_mut::<A>(pa) {
                f(va);
            }
        })
    }

    /// Registers a system over two distinct components.
    pub fn for_each2<A, B, F>(mut self, mut f: F) -> ECSResult<SystemID>
    where
        A: Component,
        B: Component,
        F: FnMut(&mut A, &mut B) + Send + 'static,
    {
        let a = self.require::<A>();
        let b = self.require::<B>();
        let [pa, pb] = self.positions([a, b])?;
        self.each(move |row| {
            if let Ok((va, vb)) = row.get2_mut::<A, B>(pa, pb) {
                f(va, vb);
            }
        })
    }

    /// Registers a system over three distinct components.
    pub fn for_each3<A, B, C, F>(mut self, mut f: F) -> ECSResult<SystemID>
    where
        A: Component,
        B: Component,
        C: Component,
        F: FnMut(&mut A, &mut B, &mut C) + Send + 'static,
    {
        let a = self.require::<A>();
        let b = self.require::<B>();
        let c = self.require::<C>();
        let [pa, pb, pc] = self.positions([a, b, c])?;
        self.each(move |row| {
            if let Ok((va, vb, vc)) = row.get3_mut::<A, B, C>(pa, pb, pc) {
                f(va, vb, vc);
            }
        })
    }

    fn require<T: Component>(&mut self) -> ComponentID {
        match self.world.get_component_id::<T>() {
            Ok(component_id) => {
                self.components.push(component_id);
                component_id
            }
            Err(error) => {
                self.error.get_or_insert(error);
                0
            }
        }
    }

    /// Signature positions of `ids`, which must be pairwise distinct.
    fn positions<const N: usize>(&mut self, ids: [ComponentID; N]) -> ECSResult<[usize; N]> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(ECSError::InvalidSignature(format!(
                    "component {id} appears twice in a typed system"
                )));
            }
        }
        let signature = Signature::from_ids(&self.components);
        let mut out = [0usize; N];
        for (slot, id) in out.iter_mut().zip(ids) {
            *slot = signature
                .position(id)
                .ok_or_else(|| ECSError::InvalidSignature(format!("component {id} missing from {signature}")))?;
        }
        Ok(out)
    }
}
