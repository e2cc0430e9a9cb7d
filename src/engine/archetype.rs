//! # Archetypes
//!
//! An archetype stores every entity that has exactly the same set of
//! components. Storage is column-major: one [`Column`] per component of the
//! archetype's canonical [`Signature`], in signature order, so the column of a
//! component is its position in the signature.
//!
//! ## Row model
//!
//! * `entities[r]` is the entity owning row `r` of every column.
//! * Rows are dense. Retiring a row swap-removes it from every column at once,
//!   moving the last row into the gap; the caller patches the record of the
//!   entity that moved.
//! * A freshly assigned row is *vacant* in every column until a value is
//!   attached.
//!
//! ## Graph links
//!
//! Each archetype caches, per component, the archetype reached by adding or
//! removing that component ([`ArchetypeEdge`]). Edges hold ids, never
//! references; the [`ArchetypeGraph`](crate::engine::graph::ArchetypeGraph)
//! arena owns every archetype.
//!
//! ## Reference counting
//!
//! `dependents` counts the entities living in the archetype plus the child
//! archetypes linked below it through add edges. An archetype whose count
//! falls to zero and that has no child is *reclaimable*; it stays cached so
//! ids and edges remain valid.

use std::collections::BTreeMap;

use crate::engine::component::ComponentMeta;
use crate::engine::entity::Entity;
use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::storage::Column;
use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    RowID,
    Signature,
};


/// Cached transitions for one component.
///
/// ## Fields
/// * `add` - archetype reached by adding the component, if known.
/// * `remove` - archetype reached by removing the component, if known.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchetypeEdge {
    /// Destination when the component is added.
    pub add: Option<ArchetypeID>,

    /// Destination when the component is removed.
    pub remove: Option<ArchetypeID>,
}

/// Stores entities that share an identical component signature.
///
/// ## Invariants
/// - `columns.len() == signature.len()` and `columns[i]` stores
///   `signature.components()[i]`.
/// - Every column has exactly `entities.len()` reserved rows.
/// - `edges` keys are ordered, so traversals are deterministic.

#[derive(Debug)]
pub struct Archetype {
    archetype_id: ArchetypeID,
    signature: Signature,
    columns: Vec<Column>,
    entities: Vec<Entity>,
    capacity: usize,
    dependents: usize,
    edges: BTreeMap<ComponentID, ArchetypeEdge>,
}

impl Archetype {

    /// Creates an empty archetype.
    ///
    /// ## Behavior
    /// `metas` must list the metadata of every component of `signature` in
    /// canonical order; one column is built per entry.
    ///
    /// ## Errors
    /// `InvalidSignature` if `metas` does not line up with `signature`.

    pub fn new(
        archetype_id: ArchetypeID,
        signature: Signature,
        metas: &[ComponentMeta],
        capacity: usize,
    ) -> ECSResult<Self> {
        let aligned = metas.len() == signature.len()
            && metas.iter().zip(signature.iter()).all(|(m, c)| m.component_id == c);
        if !aligned {
            return Err(ECSError::InvalidSignature(format!(
                "column metadata does not match signature {signature}"
            )));
        }

        Ok(Self {
            archetype_id,
            columns: metas.iter().map(|m| Column::new(*m, capacity)).collect(),
            signature,
            entities: Vec::new(),
            capacity,
            dependents: 0,
            edges: BTreeMap::new(),
        })
    }

    /// Creates the empty-signature archetype.
    pub fn root(archetype_id: ArchetypeID, capacity: usize) -> Self {
        Self {
            archetype_id,
            signature: Signature::empty(),
            columns: Vec::new(),
            entities: Vec::new(),
            capacity,
            dependents: 0,
            edges: BTreeMap::new(),
        }
    }

    /// Identifier of this archetype.
    #[inline]
    pub fn id(&self) -> ArchetypeID {
        self.archetype_id
    }

    /// Canonical component set.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Number of rows (entities) stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity lives here.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Maximum number of rows.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entities in row order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity owning `row`.
    pub fn entity_at(&self, row: RowID) -> ECSResult<Entity> {
        self.entities.get(row).copied().ok_or_else(|| self.missing_row(row))
    }

    /// Returns `true` if the archetype contains `component_id`.
    #[inline]
    pub fn has(&self, component_id: ComponentID) -> bool {
        self.signature.has(component_id)
    }

    /// Returns `true` if `need` is a subset of this archetype's signature.
    #[inline]
    pub fn matches(&self, need: &Signature) -> bool {
        self.signature.contains_all(need)
    }

    /// Column index of `component_id`.
    pub fn column_value(&self, component_id: ComponentID) -> ECSResult<usize> {
        self.signature
            .position(component_id)
            .ok_or(NotFound::Component(component_id).into())
    }

    /// Column at `index`.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Mutable column at `index`.
    #[inline]
    pub fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Borrows several distinct columns mutably at once.
    ///
    /// Entry `k` of the result is `Some` iff `indices[k]` is in range and not
    /// repeated earlier in `indices`.

    pub fn columns_many_mut<const N: usize>(&mut self, indices: [usize; N]) -> [Option<&mut Column>; N] {
        let mut out: [Option<&mut Column>; N] = std::array::from_fn(|_| None);
        for (index, column) in self.columns.iter_mut().enumerate() {
            if let Some(slot) = indices.iter().position(|&wanted| wanted == index) {
                out[slot] = Some(column);
            }
        }
        out
    }

    /// Reserves a new row for `entity` and returns its index.
    ///
    /// ## Behavior
    /// Every column gets a vacant slot; no value is written.
    ///
    /// ## Errors
    /// `CapacityExceeded` once `len() == capacity()`. The archetype is left
    /// unchanged on failure.

    pub fn assign_row(&mut self, entity: Entity) -> ECSResult<RowID> {
        self.ensure_room()?;
        let row = self.entities.len();

        for index in 0..self.columns.len() {
            if let Err(e) = self.columns[index].push_vacant() {
                for reserved in &mut self.columns[..index] {
                    reserved.swap_remove(row)?;
                }
                return Err(e);
            }
        }
        self.entities.push(entity);
        Ok(row)
    }

    /// Fails with `CapacityExceeded` if no further row fits.
    pub fn ensure_room(&self) -> ECSResult<()> {
        if self.entities.len() >= self.capacity {
            return Err(ECSError::CapacityExceeded {
                component: self.signature.iter().next().unwrap_or_default(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Retires `row` in every column by swap-remove.
    ///
    /// ## Returns
    /// The entity that was moved into `row`, if any. Its record must be
    /// patched by the caller.

    pub fn swap_remove_row(&mut self, row: RowID) -> ECSResult<Option<Entity>> {
        if row >= self.entities.len() {
            return Err(self.missing_row(row));
        }
        for column in &mut self.columns {
            column.swap_remove(row)?;
        }
        self.entities.swap_remove(row);
        Ok(self.entities.get(row).copied())
    }

    /// Moves the entity at `row` into `destination`.
    ///
    /// ## Behavior
    /// 1. Reserves a row in `destination`. This is the only step that can
    ///    fail for a consistent store, and it happens before anything moves.
    /// 2. Moves every component present in both signatures without dropping.
    /// 3. Swap-removes `row` here, dropping components `destination` lacks.
    ///
    /// ## Returns
    /// `(destination_row, moved)` where `moved` is the entity that took over
    /// `row` in this archetype.

    pub fn move_row_into(
        &mut self,
        row: RowID,
        destination: &mut Archetype,
    ) -> ECSResult<(RowID, Option<Entity>)> {
        let entity = self.entity_at(row)?;
        let destination_row = destination.assign_row(entity)?;

        for (index, component_id) in self.signature.iter().enumerate() {
            if let Some(dst_index) = destination.signature.position(component_id) {
                self.columns[index].move_slot_into(
                    row,
                    &mut destination.columns[dst_index],
                    destination_row,
                )?;
            }
        }

        let moved = self.swap_remove_row(row)?;
        Ok((destination_row, moved))
    }

    /// Cached transitions for `component_id`.
    #[inline]
    pub fn edge(&self, component_id: ComponentID) -> Option<&ArchetypeEdge> {
        self.edges.get(&component_id)
    }

    /// Caches the archetype reached by adding `component_id`.
    ///
    /// Returns `true` if `target` was not already the cached child.
    pub fn set_add_edge(&mut self, component_id: ComponentID, target: ArchetypeID) -> bool {
        let edge = self.edges.entry(component_id).or_default();
        let fresh = edge.add != Some(target);
        edge.add = Some(target);
        fresh
    }

    /// Caches the archetype reached by removing `component_id`.
    pub fn set_remove_edge(&mut self, component_id: ComponentID, target: ArchetypeID) {
        self.edges.entry(component_id).or_default().remove = Some(target);
    }

    /// All cached edges in ascending component order.
    pub fn edges(&self) -> impl DoubleEndedIterator<Item = (ComponentID, &ArchetypeEdge)> + '_ {
        self.edges.iter().map(|(&c, e)| (c, e))
    }

    /// Increments the dependent count.
    #[inline]
    pub fn retain(&mut self) {
        self.dependents += 1;
    }

    /// Decrements the dependent count, saturating at zero.
    #[inline]
    pub fn release(&mut self) {
        self.dependents = self.dependents.saturating_sub(1);
    }

    /// Current dependent count.
    #[inline]
    pub fn dependents(&self) -> usize {
        self.dependents
    }

    /// Returns `true` if any add edge leads to a child archetype.
    pub fn has_children(&self) -> bool {
        self.edges.values().any(|edge| edge.add.is_some())
    }

    /// Returns `true` when nothing depends on this archetype any more: no
    /// entity lives here and no child archetype hangs off an add edge.
    ///
    /// The root archetype is never reclaimable.
    #[inline]
    pub fn is_reclaimable(&self) -> bool {
        self.dependents == 0 && !self.has_children() && !self.signature.is_empty()
    }

    fn missing_row(&self, row: RowID) -> ECSError {
        NotFound::ArchetypeRow { archetype: self.archetype_id, row }.into()
    }
}
