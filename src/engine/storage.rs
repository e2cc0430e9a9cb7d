//! Type-erased column storage for one component type.
//!
//! A [`Column`] is a fixed-capacity byte arena holding values of exactly one
//! registered component. It is the storage unit of an archetype: an archetype
//! owns one column per component of its signature, and row `r` of every
//! column belongs to the same entity.
//!
//! # Storage model
//!
//! ```text
//! data:     [ slot 0 | slot 1 | ... | slot allocated-1 ]   (size × align per slot)
//! occupied: [ true   | false  | ... ]                        (len == rows)
//! ```
//!
//! * Memory is allocated lazily and grows geometrically, but never beyond
//!   `capacity` slots. Writing at or past `capacity` fails with
//!   [`ECSError::CapacityExceeded`].
//! * A row exists once it is reserved (`push_vacant`) or written (`insert`).
//!   A reserved row stays *vacant* until a value is written; reading a vacant
//!   row yields `NotFound` instead of uninitialized memory.
//! * `count` is the number of occupied rows; `rows` the number of reserved
//!   ones.
//!
//! # Core operations
//!
//! - **Write**: `insert` places a value, dropping any previous value in place.
//! - **Remove**: `swap_remove` drops the value at a row and moves the last
//!   slot into the gap, keeping rows dense. The index of the moved slot is
//!   returned so callers can patch whatever points at it.
//! - **Transfer**: `move_slot_into` hands a value over to another column of
//!   the same component without running its destructor.
//!
//! Zero-sized components never allocate; their slots live at a dangling,
//! aligned address.
//!
//! # Safety
//!
//! Typed access checks the requested `TypeId` against the column metadata
//! before any pointer is cast, so no safe method can reinterpret bytes as the
//! wrong type.

use std::{
    alloc::{self, Layout},
    fmt,
    ptr::{self, NonNull},
};

use crate::engine::component::{
    Component,
    ComponentMeta,
};

use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::types::{
    ComponentID,
    RowID,
};


/// Fixed-capacity storage for the values of one component.
///
/// ## Invariants
/// - `occupied.len() == rows() <= allocated <= capacity` (for sized types).
/// - `count` equals the number of `true` entries in `occupied`.
/// - Every occupied slot holds a fully initialized value of `meta.type_id`.

pub struct Column {
    meta: ComponentMeta,
    data: NonNull<u8>,
    allocated: usize,
    occupied: Vec<bool>,
    count: usize,
    capacity: usize,
}

// SAFETY: columns only ever hold `Component` values, which are `Send`, and the
// raw allocation is uniquely owned by the column.
unsafe impl Send for Column {}

impl Column {
    /// Creates an empty column for `meta` bounded to `capacity` rows.
    pub fn new(meta: ComponentMeta, capacity: usize) -> Self {
        Self {
            meta,
            data: NonNull::dangling(),
            allocated: 0,
            occupied: Vec::new(),
            count: 0,
            capacity,
        }
    }

    /// Component stored by this column.
    #[inline]
    pub fn component_id(&self) -> ComponentID {
        self.meta.component_id
    }

    /// Metadata of the stored component.
    #[inline]
    pub fn meta(&self) -> &ComponentMeta {
        &self.meta
    }

    /// Number of occupied rows.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of reserved rows, occupied or vacant.
    #[inline]
    pub fn rows(&self) -> usize {
        self.occupied.len()
    }

    /// Maximum number of rows.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if no row is reserved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Returns `true` if `row` holds a value.
    #[inline]
    pub fn is_occupied(&self, row: RowID) -> bool {
        self.occupied.get(row).copied().unwrap_or(false)
    }

    /// Reserves a new vacant row at the end and returns its index.
    pub fn push_vacant(&mut self) -> ECSResult<RowID> {
        let row = self.rows();
        if row >= self.capacity {
            return Err(self.full());
        }
        self.reserve_slots(row + 1)?;
        self.occupied.push(false);
        Ok(row)
    }

    /// Writes `value` at `row`.
    ///
    /// ## Behavior
    /// - A vacant slot becomes occupied and `count` grows by one.
    /// - An occupied slot is overwritten; the previous value is dropped.
    /// - Rows between the current end and `row` are reserved as vacant.
    ///
    /// ## Errors
    /// - `TypeMismatch` if `T` is not the stored component type.
    /// - `CapacityExceeded` if `row >= capacity`.

    pub fn insert<T: Component>(&mut self, row: RowID, value: T) -> ECSResult<()> {
        self.meta.expect_type::<T>()?;
        if row >= self.capacity {
            return Err(self.full());
        }
        if row >= self.rows() {
            self.reserve_slots(row + 1)?;
            self.occupied.resize(row + 1, false);
        }

        let slot = self.ptr_at(row).cast::<T>();
        if self.occupied[row] {
            // SAFETY: the slot is occupied by an initialized `T` (type checked
            // above); plain assignment drops the old value.
            unsafe { *slot = value };
        } else {
            // SAFETY: the slot lies inside the allocation and is vacant.
            unsafe { ptr::write(slot, value) };
            self.occupied[row] = true;
            self.count += 1;
        }
        Ok(())
    }

    /// Returns a shared reference to the value at `row`.
    pub fn get<T: Component>(&self, row: RowID) -> ECSResult<&T> {
        self.meta.expect_type::<T>()?;
        if !self.is_occupied(row) {
            return Err(self.vacant(row));
        }
        // SAFETY: the slot is occupied by an initialized `T`.
        Ok(unsafe { &*self.ptr_at(row).cast::<T>() })
    }

    /// Returns a mutable reference to the value at `row`.
    pub fn get_mut<T: Component>(&mut self, row: RowID) -> ECSResult<&mut T> {
        self.meta.expect_type::<T>()?;
        if !self.is_occupied(row) {
            return Err(self.vacant(row));
        }
        // SAFETY: the slot is occupied by an initialized `T`, and `&mut self`
        // guarantees exclusivity.
        Ok(unsafe { &mut *self.ptr_at(row).cast::<T>() })
    }

    /// Retires `row`, moving the last slot into its place.
    ///
    /// ## Behavior
    /// - The value at `row` (if any) is dropped.
    /// - If `row` was not the last row, the last slot's bytes and occupancy
    ///   move into `row`.
    /// - `rows()` shrinks by one.
    ///
    /// ## Returns
    /// The index the moved slot came from, or `None` if `row` was last.

    pub fn swap_remove(&mut self, row: RowID) -> ECSResult<Option<RowID>> {
        let rows = self.rows();
        if row >= rows {
            return Err(self.vacant(row));
        }
        if self.occupied[row] {
            self.drop_slot(row);
        }

        let last = rows - 1;
        let moved = if row != last {
            if self.occupied[last] && self.meta.size > 0 {
                // SAFETY: both slots are inside the allocation and distinct;
                // `row` is vacant so nothing is leaked or double-dropped.
                unsafe {
                    ptr::copy_nonoverlapping(self.ptr_at(last), self.ptr_at(row), self.meta.size)
                };
            }
            self.occupied[row] = self.occupied[last];
            Some(last)
        } else {
            None
        };
        self.occupied.pop();
        Ok(moved)
    }

    /// Moves the value at `row` into `dst[dst_row]` without dropping it.
    ///
    /// ## Behavior
    /// - A vacant source leaves the destination untouched.
    /// - An occupied destination slot is dropped before being overwritten.
    /// - The source slot becomes vacant; its row stays reserved.
    ///
    /// ## Errors
    /// - `TypeMismatch` if `dst` stores another component.
    /// - `NotFound` if either row is not reserved.

    pub fn move_slot_into(&mut self, row: RowID, dst: &mut Column, dst_row: RowID) -> ECSResult<()> {
        if dst.meta.component_id != self.meta.component_id {
            return Err(ECSError::TypeMismatch { expected: dst.meta.name, actual: self.meta.name });
        }
        if row >= self.rows() {
            return Err(self.vacant(row));
        }
        if dst_row >= dst.rows() {
            return Err(dst.vacant(dst_row));
        }
        if !self.occupied[row] {
            return Ok(());
        }
        if dst.occupied[dst_row] {
            dst.drop_slot(dst_row);
        }

        if self.meta.size > 0 {
            // SAFETY: distinct allocations of the same layout; ownership of the
            // bytes passes to `dst` and the source is marked vacant below.
            unsafe {
                ptr::copy_nonoverlapping(self.ptr_at(row), dst.ptr_at(dst_row), self.meta.size)
            };
        }
        dst.occupied[dst_row] = true;
        dst.count += 1;
        self.occupied[row] = false;
        self.count -= 1;
        Ok(())
    }

    fn drop_slot(&mut self, row: RowID) {
        if let Some(drop_fn) = self.meta.drop_fn {
            // SAFETY: the caller only passes occupied rows, which hold an
            // initialized value of the type `drop_fn` was built for.
            unsafe { drop_fn(self.ptr_at(row)) };
        }
        self.occupied[row] = false;
        self.count -= 1;
    }

    fn ptr_at(&self, row: RowID) -> *mut u8 {
        if self.meta.size == 0 {
            return self.meta.align as *mut u8;
        }
        debug_assert!(row < self.allocated);
        // SAFETY: `row < allocated`, so the offset stays inside the allocation.
        unsafe { self.data.as_ptr().add(row * self.meta.size) }
    }

    fn layout_for(&self, slots: usize) -> Option<Layout> {
        let bytes = self.meta.size.checked_mul(slots)?;
        Layout::from_size_align(bytes, self.meta.align).ok()
    }

    fn reserve_slots(&mut self, needed: usize) -> ECSResult<()> {
        if needed <= self.allocated {
            return Ok(());
        }
        if needed > self.capacity {
            return Err(self.full());
        }
        if self.meta.size == 0 {
            self.allocated = self.capacity;
            return Ok(());
        }

        let new_slots = needed.max(self.allocated * 2).max(4).min(self.capacity);
        let new_layout = self.layout_for(new_slots).ok_or_else(|| self.full())?;

        // SAFETY: `new_layout` has non-zero size; the old layout is the one the
        // current block was allocated with.
        let raw = unsafe {
            if self.allocated == 0 {
                alloc::alloc(new_layout)
            } else {
                let old_layout = self.layout_for(self.allocated).ok_or_else(|| self.full())?;
                alloc::realloc(self.data.as_ptr(), old_layout, new_layout.size())
            }
        };
        self.data = match NonNull::new(raw) {
            Some(data) => data,
            None => alloc::handle_alloc_error(new_layout),
        };
        self.allocated = new_slots;
        Ok(())
    }

    fn full(&self) -> ECSError {
        ECSError::CapacityExceeded { component: self.meta.component_id, capacity: self.capacity }
    }

    fn vacant(&self, row: RowID) -> ECSError {
        NotFound::Row { component: self.meta.component_id, row }.into()
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.meta.drop_fn {
            for row in 0..self.occupied.len() {
                if self.occupied[row] {
                    // SAFETY: occupied slots hold initialized values.
                    unsafe { drop_fn(self.ptr_at(row)) };
                }
            }
        }
        if self.meta.size > 0 && self.allocated > 0 {
            if let Some(layout) = self.layout_for(self.allocated) {
                // SAFETY: the block was allocated with exactly this layout.
                unsafe { alloc::dealloc(self.data.as_ptr(), layout) };
            }
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("component", &self.meta.name)
            .field("count", &self.count)
            .field("rows", &self.rows())
            .field("allocated", &self.allocated)
            .field("capacity", &self.capacity)
            .finish()
    }
}
