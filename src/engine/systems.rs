//! System Abstractions
//!
//! A **system** is a unit of logic run periodically over every entity whose
//! archetype contains the system's component signature. Systems:
//! - declare the components they operate on as a canonical [`Signature`],
//! - are visited once per matching row when they are due,
//! - reach component data only through a [`RowView`], never through the store.
//!
//! ## System Trait
//!
//! The [`System`] trait is the minimal interface the scheduler needs:
//!
//! - [`System::id`] and [`System::name`] identify it,
//! - [`System::signature`] declares the required components,
//! - [`System::run`] processes one row.
//!
//! ## Function-backed Systems
//!
//! [`FnSystem`] wraps a closure. It is what
//! [`WorldRegistry::register_system`](crate::engine::registry::WorldRegistry::register_system)
//! and the [`SystemBuilder`](crate::engine::query::SystemBuilder) finishers
//! produce, so most code never implements [`System`] by hand.
//!
//! ## Structural changes
//!
//! A [`RowView`] cannot create, delete or relocate entities. Callbacks record
//! [`Command`](crate::engine::commands::Command)s through
//! [`RowView::defer`] instead; they are applied after the system finishes.

use crate::engine::query::RowView;
use crate::engine::types::{
    Signature,
    SystemID,
};


/// A unit of executable logic operating on matching rows.
///
/// Systems must be `Send` so a store holding them can move across threads.

pub trait System: Send {
    /// Returns the unique identifier of this system.
    fn id(&self) -> SystemID;

    /// Returns the human-readable name of this system.
    fn name(&self) -> &str;

    /// Returns the components this system requires.
    fn signature(&self) -> &Signature;

    /// Processes one matching row.
    fn run(&mut self, row: &mut RowView<'_>);
}

/// A concrete [`System`] backed by a closure.
///
/// It stores:
/// - a system ID,
/// - a human-readable name,
/// - the required signature,
/// - and the per-row function itself.

pub struct FnSystem<F>
where
    F: FnMut(&mut RowView<'_>) + Send + 'static,
{
    id: SystemID,
    name: String,
    signature: Signature,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut RowView<'_>) + Send + 'static,
{
    /// Creates a new function-backed system.
    ///
    /// # Parameters
    /// - `id`: Unique identifier for the system.
    /// - `name`: Human-readable name, used in logs and duplicate checks.
    /// - `signature`: Components a row must have to be visited.
    /// - `f`: The function executed per row.
    pub fn new(id: SystemID, name: impl Into<String>, signature: Signature, f: F) -> Self {
        Self { id, name: name.into(), signature, f }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut RowView<'_>) + Send + 'static,
{
    fn id(&self) -> SystemID {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn run(&mut self, row: &mut RowView<'_>) {
        (self.f)(row)
    }
}
