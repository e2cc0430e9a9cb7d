//! System bookkeeping and execution.
//!
//! This module is responsible for:
//! * tracking every registered system with its interval and enabled flag,
//! * caching, per system, the archetypes whose signature is a superset of the
//!   system signature,
//! * running a due system over every written row of those archetypes.
//!
//! ## Tick model
//!
//! Each system carries an elapsed-tick counter. On every store tick an
//! enabled system advances its counter; when the counter reaches the
//! interval the system runs and the counter resets. Disabled systems keep
//! their counter frozen.
//!
//! ## Structural synchronization
//!
//! Deferred commands recorded by a system are collected into a buffer owned
//! by the caller and applied by the
//! [`WorldRegistry`](crate::engine::registry::WorldRegistry) after the system
//! finishes, so structural changes never race with iteration.

use std::collections::HashMap;

use crate::engine::archetype::Archetype;
use crate::engine::commands::Command;
use crate::engine::entity::ComponentIndex;
use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::graph::ArchetypeGraph;
use crate::engine::query::RowView;
use crate::engine::systems::System;
use crate::engine::types::{
    ArchetypeID,
    SystemID,
    Tick,
};


/// A registered system and its scheduling state.
///
/// ## Invariants
/// * `tick_interval >= 1`
/// * `elapsed < tick_interval` between ticks
/// * `matches` holds every archetype matching the system signature, in
///   creation order

pub struct ScheduledSystem {
    system: Box<dyn System>,
    tick_interval: Tick,
    elapsed: Tick,
    enabled: bool,
    matches: Vec<ArchetypeID>,
}

impl ScheduledSystem {
    /// Identifier of the wrapped system.
    pub fn id(&self) -> SystemID {
        self.system.id()
    }

    /// Name of the wrapped system.
    pub fn name(&self) -> &str {
        self.system.name()
    }

    /// Interval in ticks between runs.
    pub fn tick_interval(&self) -> Tick {
        self.tick_interval
    }

    /// Whether the system takes part in ticks.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Archetypes currently matched.
    pub fn matches(&self) -> &[ArchetypeID] {
        &self.matches
    }
}

impl std::fmt::Debug for ScheduledSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledSystem")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("tick_interval", &self.tick_interval)
            .field("elapsed", &self.elapsed)
            .field("enabled", &self.enabled)
            .field("matches", &self.matches)
            .finish()
    }
}

/// Ordered collection of systems.
///
/// Systems run in registration order.

#[derive(Default)]
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    by_id: HashMap<SystemID, usize>,
    by_name: HashMap<String, SystemID>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no system is registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Id of the system registered under `name`, if any.
    pub fn id_by_name(&self, name: &str) -> Option<SystemID> {
        self.by_name.get(name).copied()
    }

    /// Adds `system`, matching it against every archetype already in `graph`.
    ///
    /// ## Errors
    /// - `InvalidTickInterval` if `tick_interval == 0`.
    /// - `DuplicateRegistration` if the name is taken.

    pub fn register(
        &mut self,
        system: Box<dyn System>,
        tick_interval: Tick,
        graph: &ArchetypeGraph,
    ) -> ECSResult<SystemID> {
        if tick_interval == 0 {
            return Err(ECSError::InvalidTickInterval);
        }
        if let Some(&existing) = self.by_name.get(system.name()) {
            return Err(ECSError::DuplicateRegistration { name: system.name().to_owned(), existing });
        }

        let system_id = system.id();
        let matches = graph
            .iter()
            .filter(|a| a.matches(system.signature()))
            .map(Archetype::id)
            .collect::<Vec<_>>();

        tracing::debug!(
            system_id,
            name = system.name(),
            signature = %system.signature(),
            tick_interval,
            matched = matches.len(),
            "registered system"
        );

        self.by_name.insert(system.name().to_owned(), system_id);
        self.by_id.insert(system_id, self.systems.len());
        self.systems.push(ScheduledSystem { system, tick_interval, elapsed: 0, enabled: true, matches });
        Ok(system_id)
    }

    /// Adds `archetype` to the match cache of every system it satisfies.
    pub fn on_archetype_created(&mut self, archetype: &Archetype) {
        for scheduled in &mut self.systems {
            if archetype.matches(scheduled.system.signature()) {
                scheduled.matches.push(archetype.id());
            }
        }
    }

    /// Returns the scheduling state of `system_id`.
    pub fn get(&self, system_id: SystemID) -> ECSResult<&ScheduledSystem> {
        let index = self.index_of(system_id)?;
        Ok(&self.systems[index])
    }

    /// Enables or disables a system.
    pub fn set_enabled(&mut self, system_id: SystemID, enabled: bool) -> ECSResult<()> {
        let index = self.index_of(system_id)?;
        self.systems[index].enabled = enabled;
        Ok(())
    }

    /// System ids in registration order.
    pub fn ids(&self) -> Vec<SystemID> {
        self.systems.iter().map(ScheduledSystem::id).collect()
    }

    /// Advances the counter of `system_id`.
    ///
    /// Returns `true` if the system is due now, resetting its counter.

    pub fn advance(&mut self, system_id: SystemID) -> ECSResult<bool> {
        let index = self.index_of(system_id)?;
        let scheduled = &mut self.systems[index];
        if !scheduled.enabled {
            return Ok(false);
        }
        scheduled.elapsed += 1;
        if scheduled.elapsed >= scheduled.tick_interval {
            scheduled.elapsed = 0;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Runs `system_id` over every matching, fully written row.
    ///
    /// ## Behavior
    /// - Archetypes are visited in match order; rows in `0..len()`.
    /// - A row is skipped unless every component of the system signature has
    ///   a value at that row.
    /// - Commands recorded by the callback are appended to `commands`.
    ///
    /// ## Returns
    /// The number of rows the callback was invoked on.

    pub fn run(
        &mut self,
        system_id: SystemID,
        graph: &mut ArchetypeGraph,
        components: &ComponentIndex,
        commands: &mut Vec<Command>,
    ) -> ECSResult<usize> {
        let index = self.index_of(system_id)?;
        let scheduled = &mut self.systems[index];
        let system = &mut scheduled.system;
        let signature = system.signature().clone();
        let _span = tracing::debug_span!("system", id = system.id(), name = system.name()).entered();

        let mut visited = 0;
        for &archetype_id in &scheduled.matches {
            let archetype = graph.get_mut(archetype_id)?;
            if archetype.is_empty() {
                continue;
            }

            let columns = signature
                .iter()
                .map(|c| components.column_of(c, archetype_id))
                .collect::<ECSResult<Vec<_>>>()?;

            for row in 0..archetype.len() {
                let written = columns
                    .iter()
                    .all(|&c| archetype.column(c).is_some_and(|column| column.is_occupied(row)));
                if !written {
                    continue;
                }
                let entity = archetype.entity_at(row)?;
                let mut view = RowView::new(entity, row, &mut *archetype, &columns, &signature, commands);
                system.run(&mut view);
                visited += 1;
            }
        }

        tracing::trace!(visited, deferred = commands.len(), "system finished");
        Ok(visited)
    }

    fn index_of(&self, system_id: SystemID) -> ECSResult<usize> {
        self.by_id.get(&system_id).copied().ok_or(NotFound::System(system_id).into())
    }
}
