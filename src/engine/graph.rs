//! # Archetype Graph
//!
//! The graph owns every [`Archetype`] of a store in a flat arena and connects
//! them through cached single-component transitions.
//!
//! ## Identity
//!
//! An archetype is identified by its canonical [`Signature`]. The
//! `by_signature` index is the source of truth; edges are a cache over it.
//! Looking up `{Velocity, Speed}` and `{Speed, Velocity}` therefore yields the
//! same archetype, no matter which path built it first.
//!
//! ## Construction
//!
//! [`ArchetypeGraph::add_node`] walks a signature in canonical order from the
//! root (empty signature), one component at a time. Each step follows a cached
//! add edge when present, otherwise resolves the prefix through the signature
//! index, and only creates an archetype when neither knows it. Every step
//! records both directions of the edge.
//!
//! ```text
//!   {} --S--> {S} --V--> {S,V} --A--> {S,V,A}
//!    \                     ^
//!     --V--> {V} ----------'  (linked on demand by `transition`)
//! ```
//!
//! ## Ownership
//!
//! Edges store ids. Archetypes are addressed through `slots`, which maps an id
//! to its index in `archetypes`; two archetypes are borrowed mutably at once
//! with [`ArchetypeGraph::pair_mut`].

use std::collections::{HashMap, HashSet};

use crate::engine::archetype::Archetype;
use crate::engine::component::ComponentRegistry;
use crate::engine::error::{
    ECSError,
    ECSResult,
    NotFound,
};

use crate::engine::ids::IdAllocator;
use crate::engine::types::{
    ArchetypeID,
    ComponentID,
    Direction,
    Signature,
};


/// Arena of archetypes plus the signature index and edge cache.
///
/// ## Invariants
/// - `slots[a.id()]` is the index of `a` in `archetypes`.
/// - `by_signature[a.signature()] == a.id()` for every archetype.
/// - The root has the empty signature and always exists.

#[derive(Debug)]
pub struct ArchetypeGraph {
    archetypes: Vec<Archetype>,
    slots: HashMap<ArchetypeID, usize>,
    by_signature: HashMap<Signature, ArchetypeID>,
    root: ArchetypeID,
    capacity: usize,
}

impl ArchetypeGraph {

    /// Creates a graph holding only the root archetype.
    ///
    /// `capacity` bounds the rows of every archetype built by this graph.

    pub fn new(ids: &mut IdAllocator, capacity: usize) -> Self {
        let root = ids.generate_archetype();
        let mut graph = Self {
            archetypes: Vec::new(),
            slots: HashMap::new(),
            by_signature: HashMap::new(),
            root,
            capacity,
        };
        graph.insert(Archetype::root(root, capacity));
        graph
    }

    /// Id of the empty-signature archetype.
    #[inline]
    pub fn root(&self) -> ArchetypeID {
        self.root
    }

    /// Number of archetypes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always `false`; the root exists from construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Looks an archetype up by canonical signature.
    #[inline]
    pub fn find(&self, signature: &Signature) -> Option<ArchetypeID> {
        self.by_signature.get(signature).copied()
    }

    /// Returns the archetype with id `archetype_id`.
    pub fn get(&self, archetype_id: ArchetypeID) -> ECSResult<&Archetype> {
        let slot = self.slot(archetype_id)?;
        Ok(&self.archetypes[slot])
    }

    /// Returns the archetype with id `archetype_id`, mutably.
    pub fn get_mut(&mut self, archetype_id: ArchetypeID) -> ECSResult<&mut Archetype> {
        let slot = self.slot(archetype_id)?;
        Ok(&mut self.archetypes[slot])
    }

    /// Borrows two distinct archetypes mutably.
    ///
    /// ## Errors
    /// `InvalidSignature` if both ids name the same archetype; `NotFound` if
    /// either is unknown.

    pub fn pair_mut(
        &mut self,
        a: ArchetypeID,
        b: ArchetypeID,
    ) -> ECSResult<(&mut Archetype, &mut Archetype)> {
        let slot_a = self.slot(a)?;
        let slot_b = self.slot(b)?;
        if slot_a == slot_b {
            return Err(ECSError::InvalidSignature(format!(
                "cannot borrow archetype {a} twice"
            )));
        }

        if slot_a < slot_b {
            let (low, high) = self.archetypes.split_at_mut(slot_b);
            Ok((&mut low[slot_a], &mut high[0]))
        } else {
            let (low, high) = self.archetypes.split_at_mut(slot_a);
            Ok((&mut high[0], &mut low[slot_b]))
        }
    }

    /// Iterates over every archetype in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> + '_ {
        self.archetypes.iter()
    }

    /// Ensures an archetype exists for `signature`, building the path to it.
    ///
    /// ## Behavior
    /// Each add edge linked along the way retains its parent, whether the
    /// child was created here or already existed.
    ///
    /// ## Returns
    /// `(id, created)` where `created` lists every archetype this call built,
    /// in creation order.

    pub fn add_node(
        &mut self,
        signature: &Signature,
        registry: &ComponentRegistry,
        ids: &mut IdAllocator,
    ) -> ECSResult<(ArchetypeID, Vec<ArchetypeID>)> {
        let mut current = self.root;
        let mut prefix = Signature::empty();
        let mut created = Vec::new();

        for component_id in signature.iter() {
            prefix = prefix.with(component_id);

            let cached = self.get(current)?.edge(component_id).and_then(|e| e.add);
            let next = match cached {
                Some(next) => next,
                None => {
                    let next = match self.find(&prefix) {
                        Some(existing) => existing,
                        None => {
                            let id = self.create(prefix.clone(), registry, ids)?;
                            created.push(id);
                            id
                        }
                    };
                    self.link(current, component_id, next)?;
                    next
                }
            };
            current = next;
        }

        Ok((current, created))
    }

    /// Follows (or builds) the single-component transition from `from`.
    ///
    /// ## Behavior
    /// - `Add` of a component `from` already has returns `from` unchanged.
    /// - Removing the only component of `from` leads to the root.
    /// - Every newly linked add edge retains its parent: `from` when adding,
    ///   the destination when removing.
    ///
    /// ## Returns
    /// `(destination, created)`.
    ///
    /// ## Errors
    /// `NotFound` when removing a component `from` does not have.

    pub fn transition(
        &mut self,
        from: ArchetypeID,
        component_id: ComponentID,
        direction: Direction,
        registry: &ComponentRegistry,
        ids: &mut IdAllocator,
    ) -> ECSResult<(ArchetypeID, Option<ArchetypeID>)> {
        let source = self.get(from)?;
        let present = source.has(component_id);
        match direction {
            Direction::Add if present => return Ok((from, None)),
            Direction::Remove if !present => return Err(NotFound::Component(component_id).into()),
            _ => {}
        }

        let cached = source.edge(component_id).and_then(|edge| match direction {
            Direction::Add => edge.add,
            Direction::Remove => edge.remove,
        });
        if let Some(target) = cached {
            return Ok((target, None));
        }

        let target_signature = match direction {
            Direction::Add => source.signature().with(component_id),
            Direction::Remove => source.signature().without(component_id),
        };

        let (target, created) = match self.find(&target_signature) {
            Some(existing) => (existing, None),
            None => {
                let id = self.create(target_signature, registry, ids)?;
                (id, Some(id))
            }
        };

        match direction {
            Direction::Add => self.link(from, component_id, target)?,
            Direction::Remove => self.link(target, component_id, from)?,
        }
        Ok((target, created))
    }

    /// Lists the edge component of every archetype reachable from the root.
    ///
    /// ## Behavior
    /// Depth-first along add edges, visiting children in ascending component
    /// order and never entering an archetype twice. One entry is emitted per
    /// newly reached archetype, so the result has one entry per non-root
    /// archetype linked into the graph.

    pub fn dependency_graph(&self) -> Vec<ComponentID> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(self.root);

        // Each frame holds the unvisited children of one archetype, reversed
        // so that `pop` yields ascending component order.
        let mut stack = vec![self.add_children(self.root)];

        while let Some(children) = stack.last_mut() {
            let Some((component_id, child)) = children.pop() else {
                stack.pop();
                continue;
            };
            if visited.insert(child) {
                out.push(component_id);
                stack.push(self.add_children(child));
            }
        }
        out
    }

    /// Archetypes with no entity and no child left.
    pub fn reclaimable(&self) -> Vec<ArchetypeID> {
        self.archetypes
            .iter()
            .filter(|a| a.is_reclaimable())
            .map(Archetype::id)
            .collect()
    }

    fn add_children(&self, archetype_id: ArchetypeID) -> Vec<(ComponentID, ArchetypeID)> {
        self.get(archetype_id)
            .map(|a| a.edges().rev().filter_map(|(c, e)| e.add.map(|t| (c, t))).collect())
            .unwrap_or_default()
    }

    fn create(
        &mut self,
        signature: Signature,
        registry: &ComponentRegistry,
        ids: &mut IdAllocator,
    ) -> ECSResult<ArchetypeID> {
        let metas = signature
            .iter()
            .map(|c| registry.meta(c).copied())
            .collect::<ECSResult<Vec<_>>>()?;
        let archetype_id = ids.generate_archetype();
        tracing::debug!(archetype_id, %signature, "created archetype");
        self.insert(Archetype::new(archetype_id, signature, &metas, self.capacity)?);
        Ok(archetype_id)
    }

    fn insert(&mut self, archetype: Archetype) {
        let archetype_id = archetype.id();
        self.slots.insert(archetype_id, self.archetypes.len());
        self.by_signature.insert(archetype.signature().clone(), archetype_id);
        self.archetypes.push(archetype);
    }

    /// Records `parent --component--> child` in both directions.
    ///
    /// A parent gaining a new child is retained once for it.
    fn link(&mut self, parent: ArchetypeID, component_id: ComponentID, child: ArchetypeID) -> ECSResult<()> {
        let archetype = self.get_mut(parent)?;
        if archetype.set_add_edge(component_id, child) {
            archetype.retain();
        }
        self.get_mut(child)?.set_remove_edge(component_id, parent);
        Ok(())
    }

    fn slot(&self, archetype_id: ArchetypeID) -> ECSResult<usize> {
        self.slots
            .get(&archetype_id)
            .copied()
            .ok_or(NotFound::Archetype(archetype_id).into())
    }
}
