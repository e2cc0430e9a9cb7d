//! # Engine Module
//!
//! Core implementation of the store.
//!
//! This module contains the building blocks:
//! - Identifier allocation and the component registry
//! - Column storage
//! - Archetypes and the archetype graph
//! - Entity and component indices
//! - Systems, row views and scheduling
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod config;
pub mod ids;
pub mod component;
pub mod storage;
pub mod entity;
pub mod archetype;
pub mod graph;
pub mod query;
pub mod commands;
pub mod systems;
pub mod scheduler;
pub mod registry;
