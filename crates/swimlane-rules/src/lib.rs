//! swimlane-rules: the action engine that keeps a work item's state, metastate
//! and board columns consistent.
//!
//! This crate provides:
//! - `Action`: a unit of reconciliation logic triggered by a change set
//! - `ActionEngine`: resolves configured action keys against a fixed registry
//!   and runs them in order, threading one accumulated change set
//! - `NilAction`, `FieldSetAction`, `StateToMetaStateAction`: the standard actions
//! - Collaborator contracts (`Repository` and friends) for loading definitions
//!   and saving the reconciled entity

pub mod action;
pub mod actions;
pub mod columns;
pub mod engine;
pub mod mapping;
pub mod memory;
pub mod repository;

pub use action::{Action, ActionContext, ActionKey, FieldSetValidation, RuleSettings};
pub use actions::{FieldSetAction, NilAction, StateToMetaStateAction};
pub use engine::{ActionConfig, ActionEngine, ActionRegistry};
pub use mapping::{metastate_to_state_map, state_to_metastate_map};
pub use memory::MemoryRepository;
pub use repository::{
    BoardLister, EntityStore, Repository, SpaceLoader, TypeGroupLister, WorkItemTypeLoader,
};
