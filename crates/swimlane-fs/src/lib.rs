//! Filesystem backend for swimlane workspaces.
//!
//! Definitions live as YAML documents under `work/` (spaces, types, boards,
//! type groups). Each work item is a directory with:
//! - `meta.yml`: Item fields and version
//! - `events.ndjson`: Append-only event log
//!
//! [`Workspace`] implements every collaborator the rule engine needs, so an
//! `ActionEngine` can run directly against a workspace on disk.

pub mod config;
pub mod error;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use error::{FsError, Result};
pub use workspace::{ItemFilter, Sample, Workspace};
