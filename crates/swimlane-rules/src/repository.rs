//! Contracts for the persistence collaborators the engine consumes.
//!
//! The engine never assumes a storage backend: it only loads definitions and
//! saves the entity it reconciled through these traits.

use swimlane_core::{Board, Result, WorkItemType, WorkItemTypeGroup};
use uuid::Uuid;

/// Resolves a space to the template its boards and type groups hang off.
pub trait SpaceLoader {
    /// # Errors
    /// Returns `CoreError::NotFound` if the space does not exist.
    fn space_template_id(&self, space_id: Uuid) -> Result<Uuid>;
}

/// Lists the boards defined for a space template.
pub trait BoardLister {
    /// # Errors
    /// Returns an error if the boards cannot be read.
    fn boards_for_template(&self, space_template_id: Uuid) -> Result<Vec<Board>>;
}

/// Lists the work item type groups defined for a space template.
pub trait TypeGroupLister {
    /// # Errors
    /// Returns an error if the groups cannot be read.
    fn type_groups_for_template(&self, space_template_id: Uuid) -> Result<Vec<WorkItemTypeGroup>>;
}

/// Loads work item type definitions.
pub trait WorkItemTypeLoader {
    /// # Errors
    /// Returns `CoreError::NotFound` if the type does not exist.
    fn load_type(&self, type_id: Uuid) -> Result<WorkItemType>;
}

/// Loads and saves tracked entities.
pub trait EntityStore<E> {
    /// # Errors
    /// Returns `CoreError::NotFound` if no entity has this id.
    fn load(&self, id: Uuid) -> Result<E>;

    /// Persist an entity on behalf of `actor` and return the stored copy.
    ///
    /// # Errors
    /// Returns `CoreError::VersionConflict` if the entity changed since it was
    /// loaded, or `CoreError::Internal` if writing fails.
    fn save(&self, entity: E, actor: &str) -> Result<E>;
}

/// Everything the standard actions need from the outside world.
pub trait Repository<E>:
    SpaceLoader + BoardLister + TypeGroupLister + WorkItemTypeLoader + EntityStore<E>
{
}

impl<E, T> Repository<E> for T where
    T: SpaceLoader + BoardLister + TypeGroupLister + WorkItemTypeLoader + EntityStore<E>
{
}
