//! In-memory collaborators, for tests and embedding without a storage backend.

use crate::repository::{BoardLister, EntityStore, SpaceLoader, TypeGroupLister, WorkItemTypeLoader};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use swimlane_core::{Board, CoreError, Result, Space, Trackable, WorkItemType, WorkItemTypeGroup};
use uuid::Uuid;

/// Keeps every definition and entity in maps.
///
/// Not thread-safe: reconciliation runs single-threaded per invocation.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    spaces: BTreeMap<Uuid, Space>,
    types: BTreeMap<Uuid, WorkItemType>,
    boards: Vec<Board>,
    groups: Vec<WorkItemTypeGroup>,
    entities: RefCell<BTreeMap<Uuid, E>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl<E: Trackable> MemoryRepository<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            spaces: BTreeMap::new(),
            types: BTreeMap::new(),
            boards: Vec::new(),
            groups: Vec::new(),
            entities: RefCell::new(BTreeMap::new()),
            saves: Cell::new(0),
            fail_saves: Cell::new(false),
        }
    }

    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.insert(space.id, space);
        self
    }

    #[must_use]
    pub fn with_type(mut self, wit: WorkItemType) -> Self {
        self.types.insert(wit.id, wit);
        self
    }

    #[must_use]
    /// Add a board, replacing any board with the same id.
    pub fn with_board(mut self, board: Board) -> Self {
        self.boards.retain(|b| b.id != board.id);
        self.boards.push(board);
        self
    }

    #[must_use]
    pub fn with_type_group(mut self, group: WorkItemTypeGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Store an entity without counting it as a save.
    pub fn insert(&self, entity: E) {
        self.entities.borrow_mut().insert(entity.id(), entity);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Make every following save fail with an internal error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl<E: Trackable> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SpaceLoader for MemoryRepository<E> {
    fn space_template_id(&self, space_id: Uuid) -> Result<Uuid> {
        self.spaces
            .get(&space_id)
            .map(|s| s.space_template_id)
            .ok_or_else(|| CoreError::not_found("space", space_id))
    }
}

impl<E> BoardLister for MemoryRepository<E> {
    fn boards_for_template(&self, space_template_id: Uuid) -> Result<Vec<Board>> {
        Ok(self
            .boards
            .iter()
            .filter(|b| b.space_template_id == space_template_id)
            .cloned()
            .collect())
    }
}

impl<E> TypeGroupLister for MemoryRepository<E> {
    fn type_groups_for_template(&self, space_template_id: Uuid) -> Result<Vec<WorkItemTypeGroup>> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.space_template_id == space_template_id)
            .cloned()
            .collect())
    }
}

impl<E> WorkItemTypeLoader for MemoryRepository<E> {
    fn load_type(&self, type_id: Uuid) -> Result<WorkItemType> {
        self.types
            .get(&type_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("work item type", type_id))
    }
}

impl<E: Trackable> EntityStore<E> for MemoryRepository<E> {
    fn load(&self, id: Uuid) -> Result<E> {
        self.entities
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("work item", id))
    }

    fn save(&self, entity: E, _actor: &str) -> Result<E> {
        if self.fail_saves.get() {
            return Err(CoreError::Internal(format!("save of {} rejected", entity.id())));
        }
        self.entities.borrow_mut().insert(entity.id(), entity.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(entity)
    }
}
