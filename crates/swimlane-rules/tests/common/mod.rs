//! Shared fixture: a five-state task type and one board with four
//! bidirectional columns, plus an unrelated board for another type.

#![allow(dead_code)]

use swimlane_core::{
    Board, BoardColumn, Space, WorkItem, WorkItemType, WorkItemTypeGroup, SYSTEM_METASTATE,
    SYSTEM_STATE,
};
use swimlane_rules::MemoryRepository;
use uuid::Uuid;

pub const STATES: [&str; 5] = ["new", "open", "in progress", "resolved", "closed"];
pub const METASTATES: [&str; 5] = ["mNew", "mOpen", "mInprogress", "mResolved", "mClosed"];

pub struct Fixture {
    pub repo: MemoryRepository<WorkItem>,
    pub task: WorkItemType,
    pub bug: WorkItemType,
    pub space: Space,
    pub board: Board,
    pub other_board: Board,
}

impl Fixture {
    pub fn new() -> Self {
        let template = Uuid::new_v4();
        let task = WorkItemType::new("Task", template)
            .with_enum(SYSTEM_STATE, STATES)
            .with_enum(SYSTEM_METASTATE, METASTATES);
        let bug = WorkItemType::new("Bug", template)
            .with_enum(SYSTEM_STATE, STATES)
            .with_enum(SYSTEM_METASTATE, METASTATES);

        let task_group = WorkItemTypeGroup::new("Tasks", template, vec![task.id]);
        let bug_group = WorkItemTypeGroup::new("Bugs", template, vec![bug.id]);

        let board = Board::for_type_group("Task board", &task_group)
            .with_column(BoardColumn::bidirectional("New", 0, "mNew"))
            .with_column(BoardColumn::bidirectional("InProgress", 1, "mInprogress"))
            .with_column(BoardColumn::bidirectional("Resolved", 2, "mResolved"))
            .with_column(BoardColumn::bidirectional("Approved", 3, "mResolved"));
        let other_board = Board::for_type_group("Bug board", &bug_group)
            .with_column(BoardColumn::bidirectional("Bug new", 0, "mNew"))
            .with_column(BoardColumn::bidirectional("Bug doing", 1, "mInprogress"));

        let space = Space::new("Project", template);

        let repo = MemoryRepository::new()
            .with_space(space.clone())
            .with_type(task.clone())
            .with_type(bug.clone())
            .with_type_group(task_group)
            .with_type_group(bug_group)
            .with_board(board.clone())
            .with_board(other_board.clone());

        Self {
            repo,
            task,
            bug,
            space,
            board,
            other_board,
        }
    }

    /// Identifier of a column on the task board.
    pub fn column(&self, name: &str) -> String {
        self.board
            .columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.to_string())
            .unwrap_or_else(|| panic!("no column {name}"))
    }

    /// Identifier of a column on the bug board.
    pub fn other_column(&self, name: &str) -> String {
        self.other_board
            .columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.to_string())
            .unwrap_or_else(|| panic!("no column {name}"))
    }

    /// A stored task at `new`/`mNew` sitting in the `New` column.
    pub fn new_task(&self) -> WorkItem {
        let item = WorkItem::new(self.task.id, self.space.id, "Write docs")
            .with_state("new")
            .with_metastate("mNew")
            .with_board_columns([self.column("New")]);
        self.repo.insert(item.clone());
        item
    }
}
