//! Workspace management: definitions, work items and their event logs.

use crate::config::WorkspaceConfig;
use crate::error::{FsError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use swimlane_core::{
    Board, BoardColumn, ChangeDetector, Space, WorkEvent, WorkItem, WorkItemType,
    WorkItemTypeGroup, SYSTEM_METASTATE, SYSTEM_STATE,
};
use swimlane_rules::{BoardLister, EntityStore, SpaceLoader, TypeGroupLister, WorkItemTypeLoader};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Directory name for swimlane configuration.
const SWIMLANE_DIR: &str = ".swimlane";
/// Configuration file name.
const CONFIG_FILE: &str = "config.yml";
/// Spaces directory name.
const SPACES_DIR: &str = "work/spaces";
/// Work item types directory name.
const TYPES_DIR: &str = "work/types";
/// Boards directory name.
const BOARDS_DIR: &str = "work/boards";
/// Work item type groups directory name.
const GROUPS_DIR: &str = "work/type-groups";
/// Items directory name.
const ITEMS_DIR: &str = "work/items";
/// Meta file name within item directory.
const META_FILE: &str = "meta.yml";
/// Events file name within item directory.
const EVENTS_FILE: &str = "events.ndjson";

/// A workspace stores definitions and work items on the filesystem.
#[derive(Debug)]
pub struct Workspace {
    /// Root path of the workspace.
    root: PathBuf,
    /// Workspace configuration.
    config: WorkspaceConfig,
}

impl Workspace {
    /// Initialize a new workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace already exists or IO fails.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let swimlane_dir = root.join(SWIMLANE_DIR);

        if swimlane_dir.exists() {
            return Err(FsError::WorkspaceExists(root));
        }

        // Create directory structure
        fs::create_dir_all(&swimlane_dir)?;
        for dir in [SPACES_DIR, TYPES_DIR, BOARDS_DIR, GROUPS_DIR, ITEMS_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }

        // Write default config
        let config = WorkspaceConfig::default();
        write_doc(&swimlane_dir.join(CONFIG_FILE), &config)?;

        info!(path = %root.display(), "Initialized workspace");

        Ok(Self { root, config })
    }

    /// Open an existing workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace doesn't exist or config is invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let config_path = root.join(SWIMLANE_DIR).join(CONFIG_FILE);

        if !config_path.exists() {
            return Err(FsError::WorkspaceNotFound(root));
        }

        let config: WorkspaceConfig = read_doc(&config_path)?;

        debug!(path = %root.display(), "Opened workspace");

        Ok(Self { root, config })
    }

    /// Get the workspace root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the workspace configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    fn doc_path(&self, dir: &str, id: Uuid) -> PathBuf {
        self.root.join(dir).join(format!("{id}.yml"))
    }

    fn item_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(ITEMS_DIR).join(id.to_string())
    }

    fn read_definition<T: DeserializeOwned>(&self, dir: &str, kind: &'static str, id: Uuid) -> Result<T> {
        let path = self.doc_path(dir, id);
        if !path.exists() {
            return Err(FsError::NotFound { kind, id: id.to_string() });
        }
        read_doc(&path)
    }

    // Definitions

    /// Store or replace a space.
    pub fn put_space(&self, space: &Space) -> Result<()> {
        write_doc(&self.doc_path(SPACES_DIR, space.id), space)
    }

    /// Store or replace a work item type.
    pub fn put_type(&self, wit: &WorkItemType) -> Result<()> {
        write_doc(&self.doc_path(TYPES_DIR, wit.id), wit)
    }

    /// Store or replace a board.
    pub fn put_board(&self, board: &Board) -> Result<()> {
        write_doc(&self.doc_path(BOARDS_DIR, board.id), board)
    }

    /// Store or replace a work item type group.
    pub fn put_type_group(&self, group: &WorkItemTypeGroup) -> Result<()> {
        write_doc(&self.doc_path(GROUPS_DIR, group.id), group)
    }

    pub fn get_space(&self, id: Uuid) -> Result<Space> {
        self.read_definition(SPACES_DIR, "space", id)
    }

    pub fn get_type(&self, id: Uuid) -> Result<WorkItemType> {
        self.read_definition(TYPES_DIR, "work item type", id)
    }

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        list_docs(&self.root.join(BOARDS_DIR))
    }

    pub fn list_type_groups(&self) -> Result<Vec<WorkItemTypeGroup>> {
        list_docs(&self.root.join(GROUPS_DIR))
    }

    /// Write the canonical five-state template: one task type, a type group
    /// holding it, a board with four bidirectional columns and one space.
    ///
    /// # Errors
    /// Returns error if any document cannot be written.
    pub fn seed_sample(&self, name: &str) -> Result<Sample> {
        let template = Uuid::new_v4();
        let task_type = WorkItemType::new("Task", template)
            .with_enum(SYSTEM_STATE, ["new", "open", "in progress", "resolved", "closed"])
            .with_enum(
                SYSTEM_METASTATE,
                ["mNew", "mOpen", "mInprogress", "mResolved", "mClosed"],
            );
        let group = WorkItemTypeGroup::new("Work items", template, vec![task_type.id]);
        let board = Board::for_type_group("Work Items Board", &group)
            .with_column(BoardColumn::bidirectional("New", 0, "mNew"))
            .with_column(BoardColumn::bidirectional("InProgress", 1, "mInprogress"))
            .with_column(BoardColumn::bidirectional("Resolved", 2, "mResolved"))
            .with_column(BoardColumn::bidirectional("Approved", 3, "mResolved"));
        let space = Space::new(name, template);

        self.put_type(&task_type)?;
        self.put_type_group(&group)?;
        self.put_board(&board)?;
        self.put_space(&space)?;

        info!(space = %space.id, template = %template, "Seeded sample template");

        Ok(Sample {
            space,
            task_type,
            group,
            board,
        })
    }

    // Work items

    /// Store a new work item and log its creation.
    ///
    /// # Errors
    /// Returns error if the item already exists or IO fails.
    pub fn create_item(&self, item: &WorkItem, actor: &str) -> Result<()> {
        let item_dir = self.item_dir(item.id);
        if item_dir.exists() {
            return Err(FsError::ItemExists(item.id.to_string()));
        }

        fs::create_dir_all(&item_dir)?;
        self.write_meta(item)?;

        let title = item.title().unwrap_or_default();
        self.append_event(item.id, &WorkEvent::created(title).with_actor(actor))?;
        for change in &item.change_set(None)? {
            self.append_event(item.id, &WorkEvent::from_change(change).with_actor(actor))?;
        }

        info!(id = %item.id, title = %title, "Created work item");

        Ok(())
    }

    /// Get a work item by id.
    ///
    /// # Errors
    /// Returns error if item doesn't exist or meta is invalid.
    pub fn get_item(&self, id: Uuid) -> Result<WorkItem> {
        let meta_path = self.item_dir(id).join(META_FILE);
        if !meta_path.exists() {
            return Err(FsError::NotFound {
                kind: "work item",
                id: id.to_string(),
            });
        }
        read_doc(&meta_path)
    }

    /// List all work items, optionally filtered.
    pub fn list_items(&self, filter: Option<&ItemFilter>) -> Result<Vec<WorkItem>> {
        let items_dir = self.root.join(ITEMS_DIR);
        if !items_dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();

        for entry in fs::read_dir(&items_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let meta_path = entry.path().join(META_FILE);
            if !meta_path.exists() {
                continue;
            }

            match read_doc::<WorkItem>(&meta_path) {
                Ok(item) => {
                    if filter.is_none_or(|f| f.matches(&item)) {
                        items.push(item);
                    }
                }
                Err(e) => {
                    debug!(path = %meta_path.display(), error = %e, "Failed to read item, skipping");
                }
            }
        }

        // Sort by updated_at descending
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(items)
    }

    /// Persist a modified work item.
    ///
    /// The item must carry the version currently on disk; the stored copy gets
    /// the next version, and one event per changed field is appended.
    ///
    /// # Errors
    /// Returns `FsError::VersionConflict` if the item changed on disk since
    /// it was loaded, or an IO error.
    pub fn save_item(&self, mut item: WorkItem, actor: &str) -> Result<WorkItem> {
        let stored = self.get_item(item.id)?;
        if stored.version != item.version {
            warn!(id = %item.id, expected = item.version, found = stored.version, "Version conflict");
            return Err(FsError::VersionConflict {
                id: item.id.to_string(),
                expected: item.version,
                found: stored.version,
            });
        }

        let changes = item.change_set(Some(&stored))?;
        if changes.is_empty() {
            debug!(id = %item.id, "Nothing to save");
            return Ok(stored);
        }

        item.version += 1;
        item.touch();
        self.write_meta(&item)?;

        for change in &changes {
            self.append_event(item.id, &WorkEvent::from_change(change).with_actor(actor))?;
        }

        info!(id = %item.id, version = item.version, changes = changes.len(), "Saved work item");

        Ok(item)
    }

    /// Append an event to an item's event log.
    pub fn append_event(&self, id: Uuid, event: &WorkEvent) -> Result<()> {
        let events_path = self.item_dir(id).join(EVENTS_FILE);

        let mut file = OpenOptions::new().create(true).append(true).open(&events_path)?;

        let json_line = serde_json::to_string(event)?;
        writeln!(file, "{json_line}")?;

        debug!(id = %id, event_type = %event.event_type, "Appended event");

        Ok(())
    }

    /// Read events for an item, optionally filtered by time.
    pub fn read_events(&self, id: Uuid, since: Option<DateTime<Utc>>) -> Result<Vec<WorkEvent>> {
        let events_path = self.item_dir(id).join(EVENTS_FILE);

        if !events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&events_path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event: WorkEvent = serde_json::from_str(&line)?;

            if since.is_none_or(|s| event.timestamp >= s) {
                events.push(event);
            }
        }

        Ok(events)
    }

    // Private helpers

    fn write_meta(&self, item: &WorkItem) -> Result<()> {
        write_doc(&self.item_dir(item.id).join(META_FILE), item)
    }
}

/// Documents written by [`Workspace::seed_sample`].
#[derive(Debug, Clone)]
pub struct Sample {
    pub space: Space,
    pub task_type: WorkItemType,
    pub group: WorkItemTypeGroup,
    pub board: Board,
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Write via a sibling temp file and rename, so readers never see a partial document.
fn write_doc<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value)?;
    let tmp = path.with_extension("yml.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn list_docs<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let is_doc = entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "yml");
        if is_doc {
            docs.push(read_doc(entry.path())?);
        }
    }
    Ok(docs)
}

impl SpaceLoader for Workspace {
    fn space_template_id(&self, space_id: Uuid) -> swimlane_core::Result<Uuid> {
        Ok(self.get_space(space_id)?.space_template_id)
    }
}

impl BoardLister for Workspace {
    fn boards_for_template(&self, space_template_id: Uuid) -> swimlane_core::Result<Vec<Board>> {
        let mut boards = self.list_boards()?;
        boards.retain(|b| b.space_template_id == space_template_id);
        Ok(boards)
    }
}

impl TypeGroupLister for Workspace {
    fn type_groups_for_template(&self, space_template_id: Uuid) -> swimlane_core::Result<Vec<WorkItemTypeGroup>> {
        let mut groups = self.list_type_groups()?;
        groups.retain(|g| g.space_template_id == space_template_id);
        Ok(groups)
    }
}

impl WorkItemTypeLoader for Workspace {
    fn load_type(&self, type_id: Uuid) -> swimlane_core::Result<WorkItemType> {
        Ok(self.get_type(type_id)?)
    }
}

impl EntityStore<WorkItem> for Workspace {
    fn load(&self, id: Uuid) -> swimlane_core::Result<WorkItem> {
        Ok(self.get_item(id)?)
    }

    fn save(&self, entity: WorkItem, actor: &str) -> swimlane_core::Result<WorkItem> {
        Ok(self.save_item(entity, actor)?)
    }
}

/// Filter criteria for listing work items.
#[derive(Debug, Default)]
pub struct ItemFilter {
    /// Filter by state.
    pub state: Option<String>,
    /// Filter by work item type.
    pub type_id: Option<Uuid>,
    /// Filter by board column (item must occupy it).
    pub column: Option<String>,
}

impl ItemFilter {
    /// Check if an item matches this filter.
    #[must_use]
    pub fn matches(&self, item: &WorkItem) -> bool {
        if let Some(state) = &self.state {
            if !item.state().is_some_and(|s| s.eq_ignore_ascii_case(state)) {
                return false;
            }
        }

        if let Some(type_id) = self.type_id {
            if item.type_id != type_id {
                return false;
            }
        }

        if let Some(column) = &self.column {
            if !item.board_columns().contains(column) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swimlane_core::EventType;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace, Sample) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let sample = ws.seed_sample("Demo").unwrap();
        (tmp, ws, sample)
    }

    fn task(sample: &Sample) -> WorkItem {
        WorkItem::new(sample.task_type.id, sample.space.id, "Implement auth redirect")
            .with_state("new")
            .with_metastate("mNew")
    }

    #[test]
    fn test_init_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".swimlane/config.yml").exists());
        assert!(tmp.path().join("work/items").exists());
        assert!(tmp.path().join("work/boards").exists());
        assert_eq!(ws.config().version, 1);
    }

    #[test]
    fn test_init_existing_fails() {
        let tmp = TempDir::new().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let result = Workspace::init(tmp.path());
        assert!(matches!(result, Err(FsError::WorkspaceExists(_))));
    }

    #[test]
    fn test_open_missing_workspace() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(Workspace::open(tmp.path()), Err(FsError::WorkspaceNotFound(_))));
    }

    #[test]
    fn test_seeded_definitions_resolve() {
        let (_tmp, ws, sample) = setup();

        assert_eq!(ws.space_template_id(sample.space.id).unwrap(), sample.group.space_template_id);
        assert_eq!(ws.boards_for_template(sample.group.space_template_id).unwrap(), vec![sample.board.clone()]);
        assert_eq!(ws.type_groups_for_template(sample.group.space_template_id).unwrap().len(), 1);
        assert!(ws.boards_for_template(Uuid::new_v4()).unwrap().is_empty());
        assert_eq!(ws.load_type(sample.task_type.id).unwrap(), sample.task_type);
    }

    #[test]
    fn test_create_and_get_item() {
        let (_tmp, ws, sample) = setup();
        let item = task(&sample);

        ws.create_item(&item, "alice").unwrap();

        assert_eq!(ws.get_item(item.id).unwrap(), item);
        assert!(matches!(ws.create_item(&item, "alice"), Err(FsError::ItemExists(_))));
    }

    #[test]
    fn test_missing_item_is_not_found() {
        let (_tmp, ws, _sample) = setup();

        let err: swimlane_core::CoreError = ws.get_item(Uuid::new_v4()).unwrap_err().into();
        assert_eq!(err.kind(), swimlane_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_save_bumps_version_and_logs_events() {
        let (_tmp, ws, sample) = setup();
        let item = task(&sample);
        ws.create_item(&item, "alice").unwrap();

        let saved = ws.save_item(item.clone().with_state("open"), "bob").unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(ws.get_item(item.id).unwrap().state(), Some("open"));

        let events = ws.read_events(item.id, None).unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.event_type, EventType::StateChanged);
        assert_eq!(last.actor.as_deref(), Some("bob"));
    }

    #[test]
    fn test_save_rejects_stale_version() {
        let (_tmp, ws, sample) = setup();
        let item = task(&sample);
        ws.create_item(&item, "alice").unwrap();
        ws.save_item(item.clone().with_state("open"), "alice").unwrap();

        let stale = item.with_state("closed");
        let err = ws.save_item(stale, "bob").unwrap_err();
        assert!(matches!(err, FsError::VersionConflict { expected: 0, found: 1, .. }));
    }

    #[test]
    fn test_save_without_changes_keeps_version() {
        let (_tmp, ws, sample) = setup();
        let item = task(&sample);
        ws.create_item(&item, "alice").unwrap();

        let saved = ws.save_item(item.clone(), "alice").unwrap();
        assert_eq!(saved.version, 0);
    }

    #[test]
    fn test_list_with_filter() {
        let (_tmp, ws, sample) = setup();
        let column = sample.board.columns[0].id.to_string();

        ws.create_item(&task(&sample).with_board_columns([column.clone()]), "alice").unwrap();
        ws.create_item(&task(&sample).with_state("open"), "alice").unwrap();

        assert_eq!(ws.list_items(None).unwrap().len(), 2);

        let by_state = ItemFilter {
            state: Some("OPEN".to_string()),
            ..Default::default()
        };
        assert_eq!(ws.list_items(Some(&by_state)).unwrap().len(), 1);

        let by_column = ItemFilter {
            column: Some(column),
            ..Default::default()
        };
        let items = ws.list_items(Some(&by_column)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].state(), Some("new"));
    }

    #[test]
    fn test_creation_events() {
        let (_tmp, ws, sample) = setup();
        let item = task(&sample);
        ws.create_item(&item, "alice").unwrap();

        let events = ws.read_events(item.id, None).unwrap();
        let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::Created,
                EventType::StateChanged,
                EventType::MetastateChanged,
                EventType::FieldChanged
            ]
        );
    }
}
