//! CLI command implementations.

use crate::output::{self, OutputFormat, Reconciled, WorkItemSummary};
use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use console::style;
use std::path::Path;
use swimlane_core::{
    apply_set_operations, BoardColumn, ChangeDetector, FieldBag, SetOperation, WorkItem,
    SYSTEM_BOARDCOLUMNS,
};
use swimlane_fs::{ItemFilter, Workspace};
use swimlane_rules::{columns, ActionConfig, ActionEngine, BoardLister, SpaceLoader};
use uuid::Uuid;

/// Initialize a new workspace, optionally with the sample template.
pub fn init(path: &Path, sample: Option<&str>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::init(path).context("Failed to initialize workspace")?;

    let Some(name) = sample else {
        return output::print_success(&format!("Initialized workspace at {}", path.display()), format);
    };

    let sample = ws.seed_sample(name).context("Failed to write sample template")?;
    if matches!(format, OutputFormat::Human) {
        println!("Initialized workspace at {}", path.display());
        println!("  space: {} ({})", sample.space.name, sample.space.id);
        println!("  type:  {} ({})", sample.task_type.name, sample.task_type.id);
        println!();
        output::print(&sample.board, format)
    } else {
        output::print(
            &serde_json::json!({
                "space": sample.space,
                "type": sample.task_type,
                "group": sample.group,
                "board": sample.board,
            }),
            format,
        )
    }
}

/// Create a new work item and run the configured actions on it.
pub fn new_item(
    path: &Path,
    title: &str,
    type_id: Uuid,
    space_id: Uuid,
    state: Option<String>,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let actor = actor.unwrap_or(&ws.config().workspace.actor).to_string();

    ws.get_type(type_id).context("Unknown work item type")?;
    ws.get_space(space_id).context("Unknown space")?;

    let mut item = WorkItem::new(type_id, space_id, title);
    if let Some(state) = state {
        item = item.with_state(state);
    }
    ws.create_item(&item, &actor).context("Failed to create item")?;

    let changes = item.change_set(None)?;
    let (item, rule_changes) = engine(&ws, &actor)
        .execute_by_changeset(item, &changes, &ws.config().actions)
        .context("Rule actions failed")?;

    output::print(&Reconciled { item: &item, rule_changes: &rule_changes }, format)
}

/// List work items.
pub fn list(
    path: &Path,
    state: Option<String>,
    type_id: Option<Uuid>,
    column: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;

    let filter = if state.is_some() || type_id.is_some() || column.is_some() {
        Some(ItemFilter { state, type_id, column })
    } else {
        None
    };

    let items = ws.list_items(filter.as_ref()).context("Failed to list items")?;

    let summaries: Vec<WorkItemSummary> = items.iter().map(WorkItemSummary::from).collect();
    output::print_item_list(&summaries, format)
}

/// Show a work item.
pub fn show(path: &Path, id: Uuid, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let item = ws.get_item(id).context("Failed to get item")?;
    output::print(&item, format)
}

/// Set field values on a work item, then reconcile.
pub fn set(path: &Path, id: Uuid, assignments: &[String], actor: Option<&str>, format: OutputFormat) -> Result<()> {
    let operations: Vec<SetOperation> = assignments
        .iter()
        .map(|a| SetOperation::parse(a))
        .collect::<swimlane_core::Result<Vec<_>>>()
        .context("Failed to parse assignments")?;

    edit(path, id, actor, format, |item| {
        apply_set_operations(item, &operations);
        Ok(())
    })
}

/// Put a work item into a board column, then reconcile.
pub fn enter_column(path: &Path, id: Uuid, column: &str, actor: Option<&str>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let column = find_column(&ws, id, column)?;

    edit(path, id, actor, format, |item| {
        let mut current = item.board_columns();
        if columns::insert_unique(&mut current, &column.id.to_string()) {
            item.set_field(SYSTEM_BOARDCOLUMNS, current.into());
        }
        Ok(())
    })
}

/// Take a work item out of a board column, then reconcile.
pub fn leave_column(path: &Path, id: Uuid, column: &str, actor: Option<&str>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let column = find_column(&ws, id, column)?;

    edit(path, id, actor, format, |item| {
        let mut current = item.board_columns();
        if !columns::remove_all(&mut current, &column.id.to_string()) {
            bail!("Item is not in column '{}'", column.name);
        }
        item.set_field(SYSTEM_BOARDCOLUMNS, current.into());
        Ok(())
    })
}

/// Run explicit actions on a stored item, treating all of its fields as changed.
pub fn run(path: &Path, id: Uuid, actions: &[String], actor: Option<&str>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let actor = actor.unwrap_or(&ws.config().workspace.actor).to_string();

    let config = if actions.is_empty() {
        ws.config().actions.clone()
    } else {
        parse_actions(actions)
    };

    let item = ws.get_item(id).context("Failed to get item")?;
    let changes = item.change_set(None)?;
    let (item, rule_changes) = engine(&ws, &actor)
        .execute_by_changeset(item, &changes, &config)
        .context("Rule actions failed")?;

    output::print(&Reconciled { item: &item, rule_changes: &rule_changes }, format)
}

/// Show event history.
pub fn events(path: &Path, id: Uuid, since_days: Option<u32>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;

    let since = since_days.map(|days| Utc::now() - Duration::days(i64::from(days)));

    let events = ws.read_events(id, since).context("Failed to read events")?;

    if events.is_empty() {
        return output::print_success("No events found", format);
    }

    output::print_list(&events, format)
}

/// Show boards and their columns.
pub fn boards(path: &Path, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let boards = ws.list_boards().context("Failed to list boards")?;

    if boards.is_empty() {
        return output::print_success("No boards defined", format);
    }

    output::print_list(&boards, format)
}

fn engine<'a>(ws: &'a Workspace, actor: &str) -> ActionEngine<'a, WorkItem> {
    ActionEngine::new(ws, actor).with_settings(ws.config().rules.clone())
}

/// Load an item, edit it, save the edit, then let the configured actions
/// reconcile the result against the version that was loaded.
fn edit<F>(path: &Path, id: Uuid, actor: Option<&str>, format: OutputFormat, apply: F) -> Result<()>
where
    F: FnOnce(&mut WorkItem) -> Result<()>,
{
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let actor = actor.unwrap_or(&ws.config().workspace.actor).to_string();

    let old = ws.get_item(id).context("Failed to get item")?;
    let mut new = old.clone();
    apply(&mut new)?;

    if new.change_set(Some(&old))?.is_empty() {
        output::print_success("Nothing changed", format)?;
        return Ok(());
    }

    let saved = ws.save_item(new, &actor).context("Failed to save item")?;
    let (item, rule_changes) = engine(&ws, &actor)
        .execute_by_old_new(Some(&old), Some(saved), &ws.config().actions)
        .context("Rule actions failed")?;

    if matches!(format, OutputFormat::Human) && !rule_changes.is_empty() {
        println!("{}", style(format!("  {} rule change(s)", rule_changes.len())).green().bold());
    }
    output::print(&Reconciled { item: &item, rule_changes: &rule_changes }, format)
}

/// Resolve a column by id or name on the boards of the item's space template.
fn find_column(ws: &Workspace, id: Uuid, column: &str) -> Result<BoardColumn> {
    let item = ws.get_item(id).context("Failed to get item")?;
    let template = ws.space_template_id(item.space_id)?;

    ws.boards_for_template(template)?
        .into_iter()
        .flat_map(|b| b.columns)
        .find(|c| c.id.to_string() == column || c.name.eq_ignore_ascii_case(column))
        .with_context(|| format!("No column '{column}' on the boards of space {}", item.space_id))
}

/// Parse `KEY` or `KEY=CONFIG` action arguments.
fn parse_actions(actions: &[String]) -> ActionConfig {
    actions
        .iter()
        .map(|a| match a.split_once('=') {
            Some((key, config)) => (key.trim().to_string(), config.to_string()),
            None => (a.trim().to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        let config = parse_actions(&[
            "Nil".to_string(),
            r#"FieldSet={"system.state":"open"}"#.to_string(),
        ]);

        let entries: Vec<_> = config.iter().collect();
        assert_eq!(entries, vec![("FieldSet", r#"{"system.state":"open"}"#), ("Nil", "")]);
    }

    #[test]
    fn test_unchanged_edit_is_not_saved() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let sample = ws.seed_sample("Demo").unwrap();
        let item = WorkItem::new(sample.task_type.id, sample.space.id, "Ship it").with_state("new");
        ws.create_item(&item, "alice").unwrap();

        set(tmp.path(), item.id, &["system.state=new".to_string()], None, OutputFormat::Json).unwrap();

        assert_eq!(ws.get_item(item.id).unwrap().version, 0);
    }

    #[test]
    fn test_enter_column_by_name_reconciles() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let sample = ws.seed_sample("Demo").unwrap();
        let item = WorkItem::new(sample.task_type.id, sample.space.id, "Ship it")
            .with_state("new")
            .with_metastate("mNew");
        ws.create_item(&item, "alice").unwrap();

        enter_column(tmp.path(), item.id, "inprogress", None, OutputFormat::Json).unwrap();

        let stored = ws.get_item(item.id).unwrap();
        assert_eq!(stored.state(), Some("in progress"));
        assert_eq!(stored.metastate(), Some("mInprogress"));
    }
}
