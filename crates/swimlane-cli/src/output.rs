//! Output formatting for the CLI.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;
use swimlane_core::{
    Board, Change, ChangeSet, EventPayload, WorkEvent, WorkItem, SYSTEM_BOARDCOLUMNS,
    SYSTEM_METASTATE, SYSTEM_STATE, SYSTEM_TITLE,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Print output in the specified format.
pub fn print<T: Serialize + HumanDisplay + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", value.human_display()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Print a list in the specified format.
pub fn print_list<T: Serialize + HumanDisplay>(values: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for value in values {
                println!("{}", value.human_display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(values)?),
    }
    Ok(())
}

/// Print a list of work item summaries with dynamic column widths.
pub fn print_item_list(items: &[WorkItemSummary], format: OutputFormat) -> Result<()> {
    if !matches!(format, OutputFormat::Human) {
        return print_list(items, format);
    }

    if items.is_empty() {
        println!("No work items found.");
        return Ok(());
    }

    let state_width = items.iter().map(|i| i.state.len()).max().unwrap_or(5).max(5);
    let meta_width = items.iter().map(|i| i.metastate.len()).max().unwrap_or(9).max(9);

    println!(
        "{:<36}  {:<state_w$}  {:<meta_w$}  {:>4}  TITLE",
        "ID",
        "STATE",
        "METASTATE",
        "COLS",
        state_w = state_width,
        meta_w = meta_width
    );
    println!("{}", "-".repeat(36 + state_width + meta_width + 20));

    for item in items {
        println!(
            "{:<36}  {:<state_w$}  {:<meta_w$}  {:>4}  {}",
            item.id,
            item.state,
            item.metastate,
            item.columns,
            item.title,
            state_w = state_width,
            meta_w = meta_width
        );
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{message}"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "ok", "message": message }));
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&serde_json::json!({ "status": "ok", "message": message }))?);
        }
    }
    Ok(())
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

impl HumanDisplay for WorkItem {
    fn human_display(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "ID:        {}", self.id);
        let _ = writeln!(out, "Title:     {}", self.title().unwrap_or("(untitled)"));
        let _ = writeln!(out, "State:     {}", self.state().unwrap_or("-"));
        let _ = writeln!(out, "Metastate: {}", self.metastate().unwrap_or("-"));

        let columns = self.board_columns();
        if !columns.is_empty() {
            let _ = writeln!(out, "Columns:   {}", columns.join(", "));
        }

        let _ = writeln!(out, "Type:      {}", self.type_id);
        let _ = writeln!(out, "Space:     {}", self.space_id);
        let _ = writeln!(out, "Version:   {}", self.version);
        let _ = writeln!(out, "Created:   {}", format_time(&self.created_at));
        let _ = writeln!(out, "Updated:   {}", format_time(&self.updated_at));

        let shown = [SYSTEM_TITLE, SYSTEM_STATE, SYSTEM_METASTATE, SYSTEM_BOARDCOLUMNS];
        let others: Vec<_> = self.fields.iter().filter(|(k, _)| !shown.contains(&k.as_str())).collect();
        if !others.is_empty() {
            let _ = writeln!(out, "Fields:");
            for (key, value) in others {
                let _ = writeln!(out, "  {key}: {value}");
            }
        }

        out
    }
}

impl HumanDisplay for WorkEvent {
    fn human_display(&self) -> String {
        let actor = self.actor.as_deref().unwrap_or("system");
        let time = format_time(&self.timestamp);

        format!(
            "[{time}] {actor}: {type} - {payload}",
            type = self.event_type,
            payload = format_payload(&self.payload)
        )
    }
}

impl HumanDisplay for Value {
    fn human_display(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_string())
    }
}

impl HumanDisplay for Change {
    fn human_display(&self) -> String {
        format!(
            "{}: {} → {}",
            self.attribute_name,
            format_value(self.old_value.as_ref()),
            format_value(Some(&self.new_value))
        )
    }
}

impl HumanDisplay for Board {
    fn human_display(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", style(&self.name).bold(), self.id);

        let mut columns: Vec<_> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        for column in columns {
            let rule = match column.rule_argument() {
                Ok(arg) if column.is_bidirectional() => format!("⇄ {}", arg.meta_state),
                _ => column.transition_rule_key.clone(),
            };
            let _ = writeln!(out, "  {:<16} {}  {}", column.name, column.id, style(rule).dim());
        }
        out
    }
}

fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(none)".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_payload(payload: &EventPayload) -> String {
    match payload {
        EventPayload::FieldChange(p) => format!(
            "{}: {} → {}",
            p.field,
            format_value(p.old_value.as_ref()),
            format_value(Some(&p.new_value))
        ),
        EventPayload::Created(p) => p.title.clone(),
    }
}

/// Summary view of a work item for list output.
#[derive(Debug, Serialize)]
pub struct WorkItemSummary {
    pub id: String,
    pub title: String,
    pub state: String,
    pub metastate: String,
    pub columns: usize,
}

impl From<&WorkItem> for WorkItemSummary {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.to_string(),
            title: item.title().unwrap_or_default().to_string(),
            state: item.state().unwrap_or("-").to_string(),
            metastate: item.metastate().unwrap_or("-").to_string(),
            columns: item.board_columns().len(),
        }
    }
}

impl HumanDisplay for WorkItemSummary {
    fn human_display(&self) -> String {
        format!("{:<36} {:12} {:12} {}", self.id, self.state, self.metastate, self.title)
    }
}

/// A work item after an edit, with the changes the rule actions made on top.
#[derive(Debug, Serialize)]
pub struct Reconciled<'a> {
    pub item: &'a WorkItem,
    pub rule_changes: &'a ChangeSet,
}

impl HumanDisplay for Reconciled<'_> {
    fn human_display(&self) -> String {
        let mut out = self.item.human_display();
        if !self.rule_changes.is_empty() {
            let _ = writeln!(out, "{}", style("Rules applied:").cyan().bold());
            for change in self.rule_changes {
                let _ = writeln!(out, "  {}", change.human_display());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_change_display() {
        let change = Change::new(SYSTEM_STATE, Some(json!("new")), "open");
        assert_eq!(change.human_display(), "system.state: new → open");

        let created = Change::new("system.labels", None, json!(["a"]));
        assert_eq!(created.human_display(), r#"system.labels: (none) → ["a"]"#);
    }

    #[test]
    fn test_item_display_hides_system_fields() {
        let item = WorkItem::new(Uuid::new_v4(), Uuid::new_v4(), "Ship it")
            .with_state("open")
            .with_field("custom.points", 3);

        let text = item.human_display();
        assert!(text.contains("State:     open"));
        assert!(text.contains("  custom.points: 3"));
        assert!(!text.contains("  system.state"));
    }
}
