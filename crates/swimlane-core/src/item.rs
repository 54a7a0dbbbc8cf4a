//! Work item model and the field-bag capability the rule engine works against.

use crate::change::{diff_fields, ChangeDetector, ChangeSet};
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Workflow state, a free-form string from the type's state enumeration.
pub const SYSTEM_STATE: &str = "system.state";
/// Coarse status bucket derived from the state.
pub const SYSTEM_METASTATE: &str = "system.metastate";
/// Identifiers of the board columns the item occupies.
pub const SYSTEM_BOARDCOLUMNS: &str = "system.boardcolumns";
/// Human-readable title.
pub const SYSTEM_TITLE: &str = "system.title";
/// Categorization labels.
pub const SYSTEM_LABELS: &str = "system.labels";

/// Named field access over an entity.
pub trait FieldBag {
    /// Current value of a field, if set.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Set a field and return its previous value.
    fn set_field(&mut self, name: &str, value: Value) -> Option<Value>;

    /// Read a field that must hold a string when present.
    ///
    /// # Errors
    /// Returns `CoreError::CapabilityMismatch` if the value is not a string.
    fn string_field(&self, name: &str) -> Result<Option<&str>> {
        match self.field(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(CoreError::mismatch(name, format!("expected a string, found {other}"))),
        }
    }

    /// Read a field that must hold a list of strings when present.
    ///
    /// # Errors
    /// Returns `CoreError::CapabilityMismatch` if the value is not a list of strings.
    fn string_list_field(&self, name: &str) -> Result<Vec<String>> {
        match self.field(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(String::from)
                        .ok_or_else(|| CoreError::mismatch(name, format!("expected string entries, found {v}")))
                })
                .collect(),
            Some(other) => Err(CoreError::mismatch(name, format!("expected a list, found {other}"))),
        }
    }
}

/// An entity the rule engine can reconcile.
pub trait Trackable: FieldBag + ChangeDetector + Clone {
    /// Identity of the entity.
    fn id(&self) -> Uuid;

    /// The work item type that defines its fields.
    fn item_type_id(&self) -> Uuid;

    /// The space the entity lives in.
    fn space_id(&self) -> Uuid;
}

/// A work item: a task, bug, feature or other trackable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    /// Unique identifier.
    pub id: Uuid,

    /// Work item type reference.
    pub type_id: Uuid,

    /// Space reference.
    pub space_id: Uuid,

    /// Optimistic concurrency version, bumped on every save.
    #[serde(default)]
    pub version: u64,

    /// Creation timestamp (ISO 8601 UTC).
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (ISO 8601 UTC).
    pub updated_at: DateTime<Utc>,

    /// Field values keyed by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl WorkItem {
    /// Create a new work item with only a title set.
    #[must_use]
    pub fn new(type_id: Uuid, space_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            type_id,
            space_id,
            version: 0,
            created_at: now,
            updated_at: now,
            fields: BTreeMap::new(),
        }
        .with_field(SYSTEM_TITLE, title.into())
    }

    /// Set a field value.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_state(self, state: impl Into<String>) -> Self {
        self.with_field(SYSTEM_STATE, state.into())
    }

    #[must_use]
    pub fn with_metastate(self, metastate: impl Into<String>) -> Self {
        self.with_field(SYSTEM_METASTATE, metastate.into())
    }

    #[must_use]
    pub fn with_board_columns(self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let columns: Vec<Value> = columns.into_iter().map(|c| Value::String(c.into())).collect();
        self.with_field(SYSTEM_BOARDCOLUMNS, columns)
    }

    /// Title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.fields.get(SYSTEM_TITLE).and_then(Value::as_str)
    }

    /// Current state, if set to a string.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.fields.get(SYSTEM_STATE).and_then(Value::as_str)
    }

    /// Current metastate, if set to a string.
    #[must_use]
    pub fn metastate(&self) -> Option<&str> {
        self.fields.get(SYSTEM_METASTATE).and_then(Value::as_str)
    }

    /// Columns the item occupies; non-string entries are skipped.
    #[must_use]
    pub fn board_columns(&self) -> Vec<String> {
        self.fields
            .get(SYSTEM_BOARDCOLUMNS)
            .and_then(Value::as_array)
            .map(|cols| cols.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl FieldBag for WorkItem {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<Value> {
        self.fields.insert(name.to_string(), value)
    }
}

impl ChangeDetector for WorkItem {
    fn change_set(&self, older: Option<&Self>) -> Result<ChangeSet> {
        if let Some(older) = older {
            if older.id != self.id {
                return Err(CoreError::InvalidArgument(format!(
                    "cannot compare work item {} with {}",
                    self.id, older.id
                )));
            }
        }
        Ok(diff_fields(&self.fields, older.map(|o| &o.fields)))
    }
}

impl Trackable for WorkItem {
    fn id(&self) -> Uuid {
        self.id
    }

    fn item_type_id(&self) -> Uuid {
        self.type_id
    }

    fn space_id(&self) -> Uuid {
        self.space_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn item() -> WorkItem {
        WorkItem::new(Uuid::new_v4(), Uuid::new_v4(), "Test")
            .with_state("new")
            .with_metastate("mNew")
            .with_board_columns(["col-a", "col-b"])
    }

    #[test]
    fn test_new_work_item() {
        let item = WorkItem::new(Uuid::nil(), Uuid::nil(), "Test Item");

        assert_eq!(item.title(), Some("Test Item"));
        assert_eq!(item.version, 0);
        assert!(item.state().is_none());
        assert!(item.board_columns().is_empty());
    }

    #[test]
    fn test_change_set_against_itself_is_empty() {
        let item = item();
        assert!(item.change_set(Some(&item)).unwrap().is_empty());
    }

    #[test]
    fn test_change_set_rejects_other_identity() {
        let err = item().change_set(Some(&item())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_change_set_ignores_column_order() {
        let older = item();
        let reordered = older.clone().with_board_columns(["col-b", "col-a"]);
        assert!(reordered.change_set(Some(&older)).unwrap().is_empty());

        let grown = older.clone().with_board_columns(["col-b", "col-a", "col-c"]);
        let changes = grown.change_set(Some(&older)).unwrap();
        assert_eq!(changes.attributes(), vec![SYSTEM_BOARDCOLUMNS]);
    }

    #[test]
    fn test_change_set_for_new_item() {
        let item = item();
        let changes = item.change_set(None).unwrap();

        assert_eq!(
            changes.attributes(),
            vec![SYSTEM_STATE, SYSTEM_METASTATE, SYSTEM_BOARDCOLUMNS, SYSTEM_TITLE]
        );
        assert_eq!(changes.get(SYSTEM_STATE), Some(&Change::new(SYSTEM_STATE, None, "new")));
    }

    #[test]
    fn test_change_set_order_is_stable() {
        let older = item();
        let newer = older
            .clone()
            .with_field("custom.zeta", 1)
            .with_field("custom.alpha", 2)
            .with_metastate("mOpen")
            .with_state("open");

        let changes = newer.change_set(Some(&older)).unwrap();
        assert_eq!(
            changes.attributes(),
            vec![SYSTEM_STATE, SYSTEM_METASTATE, "custom.alpha", "custom.zeta"]
        );
        assert_eq!(changes.get(SYSTEM_STATE).unwrap().old_value, Some(json!("new")));
    }

    #[test]
    fn test_typed_field_access() {
        let item = item().with_field("custom.count", 3);

        assert_eq!(item.string_field(SYSTEM_STATE).unwrap(), Some("new"));
        assert_eq!(item.string_field("missing").unwrap(), None);
        assert_eq!(
            item.string_field("custom.count").unwrap_err().kind(),
            ErrorKind::CapabilityMismatch
        );
        assert_eq!(item.string_list_field(SYSTEM_BOARDCOLUMNS).unwrap(), vec!["col-a", "col-b"]);
    }
}
