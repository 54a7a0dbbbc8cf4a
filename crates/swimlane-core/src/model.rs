//! Definitions the rule engine reads: work item types, boards, type groups and spaces.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Rule key for columns that keep metastate and column membership in sync
/// in both directions.
pub const BIDIRECTIONAL_STATE_TO_COLUMN: &str = "BidirectionalStateToColumn";

/// Value type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Markup,
    List,
    /// Closed set of allowed values, in declaration order.
    Enum { values: Vec<Value> },
}

/// A field declared by a work item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            required: false,
            field_type,
        }
    }

    /// Enumeration values, if this is an enum field.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[Value]> {
        match &self.field_type {
            FieldType::Enum { values } => Some(values),
            _ => None,
        }
    }
}

/// A work item type: the set of fields its items carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemType {
    pub id: Uuid,
    pub name: String,
    pub space_template_id: Uuid,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDefinition>,
}

impl WorkItemType {
    #[must_use]
    pub fn new(name: impl Into<String>, space_template_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            space_template_id,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    /// Declare an enum field from a list of strings.
    #[must_use]
    pub fn with_enum<S: Into<String>>(self, name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        let name = name.into();
        let values = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.with_field(name.clone(), FieldDefinition::new(name, FieldType::Enum { values }))
    }

    /// Enumeration values of a field.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the field is missing or not an enum.
    pub fn enum_values(&self, field: &str) -> Result<&[Value]> {
        self.fields
            .get(field)
            .and_then(FieldDefinition::enum_values)
            .ok_or_else(|| CoreError::not_found("enum field", format!("{field} on type {}", self.id)))
    }
}

/// How a board decides which work items it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardContextType {
    /// `context` names a work item type group.
    TypeLevelContext,
    /// Any other context; such boards never take part in reconciliation.
    #[serde(other)]
    Other,
}

/// A column on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    /// Which transition policy governs the column.
    pub transition_rule_key: String,
    /// Rule-specific JSON argument.
    #[serde(default)]
    pub transition_rule_argument: String,
}

impl BoardColumn {
    /// Create a column governed by the bidirectional rule for `metastate`.
    #[must_use]
    pub fn bidirectional(name: impl Into<String>, order: u32, metastate: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            order,
            transition_rule_key: BIDIRECTIONAL_STATE_TO_COLUMN.to_string(),
            transition_rule_argument: serde_json::json!({ "metaState": metastate }).to_string(),
        }
    }

    /// Whether the bidirectional rule governs this column.
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.transition_rule_key == BIDIRECTIONAL_STATE_TO_COLUMN
    }

    /// Decode the rule argument as a [`ColumnRuleArgument`].
    ///
    /// # Errors
    /// Returns `CoreError::MalformedConfig` if the argument is not valid JSON
    /// of the expected shape.
    pub fn rule_argument(&self) -> Result<ColumnRuleArgument> {
        serde_json::from_str(&self.transition_rule_argument).map_err(|source| CoreError::MalformedConfig {
            target: format!("column {} rule argument", self.id),
            source,
        })
    }
}

/// Argument of the bidirectional column rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRuleArgument {
    #[serde(rename = "metaState")]
    pub meta_state: String,
}

/// A Kanban board scoped to a space template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub space_template_id: Uuid,
    pub name: String,
    /// Identifier interpreted according to `context_type`.
    pub context: String,
    pub context_type: BoardContextType,
    #[serde(default)]
    pub columns: Vec<BoardColumn>,
}

impl Board {
    /// Create a board whose context is a work item type group.
    #[must_use]
    pub fn for_type_group(name: impl Into<String>, group: &WorkItemTypeGroup) -> Self {
        Self {
            id: Uuid::new_v4(),
            space_template_id: group.space_template_id,
            name: name.into(),
            context: group.id.to_string(),
            context_type: BoardContextType::TypeLevelContext,
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: BoardColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Find a column by its identifier.
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.id.to_string() == id)
    }
}

/// Associates a board context with a list of work item types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemTypeGroup {
    pub id: Uuid,
    pub space_template_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub type_list: Vec<Uuid>,
}

impl WorkItemTypeGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, space_template_id: Uuid, type_list: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            space_template_id,
            name: name.into(),
            type_list,
        }
    }
}

/// A space: the container work items live in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: Uuid,
    pub name: String,
    pub space_template_id: Uuid,
}

impl Space {
    #[must_use]
    pub fn new(name: impl Into<String>, space_template_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            space_template_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_bidirectional_column_argument() {
        let column = BoardColumn::bidirectional("In Progress", 1, "mInprogress");

        assert!(column.is_bidirectional());
        assert_eq!(column.rule_argument().unwrap().meta_state, "mInprogress");
    }

    #[test]
    fn test_malformed_rule_argument() {
        let mut column = BoardColumn::bidirectional("Broken", 0, "mNew");
        column.transition_rule_argument = "{metaState:".to_string();

        assert_eq!(column.rule_argument().unwrap_err().kind(), ErrorKind::MalformedConfig);
    }

    #[test]
    fn test_enum_values_lookup() {
        let wit = WorkItemType::new("Task", Uuid::nil()).with_enum("system.state", ["new", "open"]);

        assert_eq!(wit.enum_values("system.state").unwrap().len(), 2);
        assert_eq!(wit.enum_values("system.metastate").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unknown_context_type_loads_as_other() {
        let group = WorkItemTypeGroup::new("Scrum", Uuid::nil(), vec![]);
        let mut value = serde_json::to_value(Board::for_type_group("Roadmap", &group)).unwrap();
        value["context_type"] = "ProjectContext".into();

        let board: Board = serde_json::from_value(value).unwrap();
        assert_eq!(board.context_type, BoardContextType::Other);
    }

    #[test]
    fn test_board_yaml_shape() {
        let group = WorkItemTypeGroup::new("Scrum", Uuid::nil(), vec![]);
        let board = Board::for_type_group("Work", &group).with_column(BoardColumn::bidirectional("New", 0, "mNew"));

        let yaml = serde_json::to_value(&board).unwrap();
        assert_eq!(yaml["context_type"], "TypeLevelContext");
        assert_eq!(yaml["context"], group.id.to_string());
        assert_eq!(yaml["columns"][0]["transition_rule_key"], BIDIRECTIONAL_STATE_TO_COLUMN);
    }
}
