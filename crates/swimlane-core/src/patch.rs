//! Field assignments for work item updates.
//!
//! Supports:
//! - `field=value` strings (e.g. `system.state=resolved`)
//! - JSON objects mapping field names to values (e.g. `{"system.state": "resolved"}`)

use crate::change::{values_equal, Change, ChangeSet};
use crate::error::{CoreError, Result};
use crate::item::FieldBag;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single assignment (field = value).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetOperation {
    /// Field name (e.g. "system.state").
    pub field: String,
    /// Value to set.
    pub value: Value,
}

impl SetOperation {
    /// Create a new set operation.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse a "field=value" string into a SetOperation.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` if the format is invalid.
    pub fn parse(input: &str) -> Result<Self> {
        let (field, value) = input
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidArgument(format!("expected 'field=value', got '{input}'")))?;

        let field = field.trim();
        if field.is_empty() {
            return Err(CoreError::InvalidArgument(format!("missing field name in '{input}'")));
        }
        let value_str = value.trim();

        // Try to parse as JSON first, fall back to string
        let value = serde_json::from_str(value_str).unwrap_or_else(|_| Value::String(value_str.to_string()));

        Ok(Self::new(field, value))
    }

    /// Decode a JSON object of field assignments.
    ///
    /// Assignments come back in field-name order.
    ///
    /// # Errors
    /// Returns `CoreError::MalformedConfig` if `config` is not a JSON object.
    pub fn from_json_object(config: &str) -> Result<Vec<Self>> {
        let map: serde_json::Map<String, Value> =
            serde_json::from_str(config).map_err(|source| CoreError::MalformedConfig {
                target: "field assignments".to_string(),
                source,
            })?;

        let mut ops: Vec<Self> = map.into_iter().map(|(field, value)| Self::new(field, value)).collect();
        ops.sort_by(|a, b| a.field.cmp(&b.field));
        Ok(ops)
    }
}

/// Apply assignments to a field bag, recording a change for every field whose
/// value actually differs.
pub fn apply_set_operations<B: FieldBag + ?Sized>(bag: &mut B, ops: &[SetOperation]) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for op in ops {
        let current = bag.field(&op.field).filter(|v| !v.is_null()).cloned();
        let unchanged = match &current {
            Some(old) => values_equal(&op.field, old, &op.value),
            None => op.value.is_null(),
        };
        if unchanged {
            continue;
        }

        bag.set_field(&op.field, op.value.clone());
        changes.add_or_update(Change::new(op.field.clone(), current, op.value.clone()));
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::item::{WorkItem, SYSTEM_STATE};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_set_operation_parse() {
        let op = SetOperation::parse("system.state=in progress").unwrap();
        assert_eq!(op.field, "system.state");
        assert_eq!(op.value, Value::String("in progress".to_string()));

        // JSON value
        let op = SetOperation::parse("custom.points=5").unwrap();
        assert_eq!(op.value, json!(5));

        let op = SetOperation::parse("system.labels=[\"ui\",\"bug\"]").unwrap();
        assert_eq!(op.value, json!(["ui", "bug"]));

        assert!(SetOperation::parse("no-equals-sign").is_err());
        assert!(SetOperation::parse("=value").is_err());
    }

    #[test]
    fn test_from_json_object() {
        let ops = SetOperation::from_json_object(r#"{"system.title":"x","system.state":"resolved"}"#).unwrap();
        assert_eq!(
            ops,
            vec![SetOperation::new("system.state", "resolved"), SetOperation::new("system.title", "x")]
        );

        let err = SetOperation::from_json_object("[1, 2]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedConfig);
        let err = SetOperation::from_json_object("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedConfig);
    }

    #[test]
    fn test_apply_set_operations_skips_equal_values() {
        let mut item = WorkItem::new(Uuid::nil(), Uuid::nil(), "Test").with_state("open");

        let changes = apply_set_operations(
            &mut item,
            &[SetOperation::new(SYSTEM_STATE, "open"), SetOperation::new("custom.points", 3)],
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("custom.points").unwrap().old_value, None);
        assert_eq!(item.fields["custom.points"], json!(3));
    }
}
