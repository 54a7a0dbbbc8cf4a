//! Work event model for the append-only audit trail of applied changes.

use crate::change::Change;
use crate::item::{SYSTEM_BOARDCOLUMNS, SYSTEM_METASTATE, SYSTEM_STATE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Type of event that occurred on a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Item was created.
    Created,
    /// Workflow state changed.
    StateChanged,
    /// Metastate changed.
    MetastateChanged,
    /// Board column membership changed.
    ColumnsChanged,
    /// Any other field changed.
    FieldChanged,
}

impl EventType {
    /// Event type recorded for a change to `attribute_name`.
    #[must_use]
    pub fn for_attribute(attribute_name: &str) -> Self {
        match attribute_name {
            SYSTEM_STATE => Self::StateChanged,
            SYSTEM_METASTATE => Self::MetastateChanged,
            SYSTEM_BOARDCOLUMNS => Self::ColumnsChanged,
            _ => Self::FieldChanged,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::StateChanged => write!(f, "STATE_CHANGED"),
            Self::MetastateChanged => write!(f, "METASTATE_CHANGED"),
            Self::ColumnsChanged => write!(f, "COLUMNS_CHANGED"),
            Self::FieldChanged => write!(f, "FIELD_CHANGED"),
        }
    }
}

/// Field change payload data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldChangePayload {
    pub field: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Creation payload data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CreatedPayload {
    pub title: String,
}

/// Payload for different event types.
///
/// Note: With `#[serde(untagged)]`, variants are tried in order during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EventPayload {
    /// Field change payload.
    FieldChange(FieldChangePayload),
    /// Creation payload.
    Created(CreatedPayload),
}

/// A single event in the work item's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkEvent {
    /// Unique event identifier.
    pub id: String,

    /// Type of event.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// When the event occurred (ISO 8601 UTC).
    pub timestamp: DateTime<Utc>,

    /// Who or what caused this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Event-specific payload.
    pub payload: EventPayload,
}

impl WorkEvent {
    /// Create a new event with auto-generated ID and current timestamp.
    #[must_use]
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            id: format!("evt_{}", Uuid::new_v4().as_simple()),
            event_type,
            timestamp: Utc::now(),
            actor: None,
            payload,
        }
    }

    /// Set the actor for this event.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Create a CREATED event.
    #[must_use]
    pub fn created(title: impl Into<String>) -> Self {
        Self::new(
            EventType::Created,
            EventPayload::Created(CreatedPayload { title: title.into() }),
        )
    }

    /// Record a single attribute delta.
    #[must_use]
    pub fn from_change(change: &Change) -> Self {
        Self::new(
            EventType::for_attribute(&change.attribute_name),
            EventPayload::FieldChange(FieldChangePayload {
                field: change.attribute_name.clone(),
                old_value: change.old_value.clone(),
                new_value: change.new_value.clone(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_from_change() {
        let change = Change::new(SYSTEM_METASTATE, Some(json!("mNew")), "mInprogress");
        let event = WorkEvent::from_change(&change).with_actor("alice");

        assert_eq!(event.event_type, EventType::MetastateChanged);
        assert_eq!(event.actor, Some("alice".to_string()));

        if let EventPayload::FieldChange(FieldChangePayload { field, old_value, new_value }) = &event.payload {
            assert_eq!(field, SYSTEM_METASTATE);
            assert_eq!(old_value, &Some(json!("mNew")));
            assert_eq!(new_value, &json!("mInprogress"));
        } else {
            panic!("Expected FieldChange payload");
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = WorkEvent::from_change(&Change::new(SYSTEM_STATE, None, "new"));
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains(r#""type":"STATE_CHANGED""#));
        assert!(json.contains(r#""field":"system.state""#));

        let back: WorkEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_created_event_roundtrip() {
        let event = WorkEvent::created("Ship it");
        let back: WorkEvent = serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(back.event_type, EventType::Created);
        assert_eq!(back.payload, EventPayload::Created(CreatedPayload { title: "Ship it".into() }));
    }
}
