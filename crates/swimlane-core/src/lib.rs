//! swimlane-core: Domain models and change detection for work item tracking.
//!
//! This crate provides:
//! - `WorkItem`: a field-bag work item with state, metastate and board columns
//! - `Change`/`ChangeSet`: attribute-level deltas with deterministic ordering
//! - `WorkItemType`, `Board`, `WorkItemTypeGroup`, `Space`: the definitions reconciliation reads
//! - `WorkEvent`: append-only audit entries for applied changes
//! - Field assignments via `field=value` strings or JSON objects

pub mod change;
pub mod error;
pub mod event;
pub mod item;
pub mod model;
pub mod patch;

pub use change::{attribute_order, diff_fields, values_equal, Change, ChangeDetector, ChangeSet};
pub use error::{CoreError, ErrorKind, Result};
pub use event::{CreatedPayload, EventPayload, EventType, FieldChangePayload, WorkEvent};
pub use item::{
    FieldBag, Trackable, WorkItem, SYSTEM_BOARDCOLUMNS, SYSTEM_LABELS, SYSTEM_METASTATE,
    SYSTEM_STATE, SYSTEM_TITLE,
};
pub use model::{
    Board, BoardColumn, BoardContextType, ColumnRuleArgument, FieldDefinition, FieldType,
    Space, WorkItemType, WorkItemTypeGroup, BIDIRECTIONAL_STATE_TO_COLUMN,
};
pub use patch::{apply_set_operations, SetOperation};
