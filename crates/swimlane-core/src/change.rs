//! Attribute-level deltas between two versions of the same entity.
//!
//! A [`ChangeSet`] holds at most one [`Change`] per attribute once it has been
//! built through [`ChangeSet::add_or_update`], and change detection always
//! emits attributes in [`attribute_order`] so output is reproducible.

use crate::error::Result;
use crate::item::{SYSTEM_BOARDCOLUMNS, SYSTEM_LABELS, SYSTEM_METASTATE, SYSTEM_STATE, SYSTEM_TITLE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Attributes emitted first, in this order. Everything else follows by name.
pub const ATTRIBUTE_PRIORITY: &[&str] = &[SYSTEM_STATE, SYSTEM_METASTATE, SYSTEM_BOARDCOLUMNS, SYSTEM_TITLE];

/// Attributes whose list values compare as sets.
pub const SET_ATTRIBUTES: &[&str] = &[SYSTEM_BOARDCOLUMNS, SYSTEM_LABELS];

/// A single attribute delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Field name, e.g. `system.state`.
    pub attribute_name: String,
    /// Value before the change; `None` when the attribute was absent.
    pub old_value: Option<Value>,
    /// Value after the change; `Null` when the attribute was removed.
    pub new_value: Value,
}

impl Change {
    /// Create a new change.
    #[must_use]
    pub fn new(attribute_name: impl Into<String>, old_value: Option<Value>, new_value: impl Into<Value>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            old_value,
            new_value: new_value.into(),
        }
    }

    /// Old value as a list of strings, ignoring non-string entries.
    #[must_use]
    pub fn old_strings(&self) -> Vec<String> {
        self.old_value.as_ref().map(string_list).unwrap_or_default()
    }

    /// New value as a list of strings, ignoring non-string entries.
    #[must_use]
    pub fn new_strings(&self) -> Vec<String> {
        string_list(&self.new_value)
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}

/// An ordered collection of changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(Vec<Change>);

impl ChangeSet {
    /// Create an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a change without merging.
    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    /// Record a change, merging into an existing entry for the same attribute.
    ///
    /// A merged entry keeps its original `old_value` and takes the new
    /// `new_value`, so the set never holds two entries for one attribute.
    /// An entry whose merged `new_value` ends up equal to its `old_value` is
    /// kept: it still records that the attribute was written.
    pub fn add_or_update(&mut self, change: Change) {
        match self.0.iter_mut().find(|c| c.attribute_name == change.attribute_name) {
            Some(existing) => existing.new_value = change.new_value,
            None => self.0.push(change),
        }
    }

    /// Look up the change recorded for an attribute.
    #[must_use]
    pub fn get(&self, attribute_name: &str) -> Option<&Change> {
        self.0.iter().find(|c| c.attribute_name == attribute_name)
    }

    /// Check whether an attribute changed.
    #[must_use]
    pub fn contains(&self, attribute_name: &str) -> bool {
        self.get(attribute_name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    /// Attribute names in recorded order.
    #[must_use]
    pub fn attributes(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.attribute_name.as_str()).collect()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Anything that can describe how it differs from an older copy of itself.
pub trait ChangeDetector {
    /// Compute the changes leading from `older` to `self`.
    ///
    /// `None` means the entity is newly created: every populated attribute is
    /// reported with no old value.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` if `older` is a different entity.
    fn change_set(&self, older: Option<&Self>) -> Result<ChangeSet>;
}

/// Ordering used when emitting attributes.
#[must_use]
pub fn attribute_order(a: &str, b: &str) -> Ordering {
    let rank = |name: &str| {
        ATTRIBUTE_PRIORITY
            .iter()
            .position(|p| *p == name)
            .unwrap_or(ATTRIBUTE_PRIORITY.len())
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Normalized equality for attribute values.
///
/// Set-like attributes holding arrays are equal when they contain the same
/// elements in any order; everything else uses plain equality.
#[must_use]
pub fn values_equal(attribute_name: &str, a: &Value, b: &Value) -> bool {
    if SET_ATTRIBUTES.contains(&attribute_name) {
        if let (Value::Array(left), Value::Array(right)) = (a, b) {
            return left.iter().all(|v| right.contains(v)) && right.iter().all(|v| left.contains(v));
        }
    }
    a == b
}

/// Diff two field maps in [`attribute_order`].
///
/// Missing and `null` values are treated alike.
#[must_use]
pub fn diff_fields(current: &BTreeMap<String, Value>, older: Option<&BTreeMap<String, Value>>) -> ChangeSet {
    let mut names: Vec<&str> = current
        .keys()
        .chain(older.into_iter().flat_map(BTreeMap::keys))
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    names.sort_by(|a, b| attribute_order(a, b));

    let mut changes = ChangeSet::new();
    for name in names {
        let new_value = current.get(name).filter(|v| !v.is_null());
        let old_value = older.and_then(|o| o.get(name)).filter(|v| !v.is_null());

        let equal = match (old_value, new_value) {
            (Some(old), Some(new)) => values_equal(name, old, new),
            (None, None) => true,
            _ => false,
        };
        if !equal {
            changes.push(Change::new(name, old_value.cloned(), new_value.cloned().unwrap_or(Value::Null)));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn test_add_or_update_merges_by_attribute() {
        let mut changes = ChangeSet::new();
        changes.add_or_update(Change::new(SYSTEM_METASTATE, Some(json!("mNew")), "mOpen"));
        changes.add_or_update(Change::new(SYSTEM_STATE, Some(json!("new")), "open"));
        changes.add_or_update(Change::new(SYSTEM_METASTATE, Some(json!("mOpen")), "mClosed"));

        assert_eq!(changes.len(), 2);
        let meta = changes.get(SYSTEM_METASTATE).unwrap();
        assert_eq!(meta.old_value, Some(json!("mNew")));
        assert_eq!(meta.new_value, json!("mClosed"));
    }

    #[test]
    fn test_add_or_update_keeps_round_trip_entry() {
        let mut changes = ChangeSet::new();
        changes.add_or_update(Change::new(SYSTEM_METASTATE, Some(json!("mNew")), "mOpen"));
        changes.add_or_update(Change::new(SYSTEM_METASTATE, Some(json!("mOpen")), "mNew"));

        assert_eq!(
            changes.into_iter().collect::<Vec<_>>(),
            vec![Change::new(SYSTEM_METASTATE, Some(json!("mNew")), "mNew")]
        );
    }

    #[test]
    fn test_attribute_order_priority_then_name() {
        let mut names = vec!["zeta", SYSTEM_BOARDCOLUMNS, "alpha", SYSTEM_STATE, SYSTEM_METASTATE];
        names.sort_by(|a, b| attribute_order(a, b));
        assert_eq!(names, vec![SYSTEM_STATE, SYSTEM_METASTATE, SYSTEM_BOARDCOLUMNS, "alpha", "zeta"]);
    }

    #[test]
    fn test_set_attributes_ignore_order() {
        assert!(values_equal(SYSTEM_BOARDCOLUMNS, &json!(["a", "b"]), &json!(["b", "a"])));
        assert!(!values_equal(SYSTEM_BOARDCOLUMNS, &json!(["a"]), &json!(["a", "b"])));
        // plain lists keep their order
        assert!(!values_equal("custom.list", &json!(["a", "b"]), &json!(["b", "a"])));
    }

    #[test]
    fn test_diff_fields_from_nothing() {
        let current = fields(&[(SYSTEM_TITLE, json!("Fix it")), (SYSTEM_STATE, json!("new")), ("empty", Value::Null)]);
        let changes = diff_fields(&current, None);

        assert_eq!(changes.attributes(), vec![SYSTEM_STATE, SYSTEM_TITLE]);
        assert!(changes.iter().all(|c| c.old_value.is_none()));
    }

    #[test]
    fn test_diff_fields_reports_removal() {
        let older = fields(&[("custom.owner", json!("alice"))]);
        let changes = diff_fields(&BTreeMap::new(), Some(&older));

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("custom.owner").unwrap().new_value, Value::Null);
    }

    #[test]
    fn test_change_string_lists() {
        let change = Change::new(SYSTEM_BOARDCOLUMNS, Some(json!(["a", 1, "b"])), json!(["c"]));
        assert_eq!(change.old_strings(), vec!["a", "b"]);
        assert_eq!(change.new_strings(), vec!["c"]);
    }
}
