//! State/metastate maps derived from a work item type.
//!
//! The `system.state` and `system.metastate` enumerations are parallel lists:
//! position *i* of one pairs with position *i* of the other.

use std::collections::BTreeMap;
use swimlane_core::{CoreError, Result, WorkItemType, SYSTEM_METASTATE, SYSTEM_STATE};

fn paired_values(wit: &WorkItemType) -> Result<Vec<(String, String)>> {
    let states = wit.enum_values(SYSTEM_STATE)?;
    let metastates = wit.enum_values(SYSTEM_METASTATE)?;

    if states.len() != metastates.len() {
        return Err(CoreError::Validation(format!(
            "type {} declares {} states but {} metastates",
            wit.id,
            states.len(),
            metastates.len()
        )));
    }

    states
        .iter()
        .zip(metastates)
        .map(|(state, metastate)| match (state.as_str(), metastate.as_str()) {
            (Some(s), Some(m)) => Ok((s.to_string(), m.to_string())),
            _ => Err(CoreError::Validation(format!(
                "type {} pairs non-string values {state} and {metastate}",
                wit.id
            ))),
        })
        .collect()
}

/// Map every state to its metastate.
///
/// # Errors
/// Returns `CoreError::NotFound` if either enum field is missing, or
/// `CoreError::Validation` if the lists differ in length or hold non-strings.
pub fn state_to_metastate_map(wit: &WorkItemType) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for (state, metastate) in paired_values(wit)? {
        map.entry(state).or_insert(metastate);
    }
    Ok(map)
}

/// Map every metastate back to a state.
///
/// Several states may share one metastate; the first in declaration order wins.
///
/// # Errors
/// Same as [`state_to_metastate_map`].
pub fn metastate_to_state_map(wit: &WorkItemType) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for (state, metastate) in paired_values(wit)? {
        map.entry(metastate).or_insert(state);
    }
    Ok(map)
}
