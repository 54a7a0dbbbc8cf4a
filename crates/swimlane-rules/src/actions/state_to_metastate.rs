//! Keeps `system.state`, `system.metastate` and `system.boardcolumns` in step.
//!
//! A state change moves the metastate to the value paired with the new state
//! and then moves the item into every bidirectional column of a relevant board
//! that targets that metastate, and out of every other one. A column change
//! works the other way round: entering a bidirectional column pulls the
//! metastate (and with it the state) to what the column targets. Leaving a
//! column never changes anything.
//!
//! All collaborator lookups happen before the entity is touched, and the
//! entity is saved once at the end, so a failed lookup leaves nothing half
//! applied.

use crate::action::{Action, ActionContext, ActionKey};
use crate::columns::{difference, insert_unique, remove_all};
use crate::mapping::{metastate_to_state_map, state_to_metastate_map};
use serde_json::Value;
use swimlane_core::{
    Board, BoardColumn, BoardContextType, Change, ChangeSet, CoreError, Result, Trackable,
    WorkItemTypeGroup, SYSTEM_BOARDCOLUMNS, SYSTEM_METASTATE, SYSTEM_STATE,
};
use tracing::{debug, info};

/// The bidirectional state/column rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateToMetaStateAction;

impl<E: Trackable> Action<E> for StateToMetaStateAction {
    fn key(&self) -> ActionKey {
        ActionKey::StateToMetaState
    }

    fn on_change(
        &self,
        ctx: &ActionContext<'_, E>,
        entity: E,
        trigger: &ChangeSet,
        _config: &str,
        accumulated: ChangeSet,
    ) -> Result<(E, ChangeSet)> {
        if trigger.contains(SYSTEM_STATE) {
            return on_state_change(ctx, entity, accumulated);
        }
        if let Some(change) = trigger.get(SYSTEM_BOARDCOLUMNS) {
            return on_column_change(ctx, entity, change, accumulated);
        }
        Ok((entity, accumulated))
    }
}

/// Boards of the entity's space together with its type groups.
struct SpaceBoards {
    boards: Vec<Board>,
    groups: Vec<WorkItemTypeGroup>,
}

impl SpaceBoards {
    fn load<E: Trackable>(ctx: &ActionContext<'_, E>, entity: &E) -> Result<Self> {
        let template = ctx.repository.space_template_id(entity.space_id())?;
        Ok(Self {
            boards: ctx.repository.boards_for_template(template)?,
            groups: ctx.repository.type_groups_for_template(template)?,
        })
    }

    /// A board is relevant when its type group lists the entity's type.
    fn is_relevant(&self, board: &Board, type_id: uuid::Uuid) -> bool {
        board.context_type == BoardContextType::TypeLevelContext
            && self
                .groups
                .iter()
                .any(|g| g.id.to_string() == board.context && g.type_list.contains(&type_id))
    }

    fn relevant(&self, type_id: uuid::Uuid) -> impl Iterator<Item = &Board> {
        self.boards.iter().filter(move |b| self.is_relevant(b, type_id))
    }

    fn find_column(&self, column_id: &str) -> Option<(&Board, &BoardColumn)> {
        self.boards
            .iter()
            .find_map(|board| board.column(column_id).map(|column| (board, column)))
    }
}

fn owned(value: Option<&str>) -> Option<Value> {
    value.map(|v| Value::String(v.to_string()))
}

fn on_state_change<E: Trackable>(
    ctx: &ActionContext<'_, E>,
    mut entity: E,
    mut accumulated: ChangeSet,
) -> Result<(E, ChangeSet)> {
    let Some(state) = entity.string_field(SYSTEM_STATE)?.map(String::from) else {
        debug!(item = %entity.id(), "state cleared, nothing to map");
        return Ok((entity, accumulated));
    };

    let wit = ctx.repository.load_type(entity.item_type_id())?;
    let metastate = state_to_metastate_map(&wit)?
        .remove(&state)
        .ok_or_else(|| CoreError::not_found("metastate mapping", format!("state '{state}' on type {}", wit.name)))?;

    let current = entity.string_field(SYSTEM_METASTATE)?.map(String::from);
    if current.as_deref() == Some(metastate.as_str()) {
        debug!(item = %entity.id(), %state, %metastate, "metastate already in step");
        return Ok((entity, accumulated));
    }

    let space = SpaceBoards::load(ctx, &entity)?;
    let old_columns = entity.field(SYSTEM_BOARDCOLUMNS).cloned();
    let mut columns = entity.string_list_field(SYSTEM_BOARDCOLUMNS)?;
    let mut columns_changed = false;

    for column in space
        .relevant(entity.item_type_id())
        .flat_map(|board| board.columns.iter())
        .filter(|column| column.is_bidirectional())
    {
        let id = column.id.to_string();
        columns_changed |= if column.rule_argument()?.meta_state == metastate {
            insert_unique(&mut columns, &id)
        } else {
            remove_all(&mut columns, &id)
        };
    }

    entity.set_field(SYSTEM_METASTATE, Value::String(metastate.clone()));
    accumulated.add_or_update(Change::new(SYSTEM_METASTATE, owned(current.as_deref()), metastate.clone()));

    if columns_changed {
        let new_columns = Value::from(columns);
        entity.set_field(SYSTEM_BOARDCOLUMNS, new_columns.clone());
        accumulated.add_or_update(Change::new(SYSTEM_BOARDCOLUMNS, old_columns, new_columns));
    }

    info!(item = %entity.id(), %state, %metastate, columns_changed, "state reconciled");
    let saved = ctx.repository.save(entity, &ctx.actor)?;
    Ok((saved, accumulated))
}

fn on_column_change<E: Trackable>(
    ctx: &ActionContext<'_, E>,
    mut entity: E,
    change: &Change,
    mut accumulated: ChangeSet,
) -> Result<(E, ChangeSet)> {
    let added = difference(&change.new_strings(), &change.old_strings());
    if added.is_empty() {
        debug!(item = %entity.id(), "no column entered");
        return Ok((entity, accumulated));
    }

    let wit = ctx.repository.load_type(entity.item_type_id())?;
    let to_state = metastate_to_state_map(&wit)?;
    let space = SpaceBoards::load(ctx, &entity)?;

    // Columns are considered one by one; a later column overrides an earlier one.
    let mut target = None;
    for column_id in &added {
        let (board, column) = space
            .find_column(column_id)
            .ok_or_else(|| CoreError::not_found("board column", column_id))?;

        if !column.is_bidirectional() {
            debug!(column = %column.name, rule = %column.transition_rule_key, "column rule not bidirectional, skipping");
            continue;
        }
        if !space.is_relevant(board, entity.item_type_id()) {
            debug!(column = %column.name, board = %board.name, "board not relevant to item type, skipping");
            continue;
        }
        target = Some(column.rule_argument()?.meta_state);
    }

    let Some(metastate) = target else {
        return Ok((entity, accumulated));
    };

    let current = entity.string_field(SYSTEM_METASTATE)?.map(String::from);
    if current.as_deref() == Some(metastate.as_str()) {
        debug!(item = %entity.id(), %metastate, "metastate already in step");
        return Ok((entity, accumulated));
    }

    let state = to_state
        .get(&metastate)
        .cloned()
        .ok_or_else(|| CoreError::not_found("state mapping", format!("metastate '{metastate}' on type {}", wit.name)))?;
    let current_state = entity.string_field(SYSTEM_STATE)?.map(String::from);

    entity.set_field(SYSTEM_METASTATE, Value::String(metastate.clone()));
    accumulated.add_or_update(Change::new(SYSTEM_METASTATE, owned(current.as_deref()), metastate.clone()));

    if current_state.as_deref() != Some(state.as_str()) {
        entity.set_field(SYSTEM_STATE, Value::String(state.clone()));
        accumulated.add_or_update(Change::new(SYSTEM_STATE, owned(current_state.as_deref()), state.clone()));
    }

    info!(item = %entity.id(), %state, %metastate, "column move reconciled");
    let saved = ctx.repository.save(entity, &ctx.actor)?;
    Ok((saved, accumulated))
}
