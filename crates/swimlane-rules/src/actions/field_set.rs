use crate::action::{Action, ActionContext, ActionKey, FieldSetValidation};
use swimlane_core::{apply_set_operations, ChangeSet, CoreError, Result, SetOperation, Trackable};
use tracing::debug;

/// Assigns the fields named in a JSON object configuration,
/// e.g. `{"system.state": "resolved"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSetAction;

impl<E: Trackable> Action<E> for FieldSetAction {
    fn key(&self) -> ActionKey {
        ActionKey::FieldSet
    }

    fn on_change(
        &self,
        ctx: &ActionContext<'_, E>,
        mut entity: E,
        _trigger: &ChangeSet,
        config: &str,
        mut accumulated: ChangeSet,
    ) -> Result<(E, ChangeSet)> {
        let ops = SetOperation::from_json_object(config)?;

        if ctx.settings.field_set_validation == FieldSetValidation::Strict {
            let wit = ctx.repository.load_type(entity.item_type_id())?;
            if let Some(op) = ops.iter().find(|op| !wit.fields.contains_key(&op.field)) {
                return Err(CoreError::not_found("field", format!("{} on type {}", op.field, wit.name)));
            }
        }

        let delta = apply_set_operations(&mut entity, &ops);
        if delta.is_empty() {
            debug!(item = %entity.id(), "field set: nothing to change");
            return Ok((entity, accumulated));
        }

        debug!(item = %entity.id(), fields = ?delta.attributes(), "field set");
        for change in delta {
            accumulated.add_or_update(change);
        }

        let saved = ctx.repository.save(entity, &ctx.actor)?;
        Ok((saved, accumulated))
    }
}
