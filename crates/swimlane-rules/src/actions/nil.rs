use crate::action::{Action, ActionContext, ActionKey};
use swimlane_core::{ChangeSet, Result, Trackable};
use tracing::trace;

/// Does nothing; useful to disable a rule slot without removing its key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilAction;

impl<E: Trackable> Action<E> for NilAction {
    fn key(&self) -> ActionKey {
        ActionKey::Nil
    }

    fn on_change(
        &self,
        _ctx: &ActionContext<'_, E>,
        entity: E,
        _trigger: &ChangeSet,
        _config: &str,
        accumulated: ChangeSet,
    ) -> Result<(E, ChangeSet)> {
        trace!(item = %entity.id(), "nil action");
        Ok((entity, accumulated))
    }
}
