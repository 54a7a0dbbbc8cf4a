//! Action registry and dispatcher.

use crate::action::{Action, ActionContext, ActionKey, RuleSettings};
use crate::actions::{FieldSetAction, NilAction, StateToMetaStateAction};
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swimlane_core::{ChangeSet, CoreError, Result, Trackable};
use tracing::{debug, info};

/// Per-action configuration keyed by action key, e.g.
/// `{"FieldSet": "{\"system.state\": \"resolved\"}", "BidirectionalStateToColumn": ""}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionConfig(BTreeMap<String, String>);

impl ActionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the configuration for one action key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, config: impl Into<String>) -> Self {
        self.0.insert(key.into(), config.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve every key, in dispatch order.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownAction` for the first key the registry does not know.
    pub fn resolve(&self) -> Result<Vec<(ActionKey, &str)>> {
        let mut resolved = self
            .0
            .iter()
            .map(|(key, config)| Ok((key.parse::<ActionKey>()?, config.as_str())))
            .collect::<Result<Vec<_>>>()?;
        resolved.sort_by_key(|(key, _)| *key);
        Ok(resolved)
    }
}

impl FromIterator<(String, String)> for ActionConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The fixed set of actions, built once.
pub struct ActionRegistry<E> {
    actions: Vec<Box<dyn Action<E>>>,
}

impl<E: Trackable + 'static> ActionRegistry<E> {
    /// Registry holding `Nil`, `FieldSet` and `BidirectionalStateToColumn`.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            actions: vec![
                Box::new(NilAction),
                Box::new(FieldSetAction),
                Box::new(StateToMetaStateAction),
            ],
        }
    }
}

impl<E: Trackable> ActionRegistry<E> {
    /// Look up the action registered for `key`.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownAction` if nothing is registered for it.
    pub fn get(&self, key: ActionKey) -> Result<&dyn Action<E>> {
        self.actions
            .iter()
            .find(|a| a.key() == key)
            .map(|a| &**a)
            .ok_or_else(|| CoreError::UnknownAction(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = ActionKey> + '_ {
        self.actions.iter().map(|a| a.key())
    }
}

/// Runs configured actions in sequence, threading one accumulated change set
/// through all of them.
pub struct ActionEngine<'a, E> {
    registry: ActionRegistry<E>,
    ctx: ActionContext<'a, E>,
}

impl<'a, E: Trackable + 'static> ActionEngine<'a, E> {
    /// Create an engine with the standard registry.
    pub fn new(repository: &'a dyn Repository<E>, actor: impl Into<String>) -> Self {
        Self {
            registry: ActionRegistry::standard(),
            ctx: ActionContext::new(repository, actor),
        }
    }
}

impl<'a, E: Trackable> ActionEngine<'a, E> {
    /// Replace the rule settings.
    #[must_use]
    pub fn with_settings(mut self, settings: RuleSettings) -> Self {
        self.ctx.settings = settings;
        self
    }

    /// Diff `old` against `new` and run the configured actions on the result.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidArgument` if either version is missing or
    /// they are different entities, and otherwise whatever
    /// [`Self::execute_by_changeset`] returns.
    pub fn execute_by_old_new(&self, old: Option<&E>, new: Option<E>, config: &ActionConfig) -> Result<(E, ChangeSet)> {
        let (Some(old), Some(new)) = (old, new) else {
            return Err(CoreError::InvalidArgument(
                "both the old and the new version are required".to_string(),
            ));
        };

        let changes = new.change_set(Some(old))?;
        self.execute_by_changeset(new, &changes, config)
    }

    /// Run the configured actions for `changes` on `new`.
    ///
    /// Keys are resolved up front, so an unknown key fails before any action
    /// runs. The first failing action stops the chain.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownAction` for an unresolvable key, or the
    /// first error raised by an action.
    pub fn execute_by_changeset(&self, new: E, changes: &ChangeSet, config: &ActionConfig) -> Result<(E, ChangeSet)> {
        let resolved = config
            .resolve()?
            .into_iter()
            .map(|(key, action_config)| Ok((self.registry.get(key)?, action_config)))
            .collect::<Result<Vec<_>>>()?;

        let mut entity = new;
        let mut accumulated = ChangeSet::new();
        for (action, action_config) in resolved {
            debug!(item = %entity.id(), action = %action.key(), "running action");
            (entity, accumulated) = action.on_change(&self.ctx, entity, changes, action_config, accumulated)?;
        }

        info!(item = %entity.id(), changes = accumulated.len(), "actions complete");
        Ok((entity, accumulated))
    }
}
