//! The action capability and the context actions run in.

use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use swimlane_core::{ChangeSet, CoreError, Result, BIDIRECTIONAL_STATE_TO_COLUMN};

/// Keys of the actions the registry knows, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKey {
    Nil,
    FieldSet,
    StateToMetaState,
}

impl ActionKey {
    /// All keys in dispatch order.
    pub const ALL: [Self; 3] = [Self::Nil, Self::FieldSet, Self::StateToMetaState];

    /// Configuration key for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::FieldSet => "FieldSet",
            Self::StateToMetaState => BIDIRECTIONAL_STATE_TO_COLUMN,
        }
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

/// How `FieldSet` treats field names its work item type does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSetValidation {
    /// Any field name is accepted.
    #[default]
    Lenient,
    /// Field names must be declared by the entity's type.
    Strict,
}

/// Tunables for the standard actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default)]
    pub field_set_validation: FieldSetValidation,
}

/// Collaborators and identity shared by every action in a dispatch chain.
pub struct ActionContext<'a, E> {
    /// Loads definitions and saves the reconciled entity.
    pub repository: &'a dyn Repository<E>,
    /// Identity recorded on every save.
    pub actor: String,
    pub settings: RuleSettings,
}

impl<'a, E> ActionContext<'a, E> {
    pub fn new(repository: &'a dyn Repository<E>, actor: impl Into<String>) -> Self {
        Self {
            repository,
            actor: actor.into(),
            settings: RuleSettings::default(),
        }
    }
}

/// A unit of reconciliation logic triggered by a change set.
pub trait Action<E> {
    /// The registry key this action answers to.
    fn key(&self) -> ActionKey;

    /// React to `trigger` on the new version of `entity`.
    ///
    /// `accumulated` holds what earlier actions of the same pass produced; the
    /// returned change set is that accumulator with this action's changes
    /// merged in by attribute name.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be decoded, a collaborator
    /// lookup fails, or the entity cannot be saved.
    fn on_change(
        &self,
        ctx: &ActionContext<'_, E>,
        entity: E,
        trigger: &ChangeSet,
        config: &str,
        accumulated: ChangeSet,
    ) -> Result<(E, ChangeSet)>;
}
