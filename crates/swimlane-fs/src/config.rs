//! Workspace configuration.

use serde::{Deserialize, Serialize};
use swimlane_rules::{ActionConfig, RuleSettings};

/// Workspace configuration stored in `.swimlane/config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace settings.
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    /// Actions run after every change, keyed by action key.
    #[serde(default = "default_actions")]
    pub actions: ActionConfig,

    /// Tunables for the standard actions.
    #[serde(default)]
    pub rules: RuleSettings,
}

fn default_version() -> u32 {
    1
}

fn default_actions() -> ActionConfig {
    ActionConfig::new().with("BidirectionalStateToColumn", "")
}

/// Workspace-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Workspace name.
    #[serde(default)]
    pub name: Option<String>,

    /// Actor recorded on saves when none is given.
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_actor() -> String {
    "swimlane".to_string()
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            name: None,
            actor: default_actor(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            workspace: WorkspaceSettings::default(),
            actions: default_actions(),
            rules: RuleSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_rules::FieldSetValidation;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: WorkspaceConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.workspace.actor, "swimlane");
        assert_eq!(config.actions, default_actions());
        assert_eq!(config.rules.field_set_validation, FieldSetValidation::Lenient);
    }

    #[test]
    fn test_config_yaml() {
        let yaml = r#"
version: 1
workspace:
  name: demo
actions:
  Nil: ""
  FieldSet: '{"custom.touched": true}'
rules:
  field_set_validation: strict
"#;
        let config: WorkspaceConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.workspace.name.as_deref(), Some("demo"));
        assert_eq!(config.actions.iter().count(), 2);
        assert_eq!(config.rules.field_set_validation, FieldSetValidation::Strict);
    }
}
