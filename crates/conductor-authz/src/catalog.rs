//! Static mapping from action names to the permissions they require.
//!
//! Each action maps to an ordered list of [`RequirementGroup`]s. An
//! `All` group needs every listed permission; an `Any` group needs at
//! least one. Permissions either name a fixed resource (`Airflow`,
//! `all_dags`) or a placeholder such as `{dag_id}` that the gate fills
//! in from the call context.
//!
//! Actions absent from the catalog impose no requirement.

use std::collections::HashMap;
use std::fmt;

use conductor_core::models::permission::Permission;
use serde::{Deserialize, Serialize};

use crate::gate::AccessContext;

/// Resource scope of a catalog permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceScope {
    /// A fixed resource name.
    Named(String),
    /// Taken from the call context under this key.
    Target(String),
}

/// A permission whose resource may still need substituting.
///
/// Serialized as `{ capability, resource }`, where a resource written
/// as `{key}` is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PermissionEntry", into = "PermissionEntry")]
pub struct PermissionTemplate {
    pub capability: String,
    pub scope: ResourceScope,
}

#[derive(Serialize, Deserialize)]
struct PermissionEntry {
    capability: String,
    resource: String,
}

impl From<PermissionEntry> for PermissionTemplate {
    fn from(entry: PermissionEntry) -> Self {
        let scope = match entry
            .resource
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(key) => ResourceScope::Target(key.to_string()),
            None => ResourceScope::Named(entry.resource),
        };
        Self {
            capability: entry.capability,
            scope,
        }
    }
}

impl From<PermissionTemplate> for PermissionEntry {
    fn from(template: PermissionTemplate) -> Self {
        let resource = match template.scope {
            ResourceScope::Named(name) => name,
            ResourceScope::Target(key) => format!("{{{key}}}"),
        };
        Self {
            capability: template.capability,
            resource,
        }
    }
}

impl PermissionTemplate {
    pub fn named(capability: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            scope: ResourceScope::Named(resource.into()),
        }
    }

    pub fn target(capability: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            scope: ResourceScope::Target(key.into()),
        }
    }

    /// Concrete permission for this call, or `None` when the context
    /// lacks the placeholder's value.
    pub fn resolve(&self, context: &AccessContext) -> Option<Permission> {
        let resource = match &self.scope {
            ResourceScope::Named(name) => name.as_str(),
            ResourceScope::Target(key) => context.get(key)?,
        };
        Some(Permission::new(self.capability.clone(), resource))
    }
}

impl fmt::Display for PermissionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            ResourceScope::Named(name) => write!(f, "{} on {}", self.capability, name),
            ResourceScope::Target(key) => write!(f, "{} on {{{}}}", self.capability, key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementGroup {
    /// Every permission must be held.
    All(Vec<PermissionTemplate>),
    /// At least one permission must be held.
    Any(Vec<PermissionTemplate>),
}

/// What one action requires. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequirement {
    #[serde(default)]
    pub groups: Vec<RequirementGroup>,
}

impl ActionRequirement {
    pub const fn none() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn all(mut self, permissions: Vec<PermissionTemplate>) -> Self {
        self.groups.push(RequirementGroup::All(permissions));
        self
    }

    pub fn any(mut self, permissions: Vec<PermissionTemplate>) -> Self {
        self.groups.push(RequirementGroup::Any(permissions));
        self
    }
}

static NO_REQUIREMENT: ActionRequirement = ActionRequirement::none();

/// Action name → [`ActionRequirement`], fixed at process start.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    actions: HashMap<String, ActionRequirement>,
}

impl PermissionCatalog {
    /// A catalog with no entries: every action is unrestricted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in DAG and pool action table.
    ///
    /// Deleting or pausing a DAG needs the view-level capability plus
    /// edit rights on either every DAG or the targeted one.
    pub fn standard() -> Self {
        let edit_this_dag = || {
            vec![
                PermissionTemplate::named("can_dag_edit", "all_dags"),
                PermissionTemplate::target("can_dag_edit", "dag_id"),
            ]
        };

        Self::empty()
            .with_action(
                "trigger_dag",
                ActionRequirement::none()
                    .all(vec![PermissionTemplate::named("can_trigger", "Airflow")]),
            )
            .with_action(
                "delete_dag",
                ActionRequirement::none()
                    .all(vec![PermissionTemplate::named("can_delete", "Airflow")])
                    .any(edit_this_dag()),
            )
            .with_action(
                "dag_paused",
                ActionRequirement::none()
                    .all(vec![PermissionTemplate::named("can_paused", "Airflow")])
                    .any(edit_this_dag()),
            )
            .with_action(
                "create_pool",
                ActionRequirement::none()
                    .all(vec![PermissionTemplate::named("can_add", "PoolModelView")]),
            )
            .with_action(
                "delete_pool",
                ActionRequirement::none()
                    .all(vec![PermissionTemplate::named("can_delete", "PoolModelView")]),
            )
    }

    /// Add or replace the requirement for `action`.
    pub fn with_action(mut self, action: impl Into<String>, requirement: ActionRequirement) -> Self {
        self.actions.insert(action.into(), requirement);
        self
    }

    /// Merge configured entries, replacing built-in ones of the same name.
    pub fn extend(mut self, actions: impl IntoIterator<Item = (String, ActionRequirement)>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// The requirement for `action`; unknown actions get the empty one.
    pub fn requirements_for(&self, action: &str) -> &ActionRequirement {
        self.actions.get(action).unwrap_or(&NO_REQUIREMENT)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_has_no_requirement() {
        let catalog = PermissionCatalog::standard();
        assert!(catalog.requirements_for("list_dags").is_empty());
    }

    #[test]
    fn trigger_dag_needs_trigger_on_airflow() {
        let catalog = PermissionCatalog::standard();
        assert_eq!(
            catalog.requirements_for("trigger_dag").groups,
            vec![RequirementGroup::All(vec![PermissionTemplate::named(
                "can_trigger",
                "Airflow"
            )])]
        );
    }

    #[test]
    fn delete_dag_combines_all_and_any_groups() {
        let catalog = PermissionCatalog::standard();
        let groups = &catalog.requirements_for("delete_dag").groups;

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0],
            RequirementGroup::All(vec![PermissionTemplate::named("can_delete", "Airflow")])
        );
        assert_eq!(
            groups[1],
            RequirementGroup::Any(vec![
                PermissionTemplate::named("can_dag_edit", "all_dags"),
                PermissionTemplate::target("can_dag_edit", "dag_id"),
            ])
        );
    }

    #[test]
    fn placeholder_resolves_from_context() {
        let template = PermissionTemplate::target("can_dag_edit", "dag_id");
        let context = AccessContext::new().with("dag_id", "D1");

        assert_eq!(
            template.resolve(&context),
            Some(Permission::new("can_dag_edit", "D1"))
        );
        assert_eq!(template.resolve(&AccessContext::new()), None);
    }

    #[test]
    fn braces_in_config_mark_placeholders() {
        let template: PermissionTemplate = PermissionEntry {
            capability: "can_dag_read".into(),
            resource: "{dag_id}".into(),
        }
        .into();
        assert_eq!(template.scope, ResourceScope::Target("dag_id".into()));
        assert_eq!(template.to_string(), "can_dag_read on {dag_id}");
    }

    #[test]
    fn configured_entries_override_builtins() {
        let catalog = PermissionCatalog::standard().extend([(
            "trigger_dag".to_string(),
            ActionRequirement::none(),
        )]);
        assert!(catalog.requirements_for("trigger_dag").is_empty());
        assert!(!catalog.requirements_for("delete_dag").is_empty());
    }
}
