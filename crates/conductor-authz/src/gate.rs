//! The authorization gate: evaluates catalog requirements against the
//! permissions an identity holds right now.

use std::collections::HashMap;

use conductor_core::access::PermissionChecker;
use conductor_core::models::identity::Identity;
use tracing::{debug, warn};

use crate::catalog::{PermissionCatalog, PermissionTemplate, RequirementGroup};

/// Values extracted from the request that placeholders resolve against
/// (e.g., the `dag_id` an action targets).
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    values: HashMap<String, String>,
}

impl AccessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Which kind of group rejected the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    All,
    Any,
}

/// Audit detail for a denial. Never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub group: GroupKind,
    /// The unmet permission of an `All` group, or every alternative of
    /// an `Any` group.
    pub unmet: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluates a [`PermissionCatalog`] through an injected
/// [`PermissionChecker`].
///
/// Holds no per-identity state: every call asks the checker again.
pub struct AuthorizationGate<P: PermissionChecker> {
    catalog: PermissionCatalog,
    checker: P,
}

impl<P: PermissionChecker> AuthorizationGate<P> {
    pub fn new(catalog: PermissionCatalog, checker: P) -> Self {
        Self { catalog, checker }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn checker(&self) -> &P {
        &self.checker
    }

    /// Decide whether `identity` may perform `action` in `context`.
    ///
    /// Groups are evaluated in catalog order and the first failing group
    /// denies. An action with no catalog entry is allowed.
    pub async fn authorize(
        &self,
        identity: &Identity,
        action: &str,
        context: &AccessContext,
    ) -> Decision {
        let requirement = self.catalog.requirements_for(action);
        if requirement.is_empty() {
            debug!(action, "No permission requirement for action");
            return Decision::Allow;
        }

        for group in &requirement.groups {
            match group {
                RequirementGroup::All(templates) => {
                    for template in templates {
                        if let Err(unmet) = self.holds(identity, template, context).await {
                            return Decision::Deny(Denial {
                                group: GroupKind::All,
                                unmet: vec![unmet],
                            });
                        }
                    }
                }
                RequirementGroup::Any(templates) => {
                    let mut unmet = Vec::with_capacity(templates.len());
                    let mut satisfied = false;
                    for template in templates {
                        match self.holds(identity, template, context).await {
                            Ok(()) => {
                                satisfied = true;
                                break;
                            }
                            Err(missing) => unmet.push(missing),
                        }
                    }
                    if !satisfied {
                        return Decision::Deny(Denial {
                            group: GroupKind::Any,
                            unmet,
                        });
                    }
                }
            }
        }

        Decision::Allow
    }

    /// `Err` carries the rendered permission that is not held.
    async fn holds(
        &self,
        identity: &Identity,
        template: &PermissionTemplate,
        context: &AccessContext,
    ) -> Result<(), String> {
        let Some(permission) = template.resolve(context) else {
            warn!(
                subject = %identity.subject,
                permission = %template,
                "Context lacks the resource id this permission needs"
            );
            return Err(template.to_string());
        };

        if self.checker.has_access(identity, &permission).await {
            Ok(())
        } else {
            Err(permission.to_string())
        }
    }
}
