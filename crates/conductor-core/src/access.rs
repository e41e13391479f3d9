//! The permission-check capability consumed by the authorization gate.

use crate::error::ConductorResult;
use crate::models::identity::Identity;
use crate::models::permission::Permission;
use crate::models::role::Role;

/// Answers whether an identity currently holds a permission.
///
/// Implementations must be safe for concurrent reads. Callers never cache
/// answers: roles may change between two calls and the next call must see
/// the change.
pub trait PermissionChecker: Send + Sync {
    /// Whether `identity` holds exactly `permission`.
    ///
    /// Backends that fail to answer must return `false`.
    fn has_access(
        &self,
        identity: &Identity,
        permission: &Permission,
    ) -> impl Future<Output = bool> + Send;

    /// Look up a role and the permissions it grants.
    fn find_role(&self, name: &str) -> impl Future<Output = ConductorResult<Role>> + Send;
}

impl<P: PermissionChecker> PermissionChecker for std::sync::Arc<P> {
    fn has_access(
        &self,
        identity: &Identity,
        permission: &Permission,
    ) -> impl Future<Output = bool> + Send {
        (**self).has_access(identity, permission)
    }

    fn find_role(&self, name: &str) -> impl Future<Output = ConductorResult<Role>> + Send {
        (**self).find_role(name)
    }
}
