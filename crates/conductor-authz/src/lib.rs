//! Conductor Authz: bearer-token authentication, the per-action
//! permission catalog, and the authorization gate that evaluates it.
//!
//! Requests pass through an [`AccessGuard`]: first an
//! [`Authenticator`] (failure ⇒ 401), then the [`AuthorizationGate`]
//! (failure ⇒ 403).

pub mod authenticator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod roles;
pub mod token;

pub use authenticator::{AuthRequest, Authenticator, BearerTokenAuthenticator};
pub use catalog::{ActionRequirement, PermissionCatalog, PermissionTemplate, RequirementGroup};
pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::{AccessContext, AuthorizationGate, Decision, Denial};
pub use guard::{AccessError, AccessGuard};
pub use roles::RoleRegistry;
pub use token::AccessTokenClaims;
