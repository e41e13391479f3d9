//! Conductor Core: domain models, the error taxonomy, and the traits
//! that storage and permission backends implement.
//!
//! Nothing in this crate performs I/O. The database crate implements
//! [`repository::CheckpointRepository`] and
//! [`repository::WorkerIdentityRepository`]; the authorization crate and
//! the database crate both provide [`access::PermissionChecker`]s.

pub mod access;
pub mod error;
pub mod models;
pub mod repository;

pub use error::{ConductorError, ConductorResult};
