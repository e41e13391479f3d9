//! Domain models for Conductor.
//!
//! These are the value types shared across all crates.

pub mod checkpoint;
pub mod identity;
pub mod permission;
pub mod role;
pub mod worker;
