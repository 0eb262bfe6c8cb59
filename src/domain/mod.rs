//! Domain layer for the selfheal remediation workflow
//!
//! This module contains the run state, the stage machine, and the
//! collaborator ports that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CollaboratorError, DomainError, DomainResult};
