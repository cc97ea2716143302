//! Tenantsim Core - Shared types
//!
//! This crate defines the vocabulary used by the simulation engine and its driver:
//! - Value-based identifiers for hosts, VMs, jobs and tenants
//! - The job lifecycle (CREATED → QUEUED → RUNNING → FINISHED)
//! - The scheduling policy selector
//! - Error types

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;
