//! Orchestration core of the Blockloom application runtime.
//!
//! Coordinates independently authored modules through a fixed sequence of
//! lifecycle phases per processing cycle and routes typed inbound requests
//! to module-provided handlers:
//!
//! - [`ModuleRegistry`] holds the immutable module set plus the validated
//!   per-phase ordering and executes the lifecycle phases.
//! - [`Router`] dispatches opaque requests by type identifier against
//!   build-time-populated command/query tables.
//! - [`MigrationEngine`] reconciles a persisted version map against each
//!   module's declared consensus version.
//!
//! Construction is fail-fast: a misconfigured registry, router, or engine
//! never starts serving. Execution is single-threaded and sequential by
//! design; ordering across modules is an externally observable guarantee.

mod capability;
mod error;
mod genesis;
mod lifecycle;
mod migrations;
mod registry;
mod router;
#[cfg(test)]
mod testing;

pub use capability::{CapabilityKind, CapabilitySet, probe};
pub use error::{Error, Result};
pub use lifecycle::EndBlockResult;
pub use migrations::MigrationEngine;
pub use registry::{ModuleOrder, ModuleRegistry, ModuleRegistryBuilder, ResolvedOrder};
pub use router::Router;
