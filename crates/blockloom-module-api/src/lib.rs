//! Module-facing API surface for the Blockloom runtime.
//!
//! Module authors implement [`Module`] plus any of the optional capability
//! traits; the runtime probes capabilities once at registration and drives
//! the lifecycle through them. Nothing in this crate performs orchestration.

mod context;
mod envelope;
mod module;
mod registrar;
mod types;

pub use context::{CancelFlag, ExecContext};
pub use envelope::{Envelope, TypedMessage};
pub use module::{
    BeginBlocker, EndBlocker, HasConsensusVersion, HasGenesis, HasMigrations, HasServices, Module,
    PreBlocker, TxValidator, ValidatorUpdater,
};
pub use registrar::{
    MigrationHandler, MigrationRegistrar, RawHandler, RouteTableKind, ServiceRegistrar,
    ServiceRegistrarExt,
};
pub use types::{ValidatorUpdate, VersionMap};
