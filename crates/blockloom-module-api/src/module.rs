use anyhow::Result;

use crate::context::ExecContext;
use crate::envelope::Envelope;
use crate::registrar::{MigrationRegistrar, ServiceRegistrar};
use crate::types::ValidatorUpdate;

/// A named, independently authored unit of business logic.
///
/// Capabilities are exposed through the `as_*` accessors, which default to
/// `None`. The runtime probes each accessor exactly once at registration
/// time; returning a different answer on later calls has no effect.
///
/// A module implementing a capability trait on itself exposes it by
/// overriding the matching accessor:
///
/// ```
/// use blockloom_module_api::{BeginBlocker, ExecContext, Module};
///
/// struct Minter;
///
/// impl BeginBlocker for Minter {
///     fn begin_block(&self, _ctx: &ExecContext) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// impl Module for Minter {
///     fn as_begin_blocker(&self) -> Option<&dyn BeginBlocker> {
///         Some(self)
///     }
/// }
/// ```
pub trait Module: Send + Sync {
    fn as_pre_blocker(&self) -> Option<&dyn PreBlocker> {
        None
    }

    fn as_begin_blocker(&self) -> Option<&dyn BeginBlocker> {
        None
    }

    fn as_end_blocker(&self) -> Option<&dyn EndBlocker> {
        None
    }

    fn as_tx_validator(&self) -> Option<&dyn TxValidator> {
        None
    }

    fn as_genesis(&self) -> Option<&dyn HasGenesis> {
        None
    }

    fn as_migrations(&self) -> Option<&dyn HasMigrations> {
        None
    }

    fn as_services(&self) -> Option<&dyn HasServices> {
        None
    }

    fn as_consensus_version(&self) -> Option<&dyn HasConsensusVersion> {
        None
    }

    fn as_validator_updater(&self) -> Option<&dyn ValidatorUpdater> {
        None
    }

    /// Names of modules whose migrations must run before this module's.
    ///
    /// Only consulted when the host does not configure an explicit migration
    /// order. Names not present in the registry are ignored.
    fn migrate_after(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Runs at the start of a cycle, before the body.
pub trait PreBlocker: Send + Sync {
    fn pre_block(&self, ctx: &ExecContext) -> Result<()>;
}

/// Runs after PreBlock, before request dispatch.
pub trait BeginBlocker: Send + Sync {
    fn begin_block(&self, ctx: &ExecContext) -> Result<()>;
}

/// Runs at the end of a cycle.
pub trait EndBlocker: Send + Sync {
    fn end_block(&self, ctx: &ExecContext) -> Result<()>;
}

/// Validates one inbound request before it enters the body of a cycle.
///
/// The first failing validator rejects the request; validation is never
/// retried.
pub trait TxValidator: Send + Sync {
    fn validate_tx(&self, ctx: &ExecContext, request: &Envelope) -> Result<()>;
}

/// Genesis import/export for a module's initial state.
pub trait HasGenesis: Send + Sync {
    /// Default genesis payload used at startup and when the module is
    /// introduced by a migration run.
    fn default_genesis(&self) -> serde_json::Value;

    fn init_genesis(&self, ctx: &ExecContext, payload: &serde_json::Value) -> Result<()>;

    fn export_genesis(&self, ctx: &ExecContext) -> Result<serde_json::Value>;
}

/// Declares forward migrations, one handler per from-version.
pub trait HasMigrations: Send + Sync {
    fn register_migrations(&self, registrar: &mut dyn MigrationRegistrar) -> Result<()>;
}

/// Declares request/response handlers at router build time.
pub trait HasServices: Send + Sync {
    fn register_services(&self, registrar: &mut dyn ServiceRegistrar) -> Result<()>;
}

/// Reports the module's current consensus (schema/behavior) version.
///
/// Modules without this capability are recorded at version 0.
pub trait HasConsensusVersion: Send + Sync {
    fn consensus_version(&self) -> u64;
}

/// Contributes validator-set changes at the end of a cycle.
///
/// At most one module may return a non-empty list per cycle; a second
/// non-empty contribution is rejected by the runtime as a conflict.
pub trait ValidatorUpdater: Send + Sync {
    fn validator_updates(&self, ctx: &ExecContext) -> Result<Vec<ValidatorUpdate>>;
}
