//! Version-map reconciliation across module upgrades.
//!
//! The engine is built once by collecting each module's declared migration
//! handlers, then runs against a caller-supplied previous version map. The
//! returned map is all-or-nothing: any per-module failure aborts the run and
//! the caller must not persist a partial result.

use std::collections::{BTreeMap, HashMap};

use blockloom_module_api::{
    ExecContext, MigrationHandler, MigrationRegistrar, VersionMap,
};
use tracing::{debug, info};

use crate::capability::CapabilityKind;
use crate::error::{Error, Result};
use crate::registry::ModuleRegistry;

struct ScopedRegistrar<'a> {
    module: &'a str,
    handlers: BTreeMap<u64, MigrationHandler>,
}

impl MigrationRegistrar for ScopedRegistrar<'_> {
    fn register(&mut self, from_version: u64, handler: MigrationHandler) -> anyhow::Result<()> {
        if self.handlers.contains_key(&from_version) {
            return Err(Error::DuplicateMigration {
                module: self.module.to_string(),
                from_version,
            }
            .into());
        }
        self.handlers.insert(from_version, handler);
        Ok(())
    }
}

/// Runs forward migrations for known modules and genesis-initialization for
/// newly introduced ones, producing the updated version map.
pub struct MigrationEngine {
    handlers: HashMap<String, BTreeMap<u64, MigrationHandler>>,
}

impl std::fmt::Debug for MigrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationEngine")
            .field("modules", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MigrationEngine {
    /// Collects migration registrations from every module exposing
    /// Migrations, each through a registrar scoped to its own name.
    ///
    /// Registering two handlers for the same (module, from-version) fails
    /// the build.
    pub fn build(registry: &ModuleRegistry) -> Result<Self> {
        let mut handlers = HashMap::new();
        for (name, slot) in registry.modules_with(CapabilityKind::Migrations) {
            let Some(migrations) = slot.module.as_migrations() else {
                continue;
            };
            let mut scoped = ScopedRegistrar {
                module: name,
                handlers: BTreeMap::new(),
            };
            migrations
                .register_migrations(&mut scoped)
                .map_err(|cause| match cause.downcast::<Error>() {
                    Ok(error) => error,
                    Err(cause) => Error::registration(name, "migrations", cause),
                })?;
            debug!(
                target: "blockloom_runtime::migrate",
                module = %name,
                registered = scoped.handlers.len(),
                "migration handlers collected"
            );
            if !scoped.handlers.is_empty() {
                handlers.insert(name.to_string(), scoped.handlers);
            }
        }
        Ok(Self { handlers })
    }

    pub fn has_handler(&self, module: &str, from_version: u64) -> bool {
        self.handlers
            .get(module)
            .is_some_and(|versions| versions.contains_key(&from_version))
    }

    /// Walks the registry's migration order once, migrating modules present
    /// in `previous` and genesis-initializing modules absent from it.
    ///
    /// Every visited module is recorded in the returned map at its declared
    /// consensus version (0 when it reports none). A missing handler for a
    /// recorded from-version is a configuration error; nothing is skipped
    /// implicitly. On any error the accumulated map is discarded.
    pub fn run_migrations(
        &self,
        registry: &ModuleRegistry,
        ctx: &ExecContext,
        previous: &VersionMap,
    ) -> Result<VersionMap> {
        let mut updated = VersionMap::new();
        for name in &registry.order().migrations {
            let Some(slot) = registry.slot(name) else {
                continue;
            };
            let to_version = slot
                .module
                .as_consensus_version()
                .map(|versioned| versioned.consensus_version())
                .unwrap_or(0);

            match previous.get(name).copied() {
                Some(from_version) => {
                    if to_version < from_version {
                        return Err(Error::VersionRegression {
                            module: name.clone(),
                            from_version,
                            to_version,
                        });
                    }
                    if from_version == to_version {
                        debug!(
                            target: "blockloom_runtime::migrate",
                            module = %name,
                            version = to_version,
                            "module already current"
                        );
                    } else {
                        let handler = self
                            .handlers
                            .get(name)
                            .and_then(|versions| versions.get(&from_version))
                            .ok_or_else(|| Error::missing_migration(name, from_version))?;
                        info!(
                            target: "blockloom_runtime::migrate",
                            module = %name,
                            from_version,
                            to_version,
                            "migrating module"
                        );
                        handler(ctx).map_err(|cause| {
                            Error::migration(name, from_version, to_version, cause)
                        })?;
                    }
                }
                None => {
                    info!(
                        target: "blockloom_runtime::migrate",
                        module = %name,
                        version = to_version,
                        "initializing new module"
                    );
                    if let Some(genesis) = slot.module.as_genesis() {
                        let payload = genesis.default_genesis();
                        genesis
                            .init_genesis(ctx, &payload)
                            .map_err(|cause| Error::genesis(name, cause))?;
                    }
                }
            }

            updated.insert(name.clone(), to_version);
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "tests/migration_tests.rs"]
mod tests;
