use blockloom_module_api::RouteTableKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Runtime error taxonomy.
///
/// Configuration errors are fatal at construction/build time and must
/// prevent startup. Execution errors abort only the current phase or
/// request. `ValidatorUpdateConflict` is an invariant violation: two modules
/// disagreeing about authority is never resolved by picking one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate module name `{name}`")]
    DuplicateModule { name: String },
    #[error("all modules with the matching capability must be listed in `{phase}`, missing: {}", missing.join(", "))]
    MissingModules {
        phase: &'static str,
        missing: Vec<String>,
    },
    #[error("`{phase}` lists unknown module `{name}`")]
    UnknownModule { phase: &'static str, name: String },
    #[error("{table} route `{type_id}` already registered by module `{first}`, rejected for `{second}`")]
    DuplicateRoute {
        table: RouteTableKind,
        type_id: String,
        first: String,
        second: String,
    },
    #[error("module `{module}` failed to register {target}: {cause}")]
    Registration {
        module: String,
        target: &'static str,
        cause: anyhow::Error,
    },
    #[error("module `{module}` registered two migrations from version {from_version}")]
    DuplicateMigration { module: String, from_version: u64 },
    #[error("no migration registered for module `{module}` from version {from_version}")]
    MissingMigration { module: String, from_version: u64 },
    #[error("module `{module}` declares consensus version {to_version} below recorded {from_version}")]
    VersionRegression {
        module: String,
        from_version: u64,
        to_version: u64,
    },
    #[error("migration order dependency cycle between: {}", members.join(", "))]
    MigrationCycle { members: Vec<String> },
    #[error("{phase} failed for module `{module}`: {cause}")]
    Lifecycle {
        phase: &'static str,
        module: String,
        cause: anyhow::Error,
    },
    #[error("request rejected by module `{module}`: {cause}")]
    TxRejected { module: String, cause: anyhow::Error },
    #[error("genesis failed for module `{module}`: {cause}")]
    Genesis { module: String, cause: anyhow::Error },
    #[error("migration of module `{module}` from version {from_version} to {to_version} failed: {cause}")]
    Migration {
        module: String,
        from_version: u64,
        to_version: u64,
        cause: anyhow::Error,
    },
    #[error("no {table} route for `{type_id}`")]
    UnknownRoute {
        table: RouteTableKind,
        type_id: String,
    },
    #[error("handler for `{type_id}` failed: {cause}")]
    Handler {
        type_id: String,
        cause: anyhow::Error,
    },
    #[error("validator updates already contributed by module `{first}`, rejected for `{second}`")]
    ValidatorUpdateConflict { first: String, second: String },
}

impl Error {
    pub fn duplicate_module(name: impl Into<String>) -> Self {
        Self::DuplicateModule { name: name.into() }
    }

    pub fn missing_modules(phase: &'static str, missing: Vec<String>) -> Self {
        Self::MissingModules { phase, missing }
    }

    pub fn unknown_module(phase: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownModule {
            phase,
            name: name.into(),
        }
    }

    pub fn duplicate_route(
        table: RouteTableKind,
        type_id: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateRoute {
            table,
            type_id: type_id.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn registration(
        module: impl Into<String>,
        target: &'static str,
        cause: anyhow::Error,
    ) -> Self {
        Self::Registration {
            module: module.into(),
            target,
            cause,
        }
    }

    pub fn lifecycle(phase: &'static str, module: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Lifecycle {
            phase,
            module: module.into(),
            cause,
        }
    }

    pub fn tx_rejected(module: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::TxRejected {
            module: module.into(),
            cause,
        }
    }

    pub fn genesis(module: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Genesis {
            module: module.into(),
            cause,
        }
    }

    pub fn migration(
        module: impl Into<String>,
        from_version: u64,
        to_version: u64,
        cause: anyhow::Error,
    ) -> Self {
        Self::Migration {
            module: module.into(),
            from_version,
            to_version,
            cause,
        }
    }

    pub fn missing_migration(module: impl Into<String>, from_version: u64) -> Self {
        Self::MissingMigration {
            module: module.into(),
            from_version,
        }
    }

    pub fn unknown_route(table: RouteTableKind, type_id: impl Into<String>) -> Self {
        Self::UnknownRoute {
            table,
            type_id: type_id.into(),
        }
    }

    pub fn handler(type_id: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Handler {
            type_id: type_id.into(),
            cause,
        }
    }

    pub fn validator_update_conflict(
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::ValidatorUpdateConflict {
            first: first.into(),
            second: second.into(),
        }
    }
}
