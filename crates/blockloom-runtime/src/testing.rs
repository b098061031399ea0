//! Shared test doubles for the runtime test suites.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use blockloom_module_api::{
    BeginBlocker, EndBlocker, Envelope, ExecContext, HasConsensusVersion, HasGenesis,
    HasMigrations, HasServices, MigrationRegistrar, Module, PreBlocker, ServiceRegistrar,
    TxValidator, ValidatorUpdate, ValidatorUpdater,
};
use serde_json::{Value, json};

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn log_entries(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log").clone()
}

/// Configurable module double that appends `name:hook` to a shared log on
/// every invocation.
pub(crate) struct MockModule {
    name: String,
    log: CallLog,
    pre_block: bool,
    begin_block: bool,
    end_block: bool,
    tx_validate: bool,
    genesis: bool,
    services: bool,
    version: Option<u64>,
    updates: Option<Vec<ValidatorUpdate>>,
    migration_froms: Vec<u64>,
    failing_migration_froms: Vec<u64>,
    after: Vec<String>,
    fail_in: Option<&'static str>,
    received: Mutex<Option<Value>>,
}

impl MockModule {
    pub(crate) fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            pre_block: false,
            begin_block: false,
            end_block: false,
            tx_validate: false,
            genesis: false,
            services: false,
            version: None,
            updates: None,
            migration_froms: Vec::new(),
            failing_migration_froms: Vec::new(),
            after: Vec::new(),
            fail_in: None,
            received: Mutex::new(None),
        }
    }

    pub(crate) fn with_pre_block(mut self) -> Self {
        self.pre_block = true;
        self
    }

    pub(crate) fn with_begin_block(mut self) -> Self {
        self.begin_block = true;
        self
    }

    pub(crate) fn with_end_block(mut self) -> Self {
        self.end_block = true;
        self
    }

    pub(crate) fn with_tx_validate(mut self) -> Self {
        self.tx_validate = true;
        self
    }

    pub(crate) fn with_genesis(mut self) -> Self {
        self.genesis = true;
        self
    }

    pub(crate) fn with_services(mut self) -> Self {
        self.services = true;
        self
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Exposes ValidatorUpdate; an empty vec contributes nothing.
    pub(crate) fn with_updates(mut self, updates: Vec<ValidatorUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    pub(crate) fn with_migration(mut self, from_version: u64) -> Self {
        self.migration_froms.push(from_version);
        self
    }

    /// Registers a migration from `from_version` that logs and then errors.
    pub(crate) fn with_failing_migration(mut self, from_version: u64) -> Self {
        self.failing_migration_froms.push(from_version);
        self
    }

    pub(crate) fn with_after(mut self, deps: &[&str]) -> Self {
        self.after = deps.iter().map(ToString::to_string).collect();
        self
    }

    /// Makes the named hook return an error after logging.
    pub(crate) fn with_fail_in(mut self, hook: &'static str) -> Self {
        self.fail_in = Some(hook);
        self
    }

    fn record(&self, hook: &str) {
        self.log
            .lock()
            .expect("call log")
            .push(format!("{}:{hook}", self.name));
    }

    fn run_hook(&self, hook: &str) -> Result<()> {
        self.record(hook);
        if self.fail_in == Some(hook) {
            return Err(anyhow!("{hook} rejected by {}", self.name));
        }
        Ok(())
    }
}

impl PreBlocker for MockModule {
    fn pre_block(&self, _ctx: &ExecContext) -> Result<()> {
        self.run_hook("pre_block")
    }
}

impl BeginBlocker for MockModule {
    fn begin_block(&self, _ctx: &ExecContext) -> Result<()> {
        self.run_hook("begin_block")
    }
}

impl EndBlocker for MockModule {
    fn end_block(&self, _ctx: &ExecContext) -> Result<()> {
        self.run_hook("end_block")
    }
}

impl TxValidator for MockModule {
    fn validate_tx(&self, _ctx: &ExecContext, _request: &Envelope) -> Result<()> {
        self.run_hook("tx_validate")
    }
}

impl HasGenesis for MockModule {
    fn default_genesis(&self) -> Value {
        json!({ "seed": self.name })
    }

    fn init_genesis(&self, _ctx: &ExecContext, payload: &Value) -> Result<()> {
        *self.received.lock().expect("received payload") = Some(payload.clone());
        self.run_hook("init_genesis")
    }

    fn export_genesis(&self, _ctx: &ExecContext) -> Result<Value> {
        self.record("export_genesis");
        let received = self.received.lock().expect("received payload").clone();
        Ok(received.unwrap_or_else(|| self.default_genesis()))
    }
}

impl HasMigrations for MockModule {
    fn register_migrations(&self, registrar: &mut dyn MigrationRegistrar) -> Result<()> {
        for from_version in &self.migration_froms {
            let log = Arc::clone(&self.log);
            let name = self.name.clone();
            let from_version = *from_version;
            registrar.register(
                from_version,
                Box::new(move |_ctx| {
                    log.lock()
                        .expect("call log")
                        .push(format!("{name}:migrate:{from_version}"));
                    Ok(())
                }),
            )?;
        }
        for from_version in &self.failing_migration_froms {
            let log = Arc::clone(&self.log);
            let name = self.name.clone();
            let from_version = *from_version;
            registrar.register(
                from_version,
                Box::new(move |_ctx| {
                    log.lock()
                        .expect("call log")
                        .push(format!("{name}:migrate:{from_version}"));
                    Err(anyhow!("migration from {from_version} failed in {name}"))
                }),
            )?;
        }
        Ok(())
    }
}

impl HasServices for MockModule {
    fn register_services(&self, _registrar: &mut dyn ServiceRegistrar) -> Result<()> {
        Ok(())
    }
}

impl HasConsensusVersion for MockModule {
    fn consensus_version(&self) -> u64 {
        self.version.unwrap_or(0)
    }
}

impl ValidatorUpdater for MockModule {
    fn validator_updates(&self, _ctx: &ExecContext) -> Result<Vec<ValidatorUpdate>> {
        self.record("validator_updates");
        Ok(self.updates.clone().unwrap_or_default())
    }
}

impl Module for MockModule {
    fn as_pre_blocker(&self) -> Option<&dyn PreBlocker> {
        self.pre_block.then_some(self as &dyn PreBlocker)
    }

    fn as_begin_blocker(&self) -> Option<&dyn BeginBlocker> {
        self.begin_block.then_some(self as &dyn BeginBlocker)
    }

    fn as_end_blocker(&self) -> Option<&dyn EndBlocker> {
        self.end_block.then_some(self as &dyn EndBlocker)
    }

    fn as_tx_validator(&self) -> Option<&dyn TxValidator> {
        self.tx_validate.then_some(self as &dyn TxValidator)
    }

    fn as_genesis(&self) -> Option<&dyn HasGenesis> {
        self.genesis.then_some(self as &dyn HasGenesis)
    }

    fn as_migrations(&self) -> Option<&dyn HasMigrations> {
        let declares = !self.migration_froms.is_empty() || !self.failing_migration_froms.is_empty();
        declares.then_some(self as &dyn HasMigrations)
    }

    fn as_services(&self) -> Option<&dyn HasServices> {
        self.services.then_some(self as &dyn HasServices)
    }

    fn as_consensus_version(&self) -> Option<&dyn HasConsensusVersion> {
        self.version.is_some().then_some(self as &dyn HasConsensusVersion)
    }

    fn as_validator_updater(&self) -> Option<&dyn ValidatorUpdater> {
        self.updates.is_some().then_some(self as &dyn ValidatorUpdater)
    }

    fn migrate_after(&self) -> Vec<String> {
        self.after.clone()
    }
}
