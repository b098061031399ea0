//! Genesis import/export over the registry's configured order.

use std::collections::BTreeMap;

use blockloom_module_api::ExecContext;
use tracing::debug;

use crate::capability::CapabilityKind;
use crate::error::{Error, Result};
use crate::registry::ModuleRegistry;

impl ModuleRegistry {
    /// Default genesis payload for every module exposing Genesis, keyed by
    /// module name.
    pub fn default_genesis(&self) -> BTreeMap<String, serde_json::Value> {
        let mut payloads = BTreeMap::new();
        for (name, slot) in self.modules_with(CapabilityKind::Genesis) {
            let Some(genesis) = slot.module.as_genesis() else {
                continue;
            };
            payloads.insert(name.to_string(), genesis.default_genesis());
        }
        payloads
    }

    /// Initializes every Genesis module in `init_genesis` order.
    ///
    /// A module with no entry in `payloads` consumes its own default
    /// payload.
    pub fn init_genesis(
        &self,
        ctx: &ExecContext,
        payloads: &BTreeMap<String, serde_json::Value>,
    ) -> Result<()> {
        for name in &self.order().init_genesis {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::Genesis) {
                continue;
            }
            let Some(genesis) = slot.module.as_genesis() else {
                continue;
            };
            let payload = match payloads.get(name) {
                Some(payload) => payload.clone(),
                None => genesis.default_genesis(),
            };
            debug!(target: "blockloom_runtime::lifecycle", module = %name, "init genesis");
            genesis
                .init_genesis(ctx, &payload)
                .map_err(|cause| Error::genesis(name, cause))?;
        }
        Ok(())
    }

    /// Exports every Genesis module's state in `export_genesis` order.
    pub fn export_genesis(
        &self,
        ctx: &ExecContext,
    ) -> Result<BTreeMap<String, serde_json::Value>> {
        let mut payloads = BTreeMap::new();
        for name in &self.order().export_genesis {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::Genesis) {
                continue;
            }
            let Some(genesis) = slot.module.as_genesis() else {
                continue;
            };
            debug!(target: "blockloom_runtime::lifecycle", module = %name, "export genesis");
            let payload = genesis
                .export_genesis(ctx)
                .map_err(|cause| Error::genesis(name, cause))?;
            payloads.insert(name.to_string(), payload);
        }
        Ok(payloads)
    }
}
