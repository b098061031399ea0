//! Phase execution over a validated registry.
//!
//! Phases run single-threaded in configured list order; the first module
//! error aborts the phase wrapped with phase and module name. Partial
//! effects of already-executed modules are not rolled back here; the caller
//! owns transactional boundaries.

use blockloom_module_api::{Envelope, ExecContext, ValidatorUpdate};
use tracing::trace;

use crate::capability::CapabilityKind;
use crate::error::{Error, Result};
use crate::registry::ModuleRegistry;

/// Outcome of one end-block execution.
#[derive(Debug, Default)]
pub struct EndBlockResult {
    /// Name of the single module that contributed the updates, if any.
    pub authority: Option<String>,
    pub validator_updates: Vec<ValidatorUpdate>,
}

impl ModuleRegistry {
    /// Runs every configured pre-blocker at the start of a cycle.
    pub fn pre_block(&self, ctx: &ExecContext) -> Result<()> {
        for name in &self.order().pre_blockers {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::PreBlock) {
                continue;
            }
            let Some(hook) = slot.module.as_pre_blocker() else {
                continue;
            };
            trace!(target: "blockloom_runtime::lifecycle", module = %name, height = ctx.height(), "pre-block");
            hook.pre_block(ctx)
                .map_err(|cause| Error::lifecycle("pre-block", name, cause))?;
        }
        Ok(())
    }

    /// Runs every configured begin-blocker after PreBlock.
    pub fn begin_block(&self, ctx: &ExecContext) -> Result<()> {
        for name in &self.order().begin_blockers {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::BeginBlock) {
                continue;
            }
            let Some(hook) = slot.module.as_begin_blocker() else {
                continue;
            };
            trace!(target: "blockloom_runtime::lifecycle", module = %name, height = ctx.height(), "begin-block");
            hook.begin_block(ctx)
                .map_err(|cause| Error::lifecycle("begin-block", name, cause))?;
        }
        Ok(())
    }

    /// Runs every configured end-blocker, then collects validator updates.
    ///
    /// Validator-update modules are asked in registration order after the
    /// ordered pass. The first non-empty contribution claims authority for
    /// the cycle; a second non-empty contribution is a conflict error, never
    /// a merge.
    pub fn end_block(&self, ctx: &ExecContext) -> Result<EndBlockResult> {
        for name in &self.order().end_blockers {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::EndBlock) {
                continue;
            }
            let Some(hook) = slot.module.as_end_blocker() else {
                continue;
            };
            trace!(target: "blockloom_runtime::lifecycle", module = %name, height = ctx.height(), "end-block");
            hook.end_block(ctx)
                .map_err(|cause| Error::lifecycle("end-block", name, cause))?;
        }

        let mut result = EndBlockResult::default();
        for (name, slot) in self.modules_with(CapabilityKind::ValidatorUpdate) {
            let Some(updater) = slot.module.as_validator_updater() else {
                continue;
            };
            let updates = updater
                .validator_updates(ctx)
                .map_err(|cause| Error::lifecycle("validator-update", name, cause))?;
            if updates.is_empty() {
                continue;
            }
            if let Some(first) = &result.authority {
                return Err(Error::validator_update_conflict(first, name));
            }
            result.authority = Some(name.to_string());
            result.validator_updates = updates;
        }
        Ok(result)
    }

    /// Validates one inbound request against every configured validator.
    ///
    /// The first failure short-circuits and surfaces as a rejected request;
    /// nothing is retried.
    pub fn validate_tx(&self, ctx: &ExecContext, request: &Envelope) -> Result<()> {
        for name in &self.order().tx_validation {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            if !slot.capabilities.contains(CapabilityKind::TxValidate) {
                continue;
            }
            let Some(validator) = slot.module.as_tx_validator() else {
                continue;
            };
            trace!(target: "blockloom_runtime::lifecycle", module = %name, type_id = %request.type_id, "tx-validate");
            validator
                .validate_tx(ctx, request)
                .map_err(|cause| Error::tx_rejected(name, cause))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
