use std::collections::{BTreeMap, BTreeSet, HashMap};

use blockloom_module_api::Module;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{CapabilityKind, CapabilitySet, probe};
use crate::error::{Error, Result};

/// Per-phase ordering configuration.
///
/// Every list is optional; an unset list defaults to registration order,
/// except `migrations` which defaults to a dependency-aware topological
/// order over the modules' `migrate_after` declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleOrder {
    pub pre_blockers: Option<Vec<String>>,
    pub begin_blockers: Option<Vec<String>>,
    pub end_blockers: Option<Vec<String>>,
    pub tx_validation: Option<Vec<String>>,
    pub init_genesis: Option<Vec<String>>,
    pub export_genesis: Option<Vec<String>>,
    pub migrations: Option<Vec<String>>,
}

/// Ordering configuration with every list resolved to a concrete sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrder {
    pub pre_blockers: Vec<String>,
    pub begin_blockers: Vec<String>,
    pub end_blockers: Vec<String>,
    pub tx_validation: Vec<String>,
    pub init_genesis: Vec<String>,
    pub export_genesis: Vec<String>,
    pub migrations: Vec<String>,
}

pub(crate) struct ModuleSlot {
    pub(crate) module: Box<dyn Module>,
    pub(crate) capabilities: CapabilitySet,
}

/// Accumulates modules and ordering configuration, then freezes into a
/// validated [`ModuleRegistry`].
#[derive(Default)]
pub struct ModuleRegistryBuilder {
    modules: Vec<(String, Box<dyn Module>)>,
    order: ModuleOrder,
}

impl ModuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(self, name: impl Into<String>, module: impl Module + 'static) -> Self {
        self.with_boxed_module(name, Box::new(module))
    }

    pub fn with_boxed_module(mut self, name: impl Into<String>, module: Box<dyn Module>) -> Self {
        self.modules.push((name.into(), module));
        self
    }

    pub fn with_order(mut self, order: ModuleOrder) -> Self {
        self.order = order;
        self
    }

    /// Validates the configuration and returns the immutable registry.
    ///
    /// Fails on duplicate module names, ordering lists naming unregistered
    /// modules, modules with a phase capability missing from that phase's
    /// list, and migration dependency cycles. A misconfigured registry must
    /// never start serving.
    pub fn build(self) -> Result<ModuleRegistry> {
        let mut slots = HashMap::with_capacity(self.modules.len());
        let mut registration_order = Vec::with_capacity(self.modules.len());
        for (name, module) in self.modules {
            let capabilities = probe(module.as_ref());
            debug!(
                target: "blockloom_runtime::registry",
                module = %name,
                capabilities = ?capabilities,
                "module registered"
            );
            if slots
                .insert(name.clone(), ModuleSlot { module, capabilities })
                .is_some()
            {
                return Err(Error::duplicate_module(name));
            }
            registration_order.push(name);
        }

        let order = resolve_order(self.order, &slots, &registration_order)?;
        validate_order(&order, &slots)?;

        debug!(
            target: "blockloom_runtime::registry",
            modules = registration_order.len(),
            "module registry built"
        );
        Ok(ModuleRegistry {
            slots,
            registration_order,
            order,
        })
    }
}

/// The immutable set of named modules plus the validated per-phase ordering.
///
/// No method adds, removes, or reorders modules after construction. The
/// registry is read-only and may be shared across logical execution cycles
/// without locking.
pub struct ModuleRegistry {
    pub(crate) slots: HashMap<String, ModuleSlot>,
    pub(crate) registration_order: Vec<String>,
    order: ResolvedOrder,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.slots.keys().collect::<Vec<_>>())
            .field("registration_order", &self.registration_order)
            .field("order", &self.order)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::new()
    }

    pub fn order(&self) -> &ResolvedOrder {
        &self.order
    }

    /// Module names in registration order.
    pub fn module_names(&self) -> &[String] {
        &self.registration_order
    }

    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        self.slots.get(name).map(|slot| slot.module.as_ref())
    }

    pub fn capabilities(&self, name: &str) -> Option<CapabilitySet> {
        self.slots.get(name).map(|slot| slot.capabilities)
    }

    pub fn len(&self) -> usize {
        self.registration_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registration_order.is_empty()
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&ModuleSlot> {
        self.slots.get(name)
    }

    /// Modules exposing `kind`, in registration order.
    pub(crate) fn modules_with(
        &self,
        kind: CapabilityKind,
    ) -> impl Iterator<Item = (&str, &ModuleSlot)> {
        self.registration_order.iter().filter_map(move |name| {
            let slot = self.slots.get(name)?;
            slot.capabilities.contains(kind).then_some((name.as_str(), slot))
        })
    }
}

fn resolve_order(
    order: ModuleOrder,
    slots: &HashMap<String, ModuleSlot>,
    registration_order: &[String],
) -> Result<ResolvedOrder> {
    let default = || registration_order.to_vec();
    let resolved = ResolvedOrder {
        pre_blockers: order.pre_blockers.unwrap_or_else(default),
        begin_blockers: order.begin_blockers.unwrap_or_else(default),
        end_blockers: order.end_blockers.unwrap_or_else(default),
        tx_validation: order.tx_validation.unwrap_or_else(default),
        init_genesis: order.init_genesis.unwrap_or_else(default),
        export_genesis: order.export_genesis.unwrap_or_else(default),
        migrations: match order.migrations {
            Some(explicit) => explicit,
            None => default_migration_order(slots)?,
        },
    };
    Ok(resolved)
}

/// Deterministic topological order over `migrate_after` declarations:
/// dependencies first, lexicographically smallest name first among ties.
fn default_migration_order(slots: &HashMap<String, ModuleSlot>) -> Result<Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = slots.keys().map(|name| (name.clone(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, slot) in slots {
        let after: BTreeSet<String> = slot
            .module
            .migrate_after()
            .into_iter()
            .filter(|dep| dep != name && slots.contains_key(dep))
            .collect();
        for dep in after {
            if let Some(degree) = indegree.get_mut(name) {
                *degree += 1;
            }
            dependents.entry(dep).or_default().push(name.clone());
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(name, degree)| (*degree == 0).then(|| name.clone()))
        .collect();
    let mut ordered = Vec::with_capacity(slots.len());
    while let Some(name) = ready.pop_first() {
        if let Some(next) = dependents.get(&name) {
            for dependent in next {
                let Some(degree) = indegree.get_mut(dependent) else {
                    continue;
                };
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.insert(dependent.clone());
                }
            }
        }
        ordered.push(name);
    }

    if ordered.len() != slots.len() {
        let mut members: Vec<String> = slots
            .keys()
            .filter(|name| !ordered.contains(name))
            .cloned()
            .collect();
        members.sort();
        return Err(Error::MigrationCycle { members });
    }
    Ok(ordered)
}

fn validate_order(order: &ResolvedOrder, slots: &HashMap<String, ModuleSlot>) -> Result<()> {
    let phases: [(&'static str, &[String], Option<CapabilityKind>); 7] = [
        ("pre_blockers", &order.pre_blockers, Some(CapabilityKind::PreBlock)),
        ("begin_blockers", &order.begin_blockers, Some(CapabilityKind::BeginBlock)),
        ("end_blockers", &order.end_blockers, Some(CapabilityKind::EndBlock)),
        ("tx_validation", &order.tx_validation, Some(CapabilityKind::TxValidate)),
        ("init_genesis", &order.init_genesis, Some(CapabilityKind::Genesis)),
        ("export_genesis", &order.export_genesis, Some(CapabilityKind::Genesis)),
        ("migrations", &order.migrations, None),
    ];

    for (phase, listed, required) in phases {
        assert_no_forgotten_modules(phase, listed, required, slots)?;
    }
    Ok(())
}

/// Checks that `listed` names are all registered and that no module holding
/// the phase's capability was left out. Missing names are reported sorted.
fn assert_no_forgotten_modules(
    phase: &'static str,
    listed: &[String],
    required: Option<CapabilityKind>,
    slots: &HashMap<String, ModuleSlot>,
) -> Result<()> {
    for name in listed {
        if !slots.contains_key(name) {
            return Err(Error::unknown_module(phase, name));
        }
    }

    let listed: BTreeSet<&str> = listed.iter().map(String::as_str).collect();
    let mut missing: Vec<String> = slots
        .iter()
        .filter(|(name, slot)| {
            let subject = match required {
                Some(kind) => slot.capabilities.contains(kind),
                None => true,
            };
            subject && !listed.contains(name.as_str())
        })
        .map(|(name, _)| name.clone())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(Error::missing_modules(phase, missing))
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
