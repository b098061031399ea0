use std::fmt;

use blockloom_module_api::Module;
use serde::{Deserialize, Serialize};

/// One optional behavior a module may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    PreBlock,
    BeginBlock,
    EndBlock,
    TxValidate,
    Genesis,
    Migrations,
    Services,
    ConsensusVersion,
    ValidatorUpdate,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 9] = [
        Self::PreBlock,
        Self::BeginBlock,
        Self::EndBlock,
        Self::TxValidate,
        Self::Genesis,
        Self::Migrations,
        Self::Services,
        Self::ConsensusVersion,
        Self::ValidatorUpdate,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A module's capability flags, computed once at registration and never
/// recomputed afterward.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn contains(self, kind: CapabilityKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: CapabilityKind) {
        self.0 |= kind.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<CapabilityKind> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = CapabilityKind>>(iter: I) -> Self {
        let mut set = Self::default();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// Determines which capabilities a module instance implements.
///
/// Pure and stateless: probing the same instance twice yields the same set.
/// The registry calls this exactly once per module at registration.
pub fn probe(module: &dyn Module) -> CapabilitySet {
    let mut set = CapabilitySet::default();
    if module.as_pre_blocker().is_some() {
        set.insert(CapabilityKind::PreBlock);
    }
    if module.as_begin_blocker().is_some() {
        set.insert(CapabilityKind::BeginBlock);
    }
    if module.as_end_blocker().is_some() {
        set.insert(CapabilityKind::EndBlock);
    }
    if module.as_tx_validator().is_some() {
        set.insert(CapabilityKind::TxValidate);
    }
    if module.as_genesis().is_some() {
        set.insert(CapabilityKind::Genesis);
    }
    if module.as_migrations().is_some() {
        set.insert(CapabilityKind::Migrations);
    }
    if module.as_services().is_some() {
        set.insert(CapabilityKind::Services);
    }
    if module.as_consensus_version().is_some() {
        set.insert(CapabilityKind::ConsensusVersion);
    }
    if module.as_validator_updater().is_some() {
        set.insert(CapabilityKind::ValidatorUpdate);
    }
    set
}

#[cfg(test)]
mod tests {
    use blockloom_module_api::{BeginBlocker, ExecContext, HasConsensusVersion, Module};

    use super::{CapabilityKind, CapabilitySet, probe};

    struct Bare;

    impl Module for Bare {}

    struct Versioned;

    impl BeginBlocker for Versioned {
        fn begin_block(&self, _ctx: &ExecContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl HasConsensusVersion for Versioned {
        fn consensus_version(&self) -> u64 {
            3
        }
    }

    impl Module for Versioned {
        fn as_begin_blocker(&self) -> Option<&dyn BeginBlocker> {
            Some(self)
        }

        fn as_consensus_version(&self) -> Option<&dyn HasConsensusVersion> {
            Some(self)
        }
    }

    #[test]
    fn bare_module_probes_empty() {
        let set = probe(&Bare);
        assert!(set.is_empty());
        for kind in CapabilityKind::ALL {
            assert!(!set.contains(kind));
        }
    }

    #[test]
    fn probe_reports_exactly_the_exposed_capabilities() {
        let set = probe(&Versioned);
        assert!(set.contains(CapabilityKind::BeginBlock));
        assert!(set.contains(CapabilityKind::ConsensusVersion));
        assert!(!set.contains(CapabilityKind::EndBlock));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![CapabilityKind::BeginBlock, CapabilityKind::ConsensusVersion],
        );
    }

    #[test]
    fn set_collects_from_iterator() {
        let set: CapabilitySet = [CapabilityKind::Genesis, CapabilityKind::Services]
            .into_iter()
            .collect();
        assert!(set.contains(CapabilityKind::Genesis));
        assert!(set.contains(CapabilityKind::Services));
        assert!(!set.contains(CapabilityKind::PreBlock));
    }
}
