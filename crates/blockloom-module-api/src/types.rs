use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Persisted mapping from module name to its last-applied consensus version.
///
/// A `BTreeMap` keeps iteration deterministic wherever the map is rendered
/// or persisted. Absence of an entry means "not yet initialized".
pub type VersionMap = BTreeMap<String, u64>;

/// One validator-set change record emitted during an end-block pass.
///
/// `power` of zero removes the validator; a positive value sets its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: Vec<u8>,
    pub power: i64,
}
