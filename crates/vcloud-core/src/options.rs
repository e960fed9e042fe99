// ── Inventory build options ──
//
// Static overrides and naming policy for the walker and snapshot builder.
// Loaded from the `[inventory]` table of the config file; every field has
// a default so an empty table (or no file) is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key whose values are read as group tags.
pub const DEFAULT_METADATA_KEY: &str = "ansible_groups";

/// What to do with a VM that reports no IP address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingAddress {
    /// Leave the VM out and keep walking the vApp.
    #[default]
    Skip,
    /// Leave the VM out and drop every later VM of the same vApp.
    StopGroup,
}

/// How inventory hostnames are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostNaming {
    /// The VM name as-is (`web1`).
    #[default]
    Plain,
    /// VM name dot-joined with its vApp (`web1.vapp1`).
    Qualified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryOptions {
    pub missing_address: MissingAddress,
    pub metadata_key: String,
    pub host_naming: HostNaming,
    /// Fetch per-VM metadata for group tags.
    pub fetch_metadata: bool,
    /// Variables set on every host before its own values.
    pub global_vars: Map<String, Value>,
    /// Per-host variables keyed by inventory hostname; applied last.
    pub host_vars: BTreeMap<String, Map<String, Value>>,
}

impl Default for InventoryOptions {
    fn default() -> Self {
        Self {
            missing_address: MissingAddress::default(),
            metadata_key: DEFAULT_METADATA_KEY.into(),
            host_naming: HostNaming::default(),
            fetch_metadata: true,
            global_vars: Map::new(),
            host_vars: BTreeMap::new(),
        }
    }
}
