// ── Inventory snapshot ──
//
// The Ansible dynamic-inventory document. Serializes to
//
//   { "<group>": {"hosts": [...]},
//     "server":  {"hosts": [...], "children": [...]},
//     "_meta":   {"hostvars": {"<host>": {...}}} }
//
// and is the unit both persisted to the cache and printed for `--list`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{Group, Host};
use crate::options::InventoryOptions;

/// Group holding every host; all other groups are its children.
pub const ALL_HOSTS_GROUP: &str = "server";

/// Top-level key reserved for host variables.
pub const META_KEY: &str = "_meta";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub hostvars: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub groups: BTreeMap<String, GroupEntry>,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

impl Snapshot {
    /// Assemble the inventory from walked vApps and hosts.
    ///
    /// Each host joins its vApp's group, one group per tag, and
    /// [`ALL_HOSTS_GROUP`]. Host variables are layered: `global_vars`,
    /// then `ansible_host`, then the matching `host_vars` entry. When two
    /// hosts share an inventory hostname the first one's variables are kept.
    pub fn build(groups: &[Group], hosts: &[Host], options: &InventoryOptions) -> Self {
        let mut snapshot = Self::default();
        snapshot
            .groups
            .insert(ALL_HOSTS_GROUP.to_owned(), GroupEntry::default());

        for group in groups {
            if group.name == META_KEY {
                warn!(group = %group.name, "vApp name collides with reserved key, skipped");
                continue;
            }
            snapshot.groups.entry(group.name.clone()).or_default();
        }

        for host in hosts {
            let hostname = host.inventory_hostname(options.host_naming);

            snapshot.add_to_group(&host.group_name, &hostname);
            for tag in &host.tags {
                snapshot.add_to_group(tag, &hostname);
            }
            snapshot.add_to_group(ALL_HOSTS_GROUP, &hostname);

            if snapshot.meta.hostvars.contains_key(&hostname) {
                warn!(host = %hostname, vapp = %host.group_name, "duplicate hostname, keeping first");
                continue;
            }
            let mut vars = options.global_vars.clone();
            vars.insert("ansible_host".into(), Value::String(host.ip_address.clone()));
            if let Some(overrides) = options.host_vars.get(&hostname) {
                vars.extend(overrides.clone());
            }
            snapshot.meta.hostvars.insert(hostname, vars);
        }

        let children: Vec<String> = snapshot
            .groups
            .keys()
            .filter(|name| name.as_str() != ALL_HOSTS_GROUP)
            .cloned()
            .collect();
        if let Some(all) = snapshot.groups.get_mut(ALL_HOSTS_GROUP) {
            all.children = children;
        }

        snapshot
    }

    fn add_to_group(&mut self, group: &str, hostname: &str) {
        if group == META_KEY {
            warn!(host = hostname, "tag '{META_KEY}' is reserved, ignored");
            return;
        }
        let entry = self.groups.entry(group.to_owned()).or_default();
        if !entry.hosts.iter().any(|h| h == hostname) {
            entry.hosts.push(hostname.to_owned());
        }
    }

    pub fn group(&self, name: &str) -> Option<&GroupEntry> {
        self.groups.get(name)
    }

    pub fn hostvars(&self, host: &str) -> Option<&Map<String, Value>> {
        self.meta.hostvars.get(host)
    }

    /// The snapshot as a JSON value with every object's keys sorted.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
