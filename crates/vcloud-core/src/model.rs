// ── Inventory domain types ──
//
// What the walker produces: vApps as groups and VMs as hosts. Hosts are
// only ever built for VMs that reported an address.

use crate::options::HostNaming;

/// A vApp, which becomes an inventory group of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub href: String,
}

/// An addressable VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub href: String,
    pub ip_address: String,
    /// Name of the vApp the VM belongs to.
    pub group_name: String,
    pub tags: Vec<String>,
}

impl Host {
    /// `name.group_name`, unique across the inventory.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.name, self.group_name)
    }

    /// The hostname under which this host is listed.
    pub fn inventory_hostname(&self, naming: HostNaming) -> String {
        match naming {
            HostNaming::Plain => self.name.clone(),
            HostNaming::Qualified => self.qualified_name(),
        }
    }
}

/// Split metadata values into tags.
///
/// Each value is comma-separated text; items are trimmed, blanks dropped,
/// and duplicates removed keeping the first occurrence.
pub fn parse_tags<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for item in values.iter().flat_map(|v| v.as_ref().split(',')) {
        let tag = item.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}
