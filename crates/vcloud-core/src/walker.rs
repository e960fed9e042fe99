// ── Resource walker ──
//
// vApp query → VMs of each vApp → metadata of each VM. Strictly sequential:
// each request is awaited before the next one is issued. Any failure aborts
// the whole walk.

use tracing::{debug, info, warn};
use vcloud_api::VcdClient;

use crate::error::CoreError;
use crate::model::{Group, Host, parse_tags};
use crate::options::{InventoryOptions, MissingAddress};

/// Everything one walk discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    pub groups: Vec<Group>,
    pub hosts: Vec<Host>,
}

pub struct Walker<'a> {
    client: &'a VcdClient,
    options: &'a InventoryOptions,
}

impl<'a> Walker<'a> {
    /// `client` must already be authenticated.
    pub fn new(client: &'a VcdClient, options: &'a InventoryOptions) -> Self {
        Self { client, options }
    }

    pub async fn walk(&self) -> Result<Walk, CoreError> {
        let mut walk = Walk::default();

        for vapp in self.client.list_vapps().await? {
            let vms = self.client.list_vms(&vapp.href).await?;
            debug!(vapp = %vapp.name, vms = vms.len(), "walking vApp");

            for vm in vms {
                let Some(ip_address) = vm.ip_address else {
                    match self.options.missing_address {
                        MissingAddress::Skip => {
                            warn!(vm = %vm.name, vapp = %vapp.name, "no IP address, skipped");
                            continue;
                        }
                        MissingAddress::StopGroup => {
                            warn!(
                                vm = %vm.name,
                                vapp = %vapp.name,
                                "no IP address, dropping the rest of the vApp"
                            );
                            break;
                        }
                    }
                };

                let tags = if self.options.fetch_metadata {
                    self.tags_for(&vm.href).await?
                } else {
                    Vec::new()
                };

                walk.hosts.push(Host {
                    name: vm.name,
                    href: vm.href,
                    ip_address,
                    group_name: vapp.name.clone(),
                    tags,
                });
            }

            walk.groups.push(Group {
                name: vapp.name,
                href: vapp.href,
            });
        }

        info!(
            vapps = walk.groups.len(),
            hosts = walk.hosts.len(),
            "inventory walk complete"
        );
        Ok(walk)
    }

    /// Tags from the first metadata entry keyed by the configured key.
    async fn tags_for(&self, vm_href: &str) -> Result<Vec<String>, CoreError> {
        let entries = self.client.get_metadata(vm_href).await?;
        Ok(entries
            .iter()
            .find(|e| e.key == self.options.metadata_key)
            .map(|e| parse_tags(&e.values))
            .unwrap_or_default())
    }
}
