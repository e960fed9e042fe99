// ── vApp network management ──
//
// Desired-state logic for one vApp network: resolve org → VDC → vApp, read
// the NetworkConfigSection, and add or remove a `NetworkConfig` when the
// current state differs from the requested one.

use std::net::Ipv4Addr;
use std::time::Duration;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vcloud_api::task::DEFAULT_POLL_INTERVAL;
pub use vcloud_api::task::DEFAULT_TASK_TIMEOUT;
use vcloud_api::{FenceMode, IpScope, NetworkConfig, VcdClient, Vdc};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    Present,
    Absent,
}

/// `enabled` / `disabled` toggle for a network service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    #[default]
    Enabled,
    Disabled,
}

fn default_fence_mode() -> String {
    FenceMode::default().as_str().to_owned()
}

/// Module parameters describing the wanted network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub network: String,
    pub vapp: String,
    pub vdc: String,
    pub state: NetworkState,
    #[serde(default = "default_fence_mode")]
    pub fence_mode: String,
    #[serde(default)]
    pub parent_network: Option<String>,
    /// CIDR, e.g. `192.168.0.0/24`. Host bits are ignored.
    #[serde(default)]
    pub ip_scope: Option<String>,
    #[serde(default)]
    pub ip_range_start: Option<String>,
    /// Defaults to `ip_range_start`.
    #[serde(default)]
    pub ip_range_end: Option<String>,
    #[serde(default)]
    pub dns1: Option<String>,
    #[serde(default)]
    pub dns2: Option<String>,
    #[serde(default)]
    pub dns_suffix: Option<String>,
    #[serde(default)]
    pub nat_state: ServiceState,
    #[serde(default)]
    pub fw_state: ServiceState,
}

/// Result reported back to Ansible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub warnings: Vec<String>,
}

impl NetworkOutcome {
    fn changed(msg: String) -> Self {
        Self {
            changed: true,
            msg: Some(msg),
            warnings: Vec::new(),
        }
    }

    fn unchanged(warning: String) -> Self {
        Self {
            changed: false,
            msg: None,
            warnings: vec![warning],
        }
    }
}

pub struct NetworkManager<'a> {
    client: &'a VcdClient,
    org: String,
    check_mode: bool,
    poll_interval: Duration,
    task_timeout: Duration,
}

impl<'a> NetworkManager<'a> {
    /// `client` must be authenticated against `org`.
    pub fn new(client: &'a VcdClient, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
            check_mode: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }

    /// Report what would change without issuing the update.
    pub fn check_mode(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    /// Upper bound on the wait for the update task.
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn task_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.task_timeout = timeout;
        self
    }

    pub async fn apply(&self, request: &NetworkRequest) -> Result<NetworkOutcome, CoreError> {
        let fence_mode = parse_fence_mode(&request.fence_mode)?;

        let org = self.client.find_org(&self.org).await?;
        let vdc = self.client.find_vdc(&org, &request.vdc).await?;
        let vapp = vdc.vapp(&request.vapp).ok_or_else(|| CoreError::NotFound {
            entity_type: "vApp".into(),
            identifier: request.vapp.clone(),
        })?;
        let section = self.client.get_network_config_section(&vapp.href).await?;
        let exists = section.contains(&request.network);
        debug!(network = %request.network, vapp = %vapp.name, exists, "current state");

        let (body, msg) = match request.state {
            NetworkState::Present if exists => {
                return Ok(NetworkOutcome::unchanged(format!(
                    "Vapp Network {} is already present.",
                    request.network
                )));
            }
            NetworkState::Absent if !exists => {
                return Ok(NetworkOutcome::unchanged(format!(
                    "Vapp Network {} is not present.",
                    request.network
                )));
            }
            NetworkState::Present => {
                let config = build_network_config(request, fence_mode, &vdc)?;
                (
                    section.with_network(&config.to_xml()?)?,
                    format!("Vapp Network {} has been added", request.network),
                )
            }
            NetworkState::Absent => (
                section.without_network(&request.network)?,
                format!("Vapp Network {} has been deleted.", request.network),
            ),
        };

        if self.check_mode {
            info!(network = %request.network, "check mode, update skipped");
            return Ok(NetworkOutcome::changed(msg));
        }

        let task = self
            .client
            .update_network_config_section(&section, body)
            .await?;
        self.client
            .wait_for_task(task, self.poll_interval, self.task_timeout)
            .await?;
        info!(network = %request.network, vapp = %vapp.name, "{msg}");
        Ok(NetworkOutcome::changed(msg))
    }
}

fn parse_fence_mode(raw: &str) -> Result<FenceMode, CoreError> {
    FenceMode::parse(raw).ok_or_else(|| CoreError::ValidationFailed {
        message: format!("fence_mode must be one of bridged, isolated, natRouted (got '{raw}')"),
    })
}

/// Gateway (first address of the network) and netmask for a CIDR.
pub fn gateway_and_netmask(cidr: &str) -> Result<(Ipv4Addr, Ipv4Addr), CoreError> {
    let net: Ipv4Net = cidr.trim().parse().map_err(|_| CoreError::ValidationFailed {
        message: format!("ip_scope '{cidr}' is not an IPv4 CIDR"),
    })?;
    let gateway = u32::from(net.network())
        .checked_add(1)
        .map(Ipv4Addr::from)
        .filter(|gw| net.contains(gw))
        .ok_or_else(|| CoreError::ValidationFailed {
            message: format!("ip_scope '{cidr}' has no room for a gateway"),
        })?;
    Ok((gateway, net.netmask()))
}

fn build_network_config(
    request: &NetworkRequest,
    fence_mode: FenceMode,
    vdc: &Vdc,
) -> Result<NetworkConfig, CoreError> {
    let ip_range = request.ip_range_start.as_ref().map(|start| {
        let end = request.ip_range_end.as_ref().unwrap_or(start);
        (start.clone(), end.clone())
    });

    let (parent_network_href, dns_suffix) = match &request.parent_network {
        Some(parent) => {
            let network = vdc
                .network(parent)
                .ok_or_else(|| CoreError::ValidationFailed {
                    message: format!("Parent network '{parent}' does not exist"),
                })?;
            (Some(network.href.clone()), None)
        }
        None if request.ip_scope.is_some() => (None, request.dns_suffix.clone()),
        None => {
            return Err(CoreError::ValidationFailed {
                message: "Either parent_network or ip_scope must be set".into(),
            });
        }
    };

    let ip_scope = request
        .ip_scope
        .as_deref()
        .map(|cidr| {
            gateway_and_netmask(cidr).map(|(gateway, netmask)| IpScope {
                gateway,
                netmask,
                dns1: request.dns1.clone(),
                dns2: request.dns2.clone(),
                dns_suffix,
                ip_range,
            })
        })
        .transpose()?;

    Ok(NetworkConfig {
        name: request.network.clone(),
        fence_mode,
        ip_scope,
        parent_network_href,
        firewall_enabled: request.fw_state == ServiceState::Enabled,
        nat_enabled: request.nat_state == ServiceState::Enabled,
    })
}
