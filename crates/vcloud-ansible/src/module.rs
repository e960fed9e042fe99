//! Argument handling and result shape for the `vcd-vapp-network` module.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use vcloud_config::{Config, CredentialOverrides};
use vcloud_core::{NetworkManager, NetworkOutcome, NetworkRequest, TlsVerification};

use crate::error::CliError;

fn verify_default() -> bool {
    true
}

/// Everything Ansible writes into the arguments file.
///
/// Unknown keys (other `_ansible_*` internals) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleArgs {
    #[serde(flatten)]
    pub request: NetworkRequest,

    /// Overrides `VCD_URL`.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    /// `30`, `30.0` and `"30.0"` are all accepted.
    #[serde(default, deserialize_with = "version_text")]
    pub api_version: Option<String>,
    #[serde(default = "verify_default")]
    pub verify_ssl_certs: bool,
    /// Seconds to wait for the update task; overrides the config file.
    #[serde(default)]
    pub task_timeout: Option<u64>,

    #[serde(default, rename = "_ansible_check_mode")]
    pub check_mode: bool,
}

/// Playbooks usually write `api_version: 30`, which reaches us as a number.
fn version_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Int(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Version>::deserialize(deserializer)? {
        None => None,
        Some(Version::Int(v)) => Some(format!("{v}.0")),
        Some(Version::Float(v)) => {
            let text = v.to_string();
            Some(if text.contains('.') { text } else { format!("{text}.0") })
        }
        Some(Version::Text(v)) => Some(v),
    })
}

impl ModuleArgs {
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn overrides(&self) -> CredentialOverrides {
        CredentialOverrides {
            url: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            org: self.org.clone(),
        }
    }
}

/// The JSON object printed back to Ansible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub warnings: Vec<String>,
    pub failed: bool,
}

impl From<NetworkOutcome> for ModuleResult {
    fn from(outcome: NetworkOutcome) -> Self {
        Self {
            changed: outcome.changed,
            msg: outcome.msg,
            warnings: outcome.warnings,
            failed: false,
        }
    }
}

impl ModuleResult {
    pub fn failure(err: &CliError) -> Self {
        Self {
            changed: false,
            msg: Some(err.to_string()),
            warnings: Vec::new(),
            failed: true,
        }
    }
}

/// Connect with `config` plus the argument overrides and converge the network.
pub async fn run(args: &ModuleArgs, config: &Config) -> Result<ModuleResult, CliError> {
    let credentials = vcloud_config::load_credentials_with(&args.overrides())?;
    let org = credentials.org.clone();

    let mut connection = config.connection(credentials);
    if let Some(ref version) = args.api_version {
        connection.api_version.clone_from(version);
    }
    if !args.verify_ssl_certs {
        connection.tls = TlsVerification::DangerAcceptInvalid;
    }

    debug!(
        network = %args.request.network,
        vapp = %args.request.vapp,
        check_mode = args.check_mode,
        "applying vApp network"
    );

    let task_timeout = args
        .task_timeout
        .map_or_else(|| config.task_timeout(), Duration::from_secs);

    let client = connection.login().await?;
    let outcome = NetworkManager::new(&client, org)
        .check_mode(args.check_mode)
        .task_timeout(task_timeout)
        .apply(&args.request)
        .await?;
    Ok(outcome.into())
}
