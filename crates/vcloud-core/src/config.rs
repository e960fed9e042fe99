// ── Runtime connection configuration ──
//
// These types describe *how* to reach a vCloud Director cell. They carry
// credential data and connection tuning, but never touch disk or the
// environment. vcloud-config builds a `ConnectionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::info;
use url::Url;
pub use vcloud_api::transport::DEFAULT_API_VERSION;
use vcloud_api::{TlsMode, TransportConfig, VcdClient};

use crate::error::CoreError;

/// The four values needed to open a session. All are non-empty once built.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Cell root, e.g. `https://vcd.example.com`.
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
    pub org: String,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed cells).
    DangerAcceptInvalid,
}

/// Everything needed to connect and authenticate.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub credentials: Credentials,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Version pinned in the `Accept` header.
    pub api_version: String,
}

impl ConnectionConfig {
    /// Defaults for everything except the credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            api_version: DEFAULT_API_VERSION.into(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            api_version: self.api_version.clone(),
        }
    }

    /// Build a client and authenticate it. The returned client carries the
    /// session token on every request.
    pub async fn login(&self) -> Result<VcdClient, CoreError> {
        let creds = &self.credentials;
        let client = VcdClient::new(creds.base_url.clone(), &self.transport())?;
        client
            .authenticate(&creds.username, &creds.org, &creds.password)
            .await?;
        info!(url = %creds.base_url, org = %creds.org, "session established");
        Ok(client)
    }
}
