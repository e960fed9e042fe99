// Shared transport configuration for building reqwest::Client instances.
//
// TLS, timeout, and the pinned API-version `Accept` header live here so the
// session client never hand-assembles a builder.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

/// API version negotiated through the `Accept` header unless overridden.
pub const DEFAULT_API_VERSION: &str = "30.0";

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed cells).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub api_version: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            api_version: DEFAULT_API_VERSION.into(),
        }
    }
}

impl TransportConfig {
    /// The `Accept` value pinned to this config's API version.
    pub fn accept_header(&self) -> String {
        accept_for_version(&self.api_version)
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// Every request issued by the client carries the versioned `Accept`
    /// header; the session token is attached per request by the caller.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&self.accept_header())
            .map_err(|_| crate::error::Error::InvalidApiVersion(self.api_version.clone()))?;
        headers.insert(ACCEPT, accept);

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vcloud-ansible/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(|e| {
                    crate::error::Error::Tls(format!("failed to read CA cert: {e}"))
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| crate::error::Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// `application/*+xml;version={version}`
pub fn accept_for_version(version: &str) -> String {
    format!("application/*+xml;version={version}")
}
