//! Shared configuration for the vCloud Ansible binaries.
//!
//! Credentials come from the `VCD_*` environment (optionally overridden by
//! module arguments); everything else comes from an optional TOML file
//! layered with figment.
//! The result is translated into `vcloud_core::ConnectionConfig` plus the
//! cache location and inventory options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcloud_core::{ConnectionConfig, Credentials, InventoryOptions, TlsVerification, cache};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {var} environment variable!")]
    MissingVariable { var: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    /// Returns `true` when a required credential is absent or blank.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingVariable { .. })
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Optional settings file; every key has a default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Version pinned in the `Accept` header.
    pub api_version: String,

    /// Skip TLS certificate verification.
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    pub timeout: u64,

    /// Ceiling in seconds on waiting for a vCloud task (network updates).
    pub task_timeout: u64,

    /// Override for `~/.vcloud/cache`.
    pub cache_dir: Option<PathBuf>,

    pub inventory: InventoryOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_version: vcloud_core::config::DEFAULT_API_VERSION.into(),
            insecure: false,
            ca_cert: None,
            timeout: 30,
            task_timeout: vcloud_core::network::DEFAULT_TASK_TIMEOUT.as_secs(),
            cache_dir: None,
            inventory: InventoryOptions::default(),
        }
    }
}

impl Config {
    /// Connection settings for `credentials` under this config.
    pub fn connection(&self, credentials: Credentials) -> ConnectionConfig {
        let mut conn = ConnectionConfig::new(credentials);
        conn.tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else {
            TlsVerification::SystemDefaults
        };
        conn.timeout = Duration::from_secs(self.timeout);
        conn.api_version.clone_from(&self.api_version);
        conn
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Cache file for the principal in `credentials`.
    pub fn cache_path(&self, credentials: &Credentials) -> PathBuf {
        cache::path_for(&self.cache_dir(), &credentials.org, &credentials.username)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "vcloud-ansible").map_or_else(
        || home_dir().join(".config").join("vcloud-ansible").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// `~/.vcloud/cache`.
pub fn default_cache_dir() -> PathBuf {
    home_dir().join(".vcloud").join("cache")
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |b| b.home_dir().to_path_buf())
}

// ── Config loading ──────────────────────────────────────────────────

/// Load settings from `path` (or the default location) plus `VCD_*`
/// overrides for the connection keys.
///
/// An explicit path must exist; the default one is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&file))
        .merge(Env::prefixed("VCD_").only(&[
            "api_version",
            "insecure",
            "ca_cert",
            "timeout",
            "task_timeout",
            "cache_dir",
        ]))
        .extract()?;
    Ok(config)
}

// ── Credentials ─────────────────────────────────────────────────────

/// Values that take precedence over the environment (module arguments).
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub org: Option<String>,
}

/// Read `VCD_URL`, `VCD_USER`, `VCD_PASSWORD` and `VCD_ORG`.
pub fn load_credentials() -> Result<Credentials, ConfigError> {
    load_credentials_with(&CredentialOverrides::default())
}

/// Like [`load_credentials`], with `overrides` winning over the environment.
///
/// Values are taken verbatim (no type coercion, so a password such as
/// `007` survives). Fails on the first absent or whitespace-only value;
/// never returns a partial set.
pub fn load_credentials_with(overrides: &CredentialOverrides) -> Result<Credentials, ConfigError> {
    let pick = |over: &Option<String>, var: &'static str| {
        required(over.clone().or_else(|| std::env::var(var).ok()), var)
    };

    let url = pick(&overrides.url, "VCD_URL")?;
    let username = pick(&overrides.user, "VCD_USER")?;
    let password = pick(&overrides.password, "VCD_PASSWORD")?;
    let org = pick(&overrides.org, "VCD_ORG")?;

    let base_url = url::Url::parse(url.trim()).map_err(|e| ConfigError::Validation {
        field: "VCD_URL".into(),
        reason: format!("'{url}' is not a URL: {e}"),
    })?;

    Ok(Credentials {
        base_url,
        username,
        password: SecretString::from(password),
        org,
    })
}

fn required(value: Option<String>, var: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVariable { var })
}
