//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vcloud_config::ConfigError;
use vcloud_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Credentials ──────────────────────────────────────────────────
    #[error("Missing {var} environment variable!")]
    #[diagnostic(
        code(vcd::missing_credential),
        help("Export VCD_URL, VCD_USER, VCD_PASSWORD and VCD_ORG before running.")
    )]
    MissingCredential { var: &'static str },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vcd::auth_failed),
        help("Check VCD_USER, VCD_PASSWORD and VCD_ORG. The login principal is user@org.")
    )]
    AuthFailed { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to vCloud Director at {url}")]
    #[diagnostic(
        code(vcd::connection_failed),
        help(
            "Check that VCD_URL is reachable from this host.\n\
             For self-signed certificates set `insecure = true` or `ca_cert` in the config file."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(vcd::timeout),
        help("Increase `timeout` in the config file or check the cell's responsiveness.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(vcd::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(vcd::api_error))]
    Api { message: String },

    #[error("Task failed: {message}")]
    #[diagnostic(code(vcd::task_failed))]
    TaskFailed { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vcd::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(vcd::config),
        help("See the [inventory] table and connection keys in config.toml.")
    )]
    Config { message: String },

    // ── Cache ────────────────────────────────────────────────────────
    #[error("Inventory cache error: {message}")]
    #[diagnostic(
        code(vcd::cache),
        help("Remove the cache file or run with --refresh-cache.")
    )]
    Cache { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(vcd::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingVariable { var } => CliError::MissingCredential { var },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "arguments".into(),
                reason: message,
            },

            CoreError::TaskFailed { operation, message } => CliError::TaskFailed {
                message: format!("{operation}: {message}"),
            },

            CoreError::Config { message } => CliError::Config { message },

            e @ (CoreError::CacheIo { .. } | CoreError::CacheFormat { .. }) => CliError::Cache {
                message: e.to_string(),
            },

            e @ (CoreError::Api { .. } | CoreError::InvalidResponse { .. }) => CliError::Api {
                message: e.to_string(),
            },
        }
    }
}
