// ── Core error types ──
//
// User-facing errors from vcloud-core. Consumers never see raw XML or
// reqwest failures; the `From<vcloud_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to vCloud Director at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} '{identifier}' not found")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Unexpected response from vCloud Director: {message}")]
    InvalidResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Task {operation} failed: {message}")]
    TaskFailed { operation: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Cache errors ─────────────────────────────────────────────────
    #[error("Cache file {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} is not a valid inventory record: {source}")]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for credential or session failures.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vcloud_api::Error> for CoreError {
    fn from(err: vcloud_api::Error) -> Self {
        match err {
            vcloud_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vcloud_api::Error::MissingSessionToken { header } => CoreError::AuthenticationFailed {
                message: format!("no session token in '{header}' response header"),
            },
            vcloud_api::Error::AlreadyAuthenticated => CoreError::AuthenticationFailed {
                message: "client already holds a session".into(),
            },
            vcloud_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vcloud_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vcloud_api::Error::InvalidApiVersion(v) => CoreError::Config {
                message: format!("Invalid API version '{v}'"),
            },
            vcloud_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vcloud_api::Error::Http { status, url, body } => {
                if status == 404 {
                    CoreError::NotFound {
                        entity_type: "Resource".into(),
                        identifier: url,
                    }
                } else {
                    CoreError::Api {
                        message: format!("{url}: {body}"),
                        status: Some(status),
                    }
                }
            }
            vcloud_api::Error::Xml { message } => CoreError::InvalidResponse { message },
            e @ vcloud_api::Error::XmlWrite { .. } => CoreError::Api {
                message: e.to_string(),
                status: None,
            },
            e @ (vcloud_api::Error::MissingElement { .. }
            | vcloud_api::Error::MissingAttribute { .. }) => CoreError::InvalidResponse {
                message: e.to_string(),
            },
            vcloud_api::Error::NotFound { kind, name } => CoreError::NotFound {
                entity_type: kind.into(),
                identifier: name,
            },
            vcloud_api::Error::Task {
                operation,
                status,
                message,
            } => CoreError::TaskFailed {
                operation,
                message: format!("{status}: {message}"),
            },
            vcloud_api::Error::TaskTimeout {
                operation,
                timeout_secs,
            } => CoreError::TaskFailed {
                operation,
                message: format!("no result after {timeout_secs}s"),
            },
        }
    }
}
