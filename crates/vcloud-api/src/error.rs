use thiserror::Error;

/// Top-level error type for the `vcloud-api` crate.
///
/// Covers every failure mode across the REST/XML surface: authentication,
/// transport, XML decoding, and asynchronous task execution.
/// `vcloud-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by `/api/sessions` (wrong credentials, locked account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session response did not carry the authorization token header.
    #[error("Session response is missing the '{header}' header")]
    MissingSessionToken { header: &'static str },

    /// `authenticate` was called on a client that already holds a session.
    #[error("Client is already authenticated")]
    AlreadyAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured API version cannot be expressed as an `Accept` header.
    #[error("Invalid API version '{0}'")]
    InvalidApiVersion(String),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status from the API.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    // ── XML ─────────────────────────────────────────────────────────
    /// The response body was not well-formed XML.
    #[error("Malformed XML: {message}")]
    Xml { message: String },

    /// A request body could not be serialized.
    #[error("Failed to write <{element}>: {source}")]
    XmlWrite {
        element: String,
        #[source]
        source: std::io::Error,
    },

    /// A required element was absent from an otherwise valid document.
    #[error("Missing <{element}> in {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },

    /// A required attribute was absent from an element.
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    // ── Entities ────────────────────────────────────────────────────
    /// A named entity (org, VDC, vApp, network) could not be resolved.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    // ── Tasks ───────────────────────────────────────────────────────
    /// A task finished in a non-success state.
    #[error("Task {operation} ended with status '{status}': {message}")]
    Task {
        operation: String,
        status: String,
        message: String,
    },

    /// A task did not reach a terminal state within the allotted time.
    #[error("Task {operation} did not finish within {timeout_secs}s")]
    TaskTimeout { operation: String, timeout_secs: u64 },
}

impl Error {
    /// Returns `true` if the server rejected our credentials or session.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Authentication { .. } | Self::MissingSessionToken { .. } => true,
            Self::Http { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Http { status, .. } => *status == 404,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Self::Xml {
            message: err.to_string(),
        }
    }
}

