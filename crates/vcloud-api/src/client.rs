// vCloud REST/XML HTTP client
//
// Wraps `reqwest::Client` with vCloud URL construction, session-token
// injection, and status-to-error mapping. Endpoint groups (queries, networks,
// tasks) are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use std::sync::OnceLock;

use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AUTH_HEADER, Session};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest slice of an error body carried into `Error::Http`.
const BODY_PREVIEW_LEN: usize = 200;

/// HTTP client for a single vCloud Director cell.
///
/// Unauthenticated on construction. After [`authenticate`](Self::authenticate)
/// succeeds the session token is stored exactly once and attached to every
/// request issued through this client.
pub struct VcdClient {
    http: reqwest::Client,
    base_url: Url,
    session: OnceLock<Session>,
}

impl VcdClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the cell root, e.g. `https://vcd.example.com`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the versioned `Accept` default header;
    /// [`TransportConfig::build_client`] sets it.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            session: OnceLock::new(),
        }
    }

    /// The cell base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The active session, if [`authenticate`](Self::authenticate) has run.
    pub fn session(&self) -> Option<&Session> {
        self.session.get()
    }

    // ── Session token management ──────────────────────────────────────

    /// Store the session. A second call is rejected: the token is
    /// write-once for the lifetime of the client.
    pub(crate) fn set_session(&self, session: Session) -> Result<(), Error> {
        debug!("storing session token");
        self.session
            .set(session)
            .map_err(|_| Error::AlreadyAuthenticated)
    }

    /// Apply the stored session token to a request builder.
    fn apply_session(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.get() {
            Some(session) => builder.header(AUTH_HEADER, session.token().expose_secret()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{}", path.trim_start_matches('/'));
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and return the XML body.
    pub async fn get_xml(&self, url: &Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self
            .apply_session(self.http.get(url.clone()))
            .send()
            .await
            .map_err(Error::Transport)?;

        read_body(resp).await
    }

    /// Send a PUT request with an XML body of the given media type and
    /// return the XML response (usually a `Task`).
    pub async fn put_xml(
        &self,
        url: &Url,
        media_type: &str,
        body: String,
    ) -> Result<String, Error> {
        debug!("PUT {} ({media_type})", url);
        trace!(body = %body, "request body");

        let resp = self
            .apply_session(self.http.put(url.clone()))
            .header(CONTENT_TYPE, media_type)
            .body(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        read_body(resp).await
    }
}

/// Map the status to an error or return the body text.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: format!("session rejected by {url}"),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let preview: String = body.chars().take(BODY_PREVIEW_LEN).collect();
        return Err(Error::Http {
            status: status.as_u16(),
            url,
            body: preview,
        });
    }

    resp.text().await.map_err(Error::Transport)
}
