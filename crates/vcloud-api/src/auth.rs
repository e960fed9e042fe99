// Session authentication
//
// `POST /api/sessions` with HTTP basic auth (`user@org` / password). The
// cell answers with an opaque token in `x-vcloud-authorization`, which is
// stored on the client and replayed on every subsequent request.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::VcdClient;
use crate::error::Error;

/// Response/request header carrying the session token.
pub const AUTH_HEADER: &str = "x-vcloud-authorization";

/// An authenticated vCloud session.
///
/// The token is opaque; its expiry is the server's concern.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Basic-auth principal for an org-scoped login: `username@org`.
pub fn principal(username: &str, org: &str) -> String {
    format!("{username}@{org}")
}

impl VcdClient {
    /// Authenticate against `/api/sessions`.
    ///
    /// On success the token is stored on the client (write-once) and a copy
    /// of the [`Session`] is returned. Non-2xx responses and a missing token
    /// header are errors; nothing is retried.
    pub async fn authenticate(
        &self,
        username: &str,
        org: &str,
        password: &SecretString,
    ) -> Result<Session, Error> {
        let url = self.api_url("sessions")?;
        debug!(user = username, org, "authenticating at {}", url);

        let resp = self
            .http()
            .post(url)
            .basic_auth(principal(username, org), Some(password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", body.trim()),
            });
        }

        let token = resp
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingSessionToken {
                header: AUTH_HEADER,
            })?;

        let session = Session::new(SecretString::from(token.to_owned()));
        self.set_session(session.clone())?;

        debug!("authentication successful");
        Ok(session)
    }
}
