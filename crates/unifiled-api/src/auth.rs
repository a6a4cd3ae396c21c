// Controller authentication
//
// `POST /v1/login` exchanges a username/password for a bearer token that
// every other endpoint requires. The controller has no logout endpoint;
// dropping the token is all `logout` does.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::LedClient;
use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse};

impl LedClient {
    /// Authenticate with the controller using username/password.
    ///
    /// On success the bearer token is stored and attached to all
    /// subsequent requests. Any previous token is discarded first, so a
    /// failed re-login leaves the client unauthenticated.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.clear_token();

        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", crate::client::preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("login response carried no access token: {e}"),
            })?;

        if login.access_token.is_empty() {
            return Err(Error::Authentication {
                message: "controller returned an empty access token".into(),
            });
        }

        self.set_token(SecretString::from(login.access_token));
        debug!("login successful");
        Ok(())
    }

    /// Whether a bearer token is currently held.
    ///
    /// This is a local check; it does not contact the controller.
    pub fn is_authenticated(&self) -> bool {
        self.has_token()
    }

    /// Forget the bearer token.
    pub fn logout(&self) {
        debug!("discarding bearer token");
        self.clear_token();
    }
}
