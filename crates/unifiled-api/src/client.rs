// Controller HTTP client
//
// Wraps `reqwest::Client` with controller URL construction, bearer-token
// injection, and status/body mapping. Endpoint groups (auth, devices) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for a single UniFi LED controller.
///
/// Cheap to share behind an `Arc`: every method takes `&self`, and the
/// bearer token obtained by [`login`](Self::login) lives behind a lock.
pub struct LedClient {
    http: reqwest::Client,
    base_url: Url,
    /// Bearer token from `POST /v1/login`. `None` until login succeeds.
    token: RwLock<Option<SecretString>>,
}

impl LedClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `https://192.168.1.20:20443`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_token(&self, token: SecretString) {
        debug!("storing bearer token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub(crate) fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Attach the bearer token, failing if login has not happened yet.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => Ok(builder.bearer_auth(token.expose_secret())),
            None => Err(Error::NotAuthenticated),
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a versioned API URL: `{base}/v1/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("/v1/{path}"))?)
    }

    /// `{base}/v1/devices/{id}`, with `id` percent-encoded as one segment.
    pub(crate) fn device_url(&self, id: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .clear()
            .extend(["v1", "devices", id]);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.authorize(self.http.get(url))?;
        let resp = builder.send().await.map_err(Error::Transport)?;
        let body = Self::checked_body(resp).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// Send an authenticated PUT with a JSON body. The response body is
    /// ignored on success; the controller echoes inconsistent payloads.
    pub(crate) async fn put(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!("PUT {}", url);

        let builder = self.authorize(self.http.put(url).json(body))?;
        let resp = builder.send().await.map_err(Error::Transport)?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    /// Map HTTP failures to errors and return the body text on success.
    pub(crate) async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "bearer token rejected or expired".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        resp.text().await.map_err(Error::Transport)
    }
}

/// First `BODY_PREVIEW_CHARS` characters of a body, on a char boundary.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
