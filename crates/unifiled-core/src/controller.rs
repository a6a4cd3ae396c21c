// ── Controller abstraction ──
//
// `ControllerApi` is the seam between the entity adapters and the vendor
// API. `Controller` implements it over `unifiled_api::LedClient`, adding
// login, record validation, and one transparent re-login when the
// controller expires the bearer token.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use unifiled_api::transport::{TlsMode, TransportConfig};
use unifiled_api::{LedClient, LedDevice};

use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceRecord};

// ── ControllerApi ────────────────────────────────────────────────

/// Operations the adapters need from a controller.
///
/// Shared between adapters as `Arc<C>`; every method takes `&self`.
pub trait ControllerApi: Send + Sync + 'static {
    /// Whether the controller session is authenticated. Local check only.
    fn is_authenticated(&self) -> bool;

    /// Every valid device record the controller reports.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<DeviceRecord>, CoreError>> + Send;

    /// Switch a device's output.
    fn set_device_output(
        &self,
        id: &DeviceId,
        on: bool,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Set a device's brightness on the controller's 0-100 scale.
    fn set_device_brightness(
        &self,
        id: &DeviceId,
        brightness: u8,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// One device record, or `None` if the controller no longer reports it.
    fn device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, CoreError>> + Send {
        async move {
            let devices = self.list_devices().await?;
            Ok(devices.into_iter().find(|d| &d.id == id))
        }
    }

    /// Whether the light's output is on.
    fn light_state(&self, id: &DeviceId) -> impl Future<Output = Result<bool, CoreError>> + Send {
        async move { Ok(require(self.device(id).await?, id)?.status.output) }
    }

    /// The light's brightness on the controller's 0-100 scale.
    fn light_brightness(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<u8, CoreError>> + Send {
        async move { Ok(require(self.device(id).await?, id)?.status.led) }
    }

    /// Whether the controller sees the light online.
    fn light_available(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send {
        async move { Ok(require(self.device(id).await?, id)?.online) }
    }
}

fn require(record: Option<DeviceRecord>, id: &DeviceId) -> Result<DeviceRecord, CoreError> {
    record.ok_or_else(|| CoreError::DeviceNotFound {
        identifier: id.to_string(),
    })
}

// ── Controller ───────────────────────────────────────────────────

/// A live connection to one UniFi LED controller.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: LedClient,
}

impl Controller {
    /// Create a controller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to authenticate.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = LedClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a controller around an existing client.
    pub fn with_client(config: ControllerConfig, client: LedClient) -> Self {
        Self {
            inner: Arc::new(ControllerInner { config, client }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in and confirm the session is authenticated.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.login().await?;

        if !self.inner.client.is_authenticated() {
            return Err(CoreError::AuthenticationFailed {
                message: "controller accepted the login but issued no session".into(),
            });
        }

        info!(url = %self.inner.config.url, "connected to controller");
        Ok(())
    }

    /// Drop the session token.
    pub fn disconnect(&self) {
        self.inner.client.logout();
        debug!("disconnected");
    }

    async fn login(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        self.inner
            .client
            .login(&config.username, &config.password)
            .await?;
        Ok(())
    }

    /// Run a client call, logging in again once if the token has expired.
    async fn call<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn(Arc<ControllerInner>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, unifiled_api::Error>> + Send,
        T: Send,
    {
        match op(Arc::clone(&self.inner)).await {
            Err(e) if e.is_auth_expired() => {
                warn!(error = %e, "controller rejected session; logging in again");
                self.login().await?;
                Ok(op(Arc::clone(&self.inner)).await?)
            }
            other => Ok(other?),
        }
    }
}

impl ControllerApi for Controller {
    fn is_authenticated(&self) -> bool {
        self.inner.client.is_authenticated()
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        let raw = self
            .call(|inner| async move { inner.client.list_devices().await })
            .await?;
        Ok(validate(raw))
    }

    async fn set_device_output(&self, id: &DeviceId, on: bool) -> Result<(), CoreError> {
        self.call(|inner| {
            let id = id.clone();
            async move { inner.client.set_device_output(id.as_str(), on).await }
        })
        .await
    }

    async fn set_device_brightness(&self, id: &DeviceId, brightness: u8) -> Result<(), CoreError> {
        self.call(|inner| {
            let id = id.clone();
            async move {
                inner
                    .client
                    .set_device_brightness(id.as_str(), brightness)
                    .await
            }
        })
        .await
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Convert raw devices, skipping (and logging) any that fail validation.
fn validate(raw: Vec<LedDevice>) -> Vec<DeviceRecord> {
    raw.into_iter()
        .filter_map(|device| match DeviceRecord::try_from(device) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed device record");
                None
            }
        })
        .collect()
}

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
