// ── Runtime connection configuration ──
//
// These types describe *how* to reach a UniFi LED controller. They carry
// credential data and connection tuning, but never touch disk. The CLI
// (via unifiled-config) constructs a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Port the UniFi LED controller serves its API on.
pub const DEFAULT_PORT: u16 = 20443;

/// Default interval between entity polls.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Controllers ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller root URL (e.g. `https://192.168.1.20:20443`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often each entity polls the controller.
    pub scan_interval: Duration,
}

impl ControllerConfig {
    /// Build a config from the host/port/credentials a setup flow collects.
    ///
    /// The controller only speaks HTTPS.
    pub fn new(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, CoreError> {
        let url = Url::parse(&format!("https://{host}:{port}")).map_err(|e| CoreError::Config {
            message: format!("invalid controller address {host}:{port}: {e}"),
        })?;

        Ok(Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        })
    }
}
