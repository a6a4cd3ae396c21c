// ── Core error types ──
//
// Domain errors from unifiled-core. Consumers never see HTTP status codes
// or JSON parse failures directly; the `From<unifiled_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Invalid device record {identifier}: {reason}")]
    InvalidDeviceRecord { identifier: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Worker errors ────────────────────────────────────────────────
    #[error("Entity worker for {identifier} has stopped")]
    WorkerStopped { identifier: String },
}

impl CoreError {
    /// Whether this error means the controller could not be reached or
    /// would not accept us -- the conditions a later retry may clear.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Timeout
                | Self::Api { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<unifiled_api::Error> for CoreError {
    fn from(err: unifiled_api::Error) -> Self {
        match err {
            unifiled_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            unifiled_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "not logged in to controller".into(),
            },
            unifiled_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            unifiled_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            unifiled_api::Error::Tls(message) => CoreError::Config {
                message: format!("TLS error: {message}"),
            },
            unifiled_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            unifiled_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected controller response: {message}"),
                status: None,
            },
        }
    }
}

// ── Setup errors ─────────────────────────────────────────────────────

/// Why platform setup did not produce any entities.
///
/// The host re-attempts setup after a [`NotReady`](Self::NotReady) and gives
/// up on an [`Invalid`](Self::Invalid).
#[derive(Debug, Error)]
pub enum SetupError {
    /// The controller is unreachable or rejected the credentials.
    #[error("Controller not ready: {0}")]
    NotReady(#[source] CoreError),

    /// The connection parameters themselves are unusable.
    #[error("Invalid controller configuration: {0}")]
    Invalid(#[source] CoreError),
}

impl SetupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// The underlying core error.
    pub fn core(&self) -> &CoreError {
        match self {
            Self::NotReady(e) | Self::Invalid(e) => e,
        }
    }

    pub fn into_core(self) -> CoreError {
        match self {
            Self::NotReady(e) | Self::Invalid(e) => e,
        }
    }
}

impl From<CoreError> for SetupError {
    fn from(err: CoreError) -> Self {
        if matches!(err, CoreError::Config { .. }) {
            Self::Invalid(err)
        } else {
            Self::NotReady(err)
        }
    }
}
