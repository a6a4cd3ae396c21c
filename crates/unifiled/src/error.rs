//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use unifiled_config::ConfigError;
use unifiled_core::{CoreError, SetupError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(unifiled::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Reason: {reason}\n\
             The controller API listens on port 20443 by default."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(unifiled::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(unifiled::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Run: unifiled config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(unifiled::no_credentials),
        help(
            "Configure credentials with: unifiled config init\n\
             Or set UNIFILED_USERNAME / UNIFILED_PASSWORD."
        )
    )]
    NoCredentials { profile: String, what: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(unifiled::not_found),
        help("Run: unifiled {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(unifiled::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    #[error("{0}")]
    #[diagnostic(code(unifiled::worker_stopped))]
    WorkerStopped(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(unifiled::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(unifiled::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: unifiled config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(unifiled::no_config),
        help(
            "Create a profile with: unifiled config init\n\
             Expected at: {path}\n\
             Or pass --controller <URL> / --host <HOST>."
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(unifiled::config))]
    Config(String),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(unifiled::keyring),
        help("Set UNIFILED_PASSWORD or a profile password_env variable instead.")
    )]
    Keyring(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(unifiled::output))]
    Output(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::DeviceNotFound { identifier } => Self::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "lights list".into(),
            },
            CoreError::InvalidDeviceRecord { identifier, reason } => Self::ApiError {
                message: format!("invalid record for {identifier}: {reason}"),
                status: None,
            },
            CoreError::Api { message, status } => Self::ApiError { message, status },
            CoreError::Config { message } => Self::Config(message),
            err @ CoreError::WorkerStopped { .. } => Self::WorkerStopped(err.to_string()),
        }
    }
}

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        err.into_core().into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(see: unifiled config profiles)".into(),
            },
            ConfigError::NoCredentials { profile, what } => Self::NoCredentials {
                profile,
                what: what.into(),
            },
            ConfigError::Keyring(e) => Self::Keyring(e.to_string()),
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                Self::Config(other.to_string())
            }
        }
    }
}
