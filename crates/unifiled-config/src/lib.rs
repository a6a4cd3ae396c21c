//! Configuration for the unifiled CLI.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `unifiled_core::ControllerConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use unifiled_core::config::{DEFAULT_PORT, DEFAULT_SCAN_INTERVAL};
use unifiled_core::{ControllerConfig, TlsVerification};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "unifiled";

/// Environment variable consulted for the password of any profile.
pub const PASSWORD_ENV: &str = "UNIFILED_PASSWORD";

/// Environment variable consulted for the username of any profile.
pub const USERNAME_ENV: &str = "UNIFILED_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|p| (name.to_owned(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Accept the controller's self-signed certificate.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval for `watch`, seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: default_insecure(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    10
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// A named controller profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Controller hostname or IP address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Path to a CA certificate that signed the controller's certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override `defaults.insecure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override `defaults.timeout`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override `defaults.scan_interval`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<u64>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            scan_interval: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "unifiled", "unifiled").map_or_else(
        || PathBuf::from(".unifiled").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under `UNIFILED_*`
/// environment variables (`__` separates nested keys, e.g.
/// `UNIFILED_DEFAULTS__TIMEOUT=5`). A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIFILED_").split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Username from the profile, else `UNIFILED_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
            what: "username",
        })
}

/// Password from, in order: the profile's `password_env` variable,
/// `UNIFILED_PASSWORD`, the system keyring, the plaintext field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, |name| {
        keyring_entry(name).and_then(|e| e.get_password()).ok()
    })
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    keyring_lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    if let Some(pw) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(pw));
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = keyring_lookup(profile_name) {
        return Ok(SecretString::from(pw));
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: "password",
    })
}

// ── Translation to core config ──────────────────────────────────────

/// TLS mode for a profile: an explicit `insecure` wins, then a custom CA,
/// then the global default.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) if defaults.insecure => TlsVerification::DangerAcceptInvalid,
        (None, None) => TlsVerification::SystemDefaults,
    }
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;

    let mut config = ControllerConfig::new(&profile.host, profile.port, username, password)
        .map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: e.to_string(),
        })?;

    config.tls = tls_for(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.scan_interval =
        Duration::from_secs(profile.scan_interval.unwrap_or(defaults.scan_interval));

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 15

[profiles.home]
host = "192.168.1.20"
username = "admin"
password = "plain"

[profiles.shop]
host = "led.shop.lan"
port = 8443
username = "ops"
ca_cert = "/etc/unifiled/ca.pem"
scan_interval = 60
"#;

    #[test]
    fn loads_profiles_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.default_profile.as_deref(), Some("home"));
            assert_eq!(cfg.defaults.timeout, 15);
            assert_eq!(cfg.defaults.output, "table");
            assert!(cfg.defaults.insecure);
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profiles["home"].port, DEFAULT_PORT);
            assert_eq!(cfg.profiles["shop"].port, 8443);
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("UNIFILED_DEFAULT_PROFILE", "shop");
            jail.set_env("UNIFILED_DEFAULTS__TIMEOUT", "3");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("shop"));
            assert_eq!(cfg.defaults.timeout, 3);
            Ok(())
        });
    }

    #[test]
    fn profile_lookup_falls_back_to_default() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            let (name, profile) = cfg.profile(None).unwrap();
            assert_eq!(name, "home");
            assert_eq!(profile.host, "192.168.1.20");

            let (name, _) = cfg.profile(Some("shop")).unwrap();
            assert_eq!(name, "shop");

            assert!(matches!(
                cfg.profile(Some("cabin")),
                Err(ConfigError::UnknownProfile { .. })
            ));
            Ok(())
        });
    }

    #[test]
    fn password_resolution_order() {
        Jail::expect_with(|jail| {
            let mut profile = Profile::new("host");
            profile.password = Some("plain".into());
            profile.password_env = Some("SHOP_LED_PW".into());

            let pw = resolve_password_with(&profile, "p", |_| None).unwrap();
            assert_eq!(pw.expose_secret(), "plain");

            let pw = resolve_password_with(&profile, "p", |_| Some("from-keyring".into())).unwrap();
            assert_eq!(pw.expose_secret(), "from-keyring");

            jail.set_env(PASSWORD_ENV, "from-global-env");
            let pw = resolve_password_with(&profile, "p", |_| Some("from-keyring".into())).unwrap();
            assert_eq!(pw.expose_secret(), "from-global-env");

            jail.set_env("SHOP_LED_PW", "from-profile-env");
            let pw = resolve_password_with(&profile, "p", |_| Some("from-keyring".into())).unwrap();
            assert_eq!(pw.expose_secret(), "from-profile-env");
            Ok(())
        });
    }

    #[test]
    fn missing_password_is_reported() {
        Jail::expect_with(|_| {
            let profile = Profile::new("host");
            let err = resolve_password_with(&profile, "home", |_| None).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::NoCredentials { what: "password", .. }
            ));
            Ok(())
        });
    }

    #[test]
    fn tls_mode_selection() {
        let defaults = Defaults::default();
        let mut profile = Profile::new("host");
        assert_eq!(tls_for(&profile, &defaults), TlsVerification::DangerAcceptInvalid);

        profile.ca_cert = Some(PathBuf::from("/ca.pem"));
        assert_eq!(
            tls_for(&profile, &defaults),
            TlsVerification::CustomCa(PathBuf::from("/ca.pem"))
        );

        profile.insecure = Some(true);
        assert_eq!(tls_for(&profile, &defaults), TlsVerification::DangerAcceptInvalid);

        profile.ca_cert = None;
        profile.insecure = Some(false);
        assert_eq!(tls_for(&profile, &defaults), TlsVerification::SystemDefaults);

        let strict = Defaults {
            insecure: false,
            ..Defaults::default()
        };
        assert_eq!(tls_for(&Profile::new("host"), &strict), TlsVerification::SystemDefaults);
    }

    #[test]
    fn builds_controller_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env(PASSWORD_ENV, "secret");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let (name, profile) = cfg.profile(Some("shop")).unwrap();

            let cc = profile_to_controller_config(profile, &name, &cfg.defaults).unwrap();
            assert_eq!(cc.url.as_str(), "https://led.shop.lan:8443/");
            assert_eq!(cc.username, "ops");
            assert_eq!(cc.password.expose_secret(), "secret");
            assert_eq!(cc.timeout, Duration::from_secs(15));
            assert_eq!(cc.scan_interval, Duration::from_secs(60));
            assert_eq!(cc.tls, TlsVerification::CustomCa(PathBuf::from("/etc/unifiled/ca.pem")));
            Ok(())
        });
    }

    #[test]
    fn empty_host_is_rejected() {
        let profile = Profile::new("  ");
        let err = profile_to_controller_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("10.0.0.5");
        profile.username = Some("admin".into());
        cfg.profiles.insert("default".into(), profile.clone());
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("10.0.0.5"));
        assert!(!text.contains("password"));

        let loaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(loaded.profiles["default"], profile);
    }
}
