//! CLI configuration -- thin wrapper around `unifiled_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--controller, --host, --username, ...).

use unifiled_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use unifiled_config::{Config, Defaults, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load config, build the active profile with flag overrides applied,
/// and translate it into a `ControllerConfig`.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config()?;
    resolve(global, &cfg)
}

fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ControllerConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let controller_url = global
        .controller
        .as_deref()
        .map(|raw| {
            url::Url::parse(raw).map_err(|e| CliError::Validation {
                field: "controller".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })
        })
        .transpose()?;

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if controller_url.is_some() || global.host.is_some() => Profile::new(""),
        None if global.profile.is_some() => {
            let available: Vec<_> = cfg.profiles.keys().cloned().collect();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global, controller_url.as_ref())?;

    let mut controller =
        unifiled_config::profile_to_controller_config(&profile, &profile_name, &cfg.defaults)?;

    // Keep the scheme and path of an explicit URL.
    if let Some(url) = controller_url {
        controller.url = url;
    }

    Ok(controller)
}

fn apply_overrides(
    profile: &mut Profile,
    global: &GlobalOpts,
    controller_url: Option<&url::Url>,
) -> Result<(), CliError> {
    if let Some(url) = controller_url {
        profile.host = url
            .host_str()
            .ok_or_else(|| CliError::Validation {
                field: "controller".into(),
                reason: format!("URL '{url}' has no host"),
            })?
            .to_owned();
        if let Some(port) = url.port_or_known_default() {
            profile.port = port;
        }
    } else {
        if let Some(ref host) = global.host {
            profile.host.clone_from(host);
        }
        if let Some(port) = global.port {
            profile.port = port;
        }
    }

    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use unifiled_core::TlsVerification;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["unifiled"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["lights", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_home() -> Config {
        let mut profile = Profile::new("192.168.1.20");
        profile.username = Some("admin".into());
        profile.password = Some("pw".into());
        let mut cfg = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        cfg.profiles.insert("home".into(), profile);
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_home();
        let g = global(&["--host", "10.0.0.9", "--port", "9443", "-u", "ops", "--timeout", "3"]);
        let cc = resolve(&g, &cfg).unwrap();
        assert_eq!(cc.url.as_str(), "https://10.0.0.9:9443/");
        assert_eq!(cc.username, "ops");
        assert_eq!(cc.timeout, Duration::from_secs(3));
    }

    #[test]
    fn controller_url_keeps_scheme() {
        let cfg = config_with_home();
        let g = global(&["--controller", "http://127.0.0.1:8080"]);
        let cc = resolve(&g, &cfg).unwrap();
        assert_eq!(cc.url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(cc.username, "admin");
    }

    #[test]
    fn insecure_flag_wins_over_ca_cert() {
        let mut cfg = config_with_home();
        if let Some(p) = cfg.profiles.get_mut("home") {
            p.ca_cert = Some("/ca.pem".into());
        }
        let cc = resolve(&global(&["-k"]), &cfg).unwrap();
        assert_eq!(cc.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn no_profile_and_no_flags_is_no_config() {
        let err = resolve(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_named_profile_is_reported() {
        let err = resolve(&global(&["--profile", "cabin"]), &config_with_home()).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "home"));
    }
}
