//! CLI configuration -- thin wrapper around `neviweb_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--username, --password, --timeout).

use std::io::IsTerminal;

use secrecy::SecretString;

use neviweb_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use neviweb_config::{
    Config, Defaults, Profile, config_path, default_energy_file, load_config_or_default,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI
/// overrides. Without a stored profile, flags and env vars alone must
/// supply the credentials.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let empty = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available.join(", "),
            });
        }
        None => &empty,
    };

    resolve_profile(profile, &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // 1. Username (flag > env > profile)
    let username = match global.username {
        Some(ref u) => u.clone(),
        None => neviweb_config::resolve_username(profile, profile_name)?,
    };

    // 2. Password (flag > profile chain > interactive prompt)
    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => match neviweb_config::resolve_password(profile, profile_name) {
            Ok(pw) => pw,
            Err(neviweb_config::ConfigError::NoCredentials { .. })
                if std::io::stdin().is_terminal() =>
            {
                prompt_password(&username)?
            }
            Err(e) => return Err(e.into()),
        },
    };

    let mut cfg = neviweb_config::build_controller_config(profile, defaults, username, password)?;

    // 3. Timeout
    if let Some(secs) = global.timeout {
        cfg.transport.timeout = std::time::Duration::from_secs(secs);
    }

    Ok(cfg)
}

fn prompt_password(username: &str) -> Result<SecretString, CliError> {
    let pw = rpassword::prompt_password(format!("Neviweb password for {username}: "))?;
    Ok(SecretString::from(pw))
}
