//! Shared configuration for Neviweb tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `neviweb_core::ControllerConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use neviweb_api::{ClientConfig, NotifyMode, TlsMode, TransportConfig};
use neviweb_core::{ControllerConfig, MAX_SCAN_INTERVAL, MIN_SCAN_INTERVAL};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "neviweb";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll period, seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default)]
    pub notify: NotifyMode,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
            notify: NotifyMode::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_scan_interval() -> u64 {
    neviweb_core::DEFAULT_SCAN_INTERVAL.as_secs()
}

/// A named Neviweb account profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Name of the primary network (location).
    pub network: Option<String>,

    /// Name of the second network.
    pub network2: Option<String>,

    /// Name of the third network.
    pub network3: Option<String>,

    /// Override poll period, seconds (300..=600).
    pub scan_interval: Option<u64>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override notification routing.
    pub notify: Option<NotifyMode>,

    /// Don't warn about unsupported miwi devices.
    #[serde(default)]
    pub ignore_miwi: bool,

    /// Where to keep accumulated energy totals.
    pub energy_file: Option<PathBuf>,

    /// Alternate API host (staging, mocks).
    pub base_url: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Profile {
    /// Configured network names by slot.
    pub fn network_names(&self) -> [Option<String>; 3] {
        [
            self.network.clone(),
            self.network2.clone(),
            self.network3.clone(),
        ]
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "neviweb", "neviweb").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("neviweb");
    p
}

/// Default location of the energy totals file.
pub fn default_energy_file() -> PathBuf {
    ProjectDirs::from("com", "neviweb", "neviweb").map_or_else(
        || dirs_fallback().join("energy.json"),
        |dirs| dirs.data_dir().join("energy.json"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path`, then `NEVIWEB_`-prefixed environment variables.
///
/// Nested keys use a double underscore: `NEVIWEB_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEVIWEB_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the account username: profile, then `NEVIWEB_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("NEVIWEB_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the account password without CLI flags.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(pw) = std::env::var("NEVIWEB_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation to runtime config ───────────────────────────────────

/// Check a poll period against the range Neviweb tolerates.
pub fn validate_scan_interval(secs: u64) -> Result<Duration, ConfigError> {
    let interval = Duration::from_secs(secs);
    if interval < MIN_SCAN_INTERVAL || interval > MAX_SCAN_INTERVAL {
        return Err(ConfigError::Validation {
            field: "scan_interval".into(),
            reason: format!(
                "{secs}s is outside {}..={}s",
                MIN_SCAN_INTERVAL.as_secs(),
                MAX_SCAN_INTERVAL.as_secs()
            ),
        });
    }
    Ok(interval)
}

/// Build a `ControllerConfig` from a profile, with the password already
/// resolved. Profile fields override `defaults`.
pub fn build_controller_config(
    profile: &Profile,
    defaults: &Defaults,
    username: String,
    password: SecretString,
) -> Result<ControllerConfig, ConfigError> {
    let mut client = ClientConfig::new(username, password);
    client.network_names = profile.network_names();
    client.ignore_miwi = profile.ignore_miwi;
    client.notify = profile.notify.unwrap_or(defaults.notify);

    let mut transport = TransportConfig::default()
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)));
    if let Some(ref raw) = profile.base_url {
        let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
        transport = transport.with_base_url(url);
    }
    if let Some(ref ca_path) = profile.ca_cert {
        transport.tls = TlsMode::CustomCa(ca_path.clone());
    }

    let mut cfg = ControllerConfig::new(client);
    cfg.transport = transport;
    cfg.scan_interval =
        validate_scan_interval(profile.scan_interval.unwrap_or(defaults.scan_interval))?;
    cfg.energy_file.clone_from(&profile.energy_file);
    Ok(cfg)
}

/// Build a `ControllerConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;
    build_controller_config(profile, defaults, username, password)
}
