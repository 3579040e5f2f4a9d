//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FLEETLINK_API_URL`: REST base URL (required)
//! - `FLEETLINK_API_KEY`: API key sent as the `apikey` header (required)
//! - `FLEETLINK_GRAPHQL_URL`: GraphQL endpoint (required)
//! - `FLEETLINK_RESTORE_URL`: Restore endpoint
//! - `FLEETLINK_CERTIFICATE_URL`: Certificate endpoint
//! - `FLEETLINK_TIMEOUT_SECS`: Per-request deadline in seconds
//! - `FLEETLINK_PRODUCT`, `FLEETLINK_OS`, `FLEETLINK_OS_VERSION`: User agent parts
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./fleetlink.toml` or `./fleetlink.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::time::Duration;

use fleetlink_domain::ClientConfig;
use thiserror::Error;
use url::Url;

pub const ENV_API_URL: &str = "FLEETLINK_API_URL";
pub const ENV_API_KEY: &str = "FLEETLINK_API_KEY";
pub const ENV_GRAPHQL_URL: &str = "FLEETLINK_GRAPHQL_URL";
pub const ENV_RESTORE_URL: &str = "FLEETLINK_RESTORE_URL";
pub const ENV_CERTIFICATE_URL: &str = "FLEETLINK_CERTIFICATE_URL";
pub const ENV_TIMEOUT_SECS: &str = "FLEETLINK_TIMEOUT_SECS";
pub const ENV_PRODUCT: &str = "FLEETLINK_PRODUCT";
pub const ENV_OS: &str = "FLEETLINK_OS";
pub const ENV_OS_VERSION: &str = "FLEETLINK_OS_VERSION";

const CONFIG_FILE_NAMES: [&str; 4] = ["fleetlink.toml", "fleetlink.json", "config.toml", "config.json"];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("no config file found in any of the standard locations")]
    NoConfigFile,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML format: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<ClientConfig, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The three URL/key variables are required; everything else falls back to
/// the [`ClientConfig`] defaults.
pub fn load_from_env() -> Result<ClientConfig, ConfigError> {
    let api_url = env_var(ENV_API_URL)?;
    let api_key = env_var(ENV_API_KEY)?;
    let graphql_url = env_var(ENV_GRAPHQL_URL)?;

    let mut config = ClientConfig::new(api_url, api_key, graphql_url);

    if let Some(url) = optional_env(ENV_RESTORE_URL) {
        config = config.with_restore_url(url);
    }

    if let Some(url) = optional_env(ENV_CERTIFICATE_URL) {
        config = config.with_certificate_url(url);
    }

    if let Some(raw) = optional_env(ENV_TIMEOUT_SECS) {
        let seconds = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            key: ENV_TIMEOUT_SECS,
            reason: e.to_string(),
        })?;
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    let product = optional_env(ENV_PRODUCT).unwrap_or_else(|| config.product.clone());
    let os = optional_env(ENV_OS).unwrap_or_else(|| config.os.clone());
    let os_version = optional_env(ENV_OS_VERSION).unwrap_or_else(|| config.os_version.clone());

    validate(config.with_platform(product, os, os_version))
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p));
            }
            p
        }
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let mut config: ClientConfig = match extension {
        "toml" => toml::from_str(contents)?,
        "json" => serde_json::from_str(contents)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    config.api_url = config.api_url.trim_end_matches('/').to_string();
    validate(config)
}

/// Reject endpoints that are not absolute URLs.
fn validate(config: ClientConfig) -> Result<ClientConfig, ConfigError> {
    check_url("api_url", &config.api_url)?;
    check_url("graphql_url", &config.graphql_url)?;
    if let Some(restore_url) = &config.restore_url {
        check_url("restore_url", restore_url)?;
    }
    if let Some(certificate_url) = &config.certificate_url {
        check_url("certificate_url", certificate_url)?;
    }
    Ok(config)
}

fn check_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue { key, reason: format!("{value:?}: {e}") })
}

/// Probe multiple paths for configuration files
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &'static str) -> Result<String, ConfigError> {
    optional_env(key).ok_or(ConfigError::MissingEnv(key))
}

/// Non-blank environment variable, if set.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
