//! Client configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{APPLICATION_TYPES_TTL_SECS, DEFAULT_TIMEOUT_SECS, SESSION_TTL_SECS};

/// Configuration for one API client instance.
///
/// `api_url` and `api_key` are distinct fields read from distinct sources;
/// the key is never serialized back out.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for REST calls, without trailing slash.
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub graphql_url: String,
    #[serde(default)]
    pub restore_url: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
    /// Per-request deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_product")]
    pub product: String,
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default)]
    pub os_version: String,
    /// Session cache lifetime in milliseconds.
    #[serde(default = "default_session_ttl_ms")]
    pub session_ttl_ms: u64,
    /// Application-type catalog lifetime in milliseconds.
    #[serde(default = "default_application_types_ttl_ms")]
    pub application_types_ttl_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_SECS * 1000
}

fn default_product() -> String {
    format!("cli-{}", env!("CARGO_PKG_VERSION"))
}

fn default_os() -> String {
    std::env::consts::OS.to_string()
}

fn default_session_ttl_ms() -> u64 {
    SESSION_TTL_SECS * 1000
}

fn default_application_types_ttl_ms() -> u64 {
    APPLICATION_TYPES_TTL_SECS * 1000
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Create a configuration with default timeout, TTLs and platform identity.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        graphql_url: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            graphql_url: graphql_url.into(),
            restore_url: None,
            certificate_url: None,
            timeout_ms: default_timeout_ms(),
            product: default_product(),
            os: default_os(),
            os_version: String::new(),
            session_ttl_ms: default_session_ttl_ms(),
            application_types_ttl_ms: default_application_types_ttl_ms(),
        }
    }

    pub fn with_restore_url(mut self, url: impl Into<String>) -> Self {
        self.restore_url = Some(url.into());
        self
    }

    pub fn with_certificate_url(mut self, url: impl Into<String>) -> Self {
        self.certificate_url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = as_millis(timeout);
        self
    }

    pub fn with_platform(
        mut self,
        product: impl Into<String>,
        os: impl Into<String>,
        os_version: impl Into<String>,
    ) -> Self {
        self.product = product.into();
        self.os = os.into();
        self.os_version = os_version.into();
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl_ms = as_millis(ttl);
        self
    }

    pub fn with_application_types_ttl(mut self, ttl: Duration) -> Self {
        self.application_types_ttl_ms = as_millis(ttl);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_millis(self.session_ttl_ms)
    }

    pub fn application_types_ttl(&self) -> Duration {
        Duration::from_millis(self.application_types_ttl_ms)
    }

    /// `User-Agent` value: `<product>-<os>-<os_version>`.
    pub fn user_agent(&self) -> String {
        format!("{}-{}-{}", self.product, self.os, self.os_version)
    }

    /// Absolute URL for a REST path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("graphql_url", &self.graphql_url)
            .field("restore_url", &self.restore_url)
            .field("certificate_url", &self.certificate_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("product", &self.product)
            .field("os", &self.os)
            .field("os_version", &self.os_version)
            .field("session_ttl_ms", &self.session_ttl_ms)
            .field("application_types_ttl_ms", &self.application_types_ttl_ms)
            .finish()
    }
}
