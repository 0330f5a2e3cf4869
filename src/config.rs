//! Host application configuration.
//!
//! The hosting application used to rely on module-level globals set at
//! import time. [`HostConfig`] replaces that: one struct, built once at
//! process start (from defaults or the environment) and passed by
//! reference to whatever needs it. The library itself never reads the
//! environment outside of [`HostConfig::from_env`].

use serde::{Deserialize, Serialize};

/// Environment variable holding the default connection string.
pub const URI_ENV_VAR: &str = "CLICKHOUSE_URI";

/// Environment variable holding the host application's secret key.
pub const SECRET_KEY_ENV_VAR: &str = "SECRET_KEY";

/// Configuration for the hosting application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Enable template processing in queries handed to the adapter
    pub template_processing: bool,
    /// Refuse connection strings pointing at unsafe targets
    pub prevent_unsafe_db_connections: bool,
    /// Honor proxy-forwarding headers in the hosting application
    pub enable_proxy_fix: bool,
    /// Default connection string when the caller supplies none
    pub default_uri: Option<String>,
    /// Secret key for the hosting application
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            template_processing: true,
            prevent_unsafe_db_connections: false,
            enable_proxy_fix: true,
            default_uri: None,
            secret_key: None,
        }
    }
}

impl HostConfig {
    /// Build a config from defaults plus the environment
    /// (`CLICKHOUSE_URI`, `SECRET_KEY`).
    pub fn from_env() -> Self {
        Self {
            default_uri: std::env::var(URI_ENV_VAR).ok(),
            secret_key: std::env::var(SECRET_KEY_ENV_VAR).ok(),
            ..Self::default()
        }
    }

    /// Set the default connection string.
    pub fn with_default_uri(mut self, uri: String) -> Self {
        self.default_uri = Some(uri);
        self
    }

    /// Set the secret key.
    pub fn with_secret_key(mut self, key: String) -> Self {
        self.secret_key = Some(key);
        self
    }
}
