//! Configuration management.

use anyhow::{Context as _, Result};
use nodeboot::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nodeboot/config.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Controller endpoint URL.
    pub endpoint: Option<String>,

    /// PEM bundle of trusted controller CAs.
    pub ca_file: Option<PathBuf>,

    /// Authorization token, used verbatim.
    pub token: Option<String>,

    /// File holding the authorization token.
    pub token_file: Option<PathBuf>,

    /// How the controller host is resolved.
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Retry policy for `query`.
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Source of controller addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    /// System resolver, with the not-ready pre-flight check
    #[default]
    System,
    /// Dedicated DNS resolver bound to the dialer
    Dns,
    /// Fixed host table bound to the dialer
    Static,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSettings {
    #[serde(default)]
    pub mode: ResolverMode,

    /// Host table for `static` mode.
    #[serde(default)]
    pub hosts: BTreeMap<String, Vec<IpAddr>>,
}

/// Retry settings, in whole units for readability in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_secs: u64,
    pub not_ready_backoff_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            initial_backoff_ms: u64::try_from(defaults.initial_backoff.as_millis())
                .unwrap_or(u64::MAX),
            max_backoff_secs: defaults.max_backoff.as_secs(),
            not_ready_backoff_secs: defaults.not_ready_backoff.as_secs(),
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self::new()
            .max_retries(settings.max_retries)
            .initial_backoff(Duration::from_millis(settings.initial_backoff_ms))
            .max_backoff(Duration::from_secs(settings.max_backoff_secs))
            .not_ready_backoff(Duration::from_secs(settings.not_ready_backoff_secs))
    }
}

impl Config {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Let command-line values win over file values.
    pub fn apply_overrides(
        &mut self,
        endpoint: Option<String>,
        ca_file: Option<PathBuf>,
        token: Option<String>,
    ) {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        if ca_file.is_some() {
            self.ca_file = ca_file;
        }
        if token.is_some() {
            self.token = token;
            self.token_file = None;
        }
    }
}
