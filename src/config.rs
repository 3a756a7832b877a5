//! Runtime configuration for the edition lookup and the HTTP service.
//!
//! Configuration is assembled in three layers, later layers winning:
//!
//! 1. Built-in defaults targeting the *Norderneyer Morgen* publisher
//! 2. An optional YAML file (`--config path`)
//! 3. Command-line flags and their environment variables
//!
//! Every field of the YAML file is optional; unknown keys are rejected so a
//! misspelled option does not silently fall back to a default.
//!
//! # Example
//!
//! ```yaml
//! base_url: https://www.nomo-norderney.de
//! path_template: /media/ausgaben/{year}/{month}/nomo_{day}_{month}_{year}.pdf
//! display_name: Norderneyer Morgen
//! lookback_days: 7
//! probe_timeout_ms: 5000
//! ```

use crate::template::{PathTemplate, TemplateError};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::{Origin, Url};

/// Publisher origin the edition PDFs are served from.
pub const DEFAULT_BASE_URL: &str = "https://www.nomo-norderney.de";
/// Path of a single edition below [`DEFAULT_BASE_URL`].
pub const DEFAULT_PATH_TEMPLATE: &str = "/media/ausgaben/{year}/{month}/nomo_{day}_{month}_{year}.pdf";
/// Publication name used in edition titles.
pub const DEFAULT_DISPLAY_NAME: &str = "Norderneyer Morgen";
/// Days to look back after today; `7` yields eight candidates.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Per-request timeout of an existence check, in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
/// Longest silence tolerated from the publisher while proxying a document.
pub const DEFAULT_PROXY_READ_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; NoMo-PDF-Viewer/1.0)";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Upper bound for `lookback_days`; a year of candidates is already far past
/// any sensible fallback window.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("base_url must be an absolute http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("invalid path_template: {0}")]
    Template(#[from] TemplateError),

    #[error("lookback_days must not exceed {MAX_LOOKBACK_DAYS}, got {0}")]
    LookbackTooLarge(u32),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("display_name must not be empty")]
    EmptyDisplayName,
}

/// Fully resolved configuration.
///
/// [`Default`] targets the *Norderneyer Morgen*; see the `DEFAULT_*` constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionConfig {
    /// Publisher origin, e.g. `https://www.nomo-norderney.de`.
    pub base_url: String,
    /// Path appended to `base_url`; see [`crate::template`] for placeholders.
    pub path_template: String,
    /// Publication name, used as `"{display_name} - DD.MM.YYYY"`.
    pub display_name: String,
    /// Offsets `0..=lookback_days` are probed.
    pub lookback_days: u32,
    /// Timeout of a single existence probe.
    pub probe_timeout_ms: u64,
    /// Longest wait for upstream headers or the next body chunk in the proxy.
    pub proxy_read_timeout_ms: u64,
    /// `User-Agent` sent with probes and proxied requests.
    pub user_agent: String,
    /// Listen address of the HTTP service.
    pub bind: String,
}

impl Default for EditionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            proxy_read_timeout_ms: DEFAULT_PROXY_READ_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// A sparse set of settings, as read from a YAML file or the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub base_url: Option<String>,
    pub path_template: Option<String>,
    pub display_name: Option<String>,
    pub lookback_days: Option<u32>,
    pub probe_timeout_ms: Option<u64>,
    pub proxy_read_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub bind: Option<String>,
}

impl EditionConfig {
    /// Overwrite every field that is set in `partial`.
    pub fn merge(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.base_url {
            self.base_url = v;
        }
        if let Some(v) = partial.path_template {
            self.path_template = v;
        }
        if let Some(v) = partial.display_name {
            self.display_name = v;
        }
        if let Some(v) = partial.lookback_days {
            self.lookback_days = v;
        }
        if let Some(v) = partial.probe_timeout_ms {
            self.probe_timeout_ms = v;
        }
        if let Some(v) = partial.proxy_read_timeout_ms {
            self.proxy_read_timeout_ms = v;
        }
        if let Some(v) = partial.user_agent {
            self.user_agent = v;
        }
        if let Some(v) = partial.bind {
            self.bind = v;
        }
    }

    /// Check that the configuration can drive a resolution.
    ///
    /// # Errors
    ///
    /// Returns the first problem found:
    /// - `base_url` is not an absolute http(s) URL
    /// - `path_template` has unknown or unbalanced placeholders
    /// - `lookback_days` exceeds [`MAX_LOOKBACK_DAYS`]
    /// - a timeout is zero
    /// - `display_name` is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.publisher_origin()?;
        PathTemplate::parse(&self.path_template)?;
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::LookbackTooLarge(self.lookback_days));
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("probe_timeout_ms"));
        }
        if self.proxy_read_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("proxy_read_timeout_ms"));
        }
        if self.display_name.trim().is_empty() {
            return Err(ConfigError::EmptyDisplayName);
        }
        Ok(())
    }

    /// Origin of `base_url`; the proxy only relays requests to this origin.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidBaseUrl`] if `base_url` does not parse, is not
    /// http(s), or has no host.
    pub fn publisher_origin(&self) -> Result<Origin, ConfigError> {
        let invalid = || ConfigError::InvalidBaseUrl(self.base_url.clone());
        let url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(url.origin())
    }

    /// [`Self::probe_timeout_ms`] as a [`Duration`], applied per request.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// [`Self::proxy_read_timeout_ms`] as a [`Duration`].
    ///
    /// A read timeout, not a total one: it restarts with every chunk received.
    pub fn proxy_read_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy_read_timeout_ms)
    }
}

/// Parse a YAML document into a [`PartialConfig`].
///
/// An empty document yields an empty set of settings.
///
/// # Errors
///
/// [`ConfigError::Parse`] naming `path` on malformed YAML or unknown keys.
pub fn parse_config(yaml: &str, path: &str) -> Result<PartialConfig, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(PartialConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Read and parse the YAML file at `path`.
///
/// # Errors
///
/// [`ConfigError::Read`] if the file cannot be read, [`ConfigError::Parse`]
/// if it is not a valid settings document.
#[instrument(level = "info")]
pub async fn load_config_file(path: &str) -> Result<PartialConfig, ConfigError> {
    let yaml = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let partial = parse_config(&yaml, path)?;
    debug!(?partial, "Parsed config file");
    Ok(partial)
}

/// Build the effective configuration from defaults, an optional file and
/// command-line overrides, then validate it.
///
/// # Arguments
///
/// * `path` - optional YAML file layered over the defaults
/// * `overrides` - flags and environment variables, applied last
///
/// # Errors
///
/// Any [`ConfigError`] from reading, parsing or [`EditionConfig::validate`].
#[instrument(level = "info", skip(overrides))]
pub async fn load_effective(
    path: Option<&str>,
    overrides: PartialConfig,
) -> Result<EditionConfig, ConfigError> {
    let mut config = EditionConfig::default();
    if let Some(path) = path {
        config.merge(load_config_file(path).await?);
        info!(path, "Loaded configuration file");
    }
    config.merge(overrides);
    config.validate()?;
    Ok(config)
}
