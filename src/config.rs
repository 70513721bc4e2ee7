//! Configuration loading and constants.
//!
//! `ProbeConfig` describes the target endpoint and the transport settings used
//! for the single health request. Values are layered: built-in defaults, then
//! an optional TOML file, then `HEALTH_PROBE_*` environment variables, then
//! command line overrides applied by the binary.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use const_format::formatcp;
use serde::Deserialize;

// =============================================================================
// Default Endpoint
// =============================================================================

/// Host queried when no URL is configured
pub const DEFAULT_HOST: &str = "localhost";

/// Port queried when no URL is configured
pub const DEFAULT_PORT: u16 = 8088;

/// Path of the health endpoint
pub const DEFAULT_HEALTH_PATH: &str = "/health";

pub const DEFAULT_URL: &str =
    formatcp!("http://{}:{}{}", DEFAULT_HOST, DEFAULT_PORT, DEFAULT_HEALTH_PATH);

// =============================================================================
// Transport Defaults
// =============================================================================

/// Maximum idle connections kept in the pool
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;

/// Idle connections are closed after this many seconds
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Overall request deadline in seconds (0 disables the deadline)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Logging Defaults
// =============================================================================

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "health_probe=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "HEALTH_PROBE_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Health endpoint to query
    pub url: String,
    /// Cap on idle pooled connections (per host)
    pub max_idle_connections: usize,
    /// Seconds an idle connection stays open
    pub idle_timeout_seconds: u64,
    /// Suppress Accept-Encoding and transparent decompression
    pub disable_compression: bool,
    /// Deadline for the whole request in seconds, 0 for none
    pub request_timeout_seconds: u64,
    /// Deadline for establishing the TCP connection
    pub connect_timeout_seconds: Option<u64>,
    /// Treat 4xx/5xx responses as a failed probe
    pub fail_on_error_status: bool,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            idle_timeout_seconds: DEFAULT_IDLE_TIMEOUT_SECS,
            disable_compression: true,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_seconds: None,
            fail_on_error_status: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl ProbeConfig {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Apply `HEALTH_PROBE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, url)) = var("URL") {
            self.url = url;
        }
        if let Some((key, value)) = var("MAX_IDLE_CONNECTIONS") {
            self.max_idle_connections = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("IDLE_TIMEOUT_SECONDS") {
            self.idle_timeout_seconds = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("DISABLE_COMPRESSION") {
            self.disable_compression = parse_env_flag(&key, &value)?;
        }
        if let Some((key, value)) = var("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = parse_env(&key, &value)?;
        }
        if let Some((key, value)) = var("CONNECT_TIMEOUT_SECONDS") {
            self.connect_timeout_seconds = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = var("FAIL_ON_ERROR_STATUS") {
            self.fail_on_error_status = parse_env_flag(&key, &value)?;
        }
        if let Some((_, format)) = var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Check values that serde cannot: URL shape and log format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| ConfigError::Validation(format!("invalid url '{}': {}", self.url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "unsupported url scheme '{}' (expected http or https)",
                url.scheme()
            )));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "unknown log format '{}' (expected text or json)",
                self.logging.format
            )));
        }

        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Request deadline, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Env {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Booleans accept `true`/`false` and `1`/`0`, case-insensitively.
fn parse_env_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::Env {
            key: key.to_string(),
            message: format!("expected true, false, 1 or 0, got '{}'", other),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {message}")]
    Env { key: String, message: String },
    #[error("Configuration error: {0}")]
    Validation(String),
}
