use std::error::Error as StdError;
use std::fmt::Write;

use http::StatusCode;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Endpoint reported unhealthy status {0}")]
    UnhealthyStatus(StatusCode),
}

impl ProbeError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProbeError::Config(_) | ProbeError::Client(_) => 2,
            ProbeError::Request { .. } => 3,
            ProbeError::Body(_) => 4,
            ProbeError::UnhealthyStatus(_) => 5,
        }
    }

    /// Whether the request ran out of time (connect or overall deadline).
    pub fn is_timeout(&self) -> bool {
        match self {
            ProbeError::Request { source, .. } | ProbeError::Body(source) => source.is_timeout(),
            _ => false,
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ProbeError::Request { source, .. } if source.is_connect())
    }

    /// Render the error and its causes on a single line.
    ///
    /// reqwest keeps the interesting detail ("Connection refused", "dns error")
    /// several levels down the `source()` chain, so the top-level message alone
    /// is rarely enough to diagnose a failed probe.
    pub fn report(&self) -> String {
        let mut line = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            let message = err.to_string();
            // thiserror already inlines the direct source for most variants
            if !line.contains(&message) {
                let _ = write!(line, ": {}", message);
            }
            cause = err.source();
        }
        line
    }
}
