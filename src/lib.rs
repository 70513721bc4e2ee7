//! health-probe: a one-shot HTTP health check.
//!
//! Issues a single GET against a health endpoint with a configurable pooled
//! client, and returns the drained response or a typed error.

pub mod config;
pub mod error;
pub mod probe;

pub use config::{ConfigError, LoggingConfig, ProbeConfig};
pub use error::ProbeError;
pub use probe::{build_client, probe, ProbeResponse};
