//! The single health request.
//!
//! Builds a pooled HTTP client from `ProbeConfig`, issues one GET against the
//! configured endpoint and drains the response into an owned `ProbeResponse`.
//! Any failure is returned before a response value exists, so callers never
//! see a partially-populated result.

use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use http::{HeaderMap, StatusCode, Version};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::error::ProbeError;

/// A fully drained response from the health endpoint.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ProbeResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// One-line rendering of version, status and headers.
    pub fn summary(&self) -> String {
        format!("{:?} {} {:?}", self.version, self.status, self.headers)
    }

    /// Fail with `UnhealthyStatus` on 4xx/5xx when `strict` is set.
    pub fn ensure_healthy(&self, strict: bool) -> Result<(), ProbeError> {
        if strict && (self.status.is_client_error() || self.status.is_server_error()) {
            return Err(ProbeError::UnhealthyStatus(self.status));
        }
        Ok(())
    }
}

impl fmt::Display for ProbeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        write!(f, "{}", self.body_text())
    }
}

/// Build the HTTP client described by `config`.
pub fn build_client(config: &ProbeConfig) -> Result<reqwest::Client, ProbeError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(config.idle_timeout())
        .gzip(!config.disable_compression);

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(timeout);
    }

    builder.build().map_err(ProbeError::Client)
}

/// Issue the health request and drain its body.
pub async fn probe(config: &ProbeConfig) -> Result<ProbeResponse, ProbeError> {
    config.validate()?;

    let span = tracing::info_span!(
        "probe",
        probe_id = %Uuid::new_v4(),
        url = %config.url,
        duration_ms = tracing::field::Empty,
    );

    async move {
        let start = Instant::now();
        let result = execute(config).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::Span::current().record("duration_ms", duration_ms);

        match &result {
            Ok(response) => tracing::info!(
                status = response.status().as_u16(),
                body_bytes = response.body().len(),
                duration_ms,
                "Probe completed"
            ),
            Err(e) => tracing::error!(
                error = %e.report(),
                timeout = e.is_timeout(),
                duration_ms,
                "Probe failed"
            ),
        }

        result
    }
    .instrument(span)
    .await
}

async fn execute(config: &ProbeConfig) -> Result<ProbeResponse, ProbeError> {
    let client = build_client(config)?;

    tracing::debug!(
        max_idle_connections = config.max_idle_connections,
        idle_timeout_secs = config.idle_timeout_seconds,
        compression = !config.disable_compression,
        request_timeout_secs = config.request_timeout_seconds,
        "HTTP client configured"
    );

    let response = client
        .get(&config.url)
        .send()
        .await
        .map_err(|source| ProbeError::Request {
            url: config.url.clone(),
            source,
        })?;

    let version = response.version();
    let status = response.status();
    let headers = response.headers().clone();

    // Consumes the response; the body stream is released on every path out of here
    let body = response.bytes().await.map_err(ProbeError::Body)?;

    Ok(ProbeResponse {
        version,
        status,
        headers,
        body: body.to_vec(),
    })
}
