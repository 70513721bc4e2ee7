//! health-probe: query a health endpoint once and report the result.
//!
//! Resolves configuration (defaults, optional TOML file, `HEALTH_PROBE_*`
//! environment, command line), initializes tracing on stderr, performs the
//! probe and prints the response summary and body on stdout. Failures print a
//! single `error:` line and exit with a code specific to the failure kind.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_probe::config::DEFAULT_LOG_FILTER;
use health_probe::{probe, ProbeConfig, ProbeError};

/// health-probe: issue one HTTP GET against a health endpoint
#[derive(Parser, Debug)]
#[command(name = "health-probe", version, about)]
struct Args {
    /// Health endpoint to query (default: http://localhost:8088/health)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Health endpoint to query, as a flag
    #[arg(long = "url", value_name = "URL", conflicts_with = "url")]
    url_flag: Option<String>,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum idle connections kept in the pool
    #[arg(long)]
    max_idle_connections: Option<usize>,

    /// Seconds an idle pooled connection stays open
    #[arg(long, value_name = "SECONDS")]
    idle_timeout: Option<u64>,

    /// Negotiate gzip and decode responses transparently
    #[arg(long, conflicts_with = "no_compression")]
    compression: bool,

    /// Never send Accept-Encoding (the default)
    #[arg(long)]
    no_compression: bool,

    /// Overall request deadline in seconds (0 disables it)
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Deadline for establishing the connection in seconds
    #[arg(long, value_name = "SECONDS")]
    connect_timeout: Option<u64>,

    /// Exit non-zero when the endpoint answers with a 4xx or 5xx status
    #[arg(long)]
    fail_on_error_status: bool,

    /// Log format: text or json
    #[arg(long)]
    log_format: Option<String>,

    /// Log level filter (e.g., "health_probe=debug,reqwest=debug")
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Command line values take precedence over file and environment.
    fn apply(&self, config: &mut ProbeConfig) {
        if let Some(url) = self.url.as_ref().or(self.url_flag.as_ref()) {
            config.url = url.clone();
        }
        if let Some(max) = self.max_idle_connections {
            config.max_idle_connections = max;
        }
        if let Some(secs) = self.idle_timeout {
            config.idle_timeout_seconds = secs;
        }
        if self.compression {
            config.disable_compression = false;
        }
        if self.no_compression {
            config.disable_compression = true;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_seconds = secs;
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout_seconds = Some(secs);
        }
        if self.fail_on_error_status {
            config.fail_on_error_status = true;
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

fn resolve_config(args: &Args) -> Result<ProbeConfig, ProbeError> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    config.apply_env()?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn init_tracing(log_level: Option<String>, json: bool) {
    // Priority: CLI > env > default
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    // stdout is reserved for the probe output
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config: &ProbeConfig) -> Result<(), ProbeError> {
    let response = probe(config).await?;

    // Summary line, then the body
    println!("{response}");

    response.ensure_healthy(config.fail_on_error_status)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = resolve_config(&args);
    let json = config.as_ref().is_ok_and(|c| c.logging.is_json());
    init_tracing(args.log_level.clone(), json);

    let result = match config {
        Ok(config) => {
            tracing::debug!(url = %config.url, "Loaded configuration");
            run(&config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("error: {}", e.report());
            ExitCode::from(e.exit_code())
        }
    }
}
