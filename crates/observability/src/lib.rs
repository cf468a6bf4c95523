//! # Observability
//!
//! Logging setup and Prometheus metrics for the tracker bridge.
//!
//! Logging and the metrics endpoint are installed separately: every command
//! logs, only `run` serves metrics and only when a port is given. Without an
//! installed recorder the `metrics::record_*` calls are no-ops.

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{DeviceSummary, PoseMetricsAggregator, PoseMetricsSummary};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with the current span
    #[default]
    Json,
    /// Multi-line, for terminals
    Pretty,
    /// Single line
    Compact,
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `level` when it is set.
pub fn init_logging(format: LogFormat, level: &str) -> Result<()> {
    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_names(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter(level)?)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(?format, level, "logging initialized");
    Ok(())
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'")),
    }
}

/// Serve Prometheus metrics on `0.0.0.0:port`
pub fn serve_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to serve metrics on port {port}"))?;

    tracing::info!(port, "metrics endpoint listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directives_accepted() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("warn,device_driver=trace").is_ok());
    }
}
