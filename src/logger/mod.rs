//! Logging and metrics export for the `empire` binary.
//!
//! `RUST_LOG` overrides the configured level filter. Output goes to stderr so
//! that query results printed on stdout stay machine readable.

mod config;

use std::net::SocketAddr;

pub(crate) use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub(crate) fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logger_config.level));

    tracing_subscriber::registry()
        .with(output_layer(logger_config.format))
        .with(filter)
        .init();

    if telemetry_config.metrics.enabled {
        install_prometheus(&telemetry_config.metrics);
    }
}

fn output_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

fn install_prometheus(metrics_config: &TelemetryMetricsConfig) {
    let Some(bind_address) = parse_bind_address(&metrics_config.bind_address) else {
        tracing::warn!(
            bind_address = %metrics_config.bind_address,
            "Invalid metrics bind address; Prometheus exporter not started"
        );
        return;
    };

    if let Err(error) = PrometheusBuilder::new()
        .with_http_listener(bind_address)
        .install()
    {
        tracing::warn!(
            bind_address = %bind_address,
            error = %error,
            "Prometheus exporter failed to start"
        );
        return;
    }

    tracing::info!(bind_address = %bind_address, "Serving Prometheus metrics");
}

fn parse_bind_address(value: &str) -> Option<SocketAddr> {
    value.trim().parse().ok()
}
