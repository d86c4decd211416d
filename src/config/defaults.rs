//! Typed defaults merged underneath the user's config file.

use empire_repository::{DataSourceConfig, RepositoryOptions};

use super::Config;
use crate::logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};

pub(crate) fn config() -> Config {
    Config {
        data_source: DataSourceConfig::new(),
        repository: RepositoryOptions::default(),
        logger: LoggerConfig {
            level: "empire=info,empire_repository=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: TelemetryConfig {
            metrics: TelemetryMetricsConfig {
                enabled: false,
                bind_address: "127.0.0.1:9464".to_string(),
            },
        },
    }
}
