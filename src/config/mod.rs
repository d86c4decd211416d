mod defaults;
mod error;
mod loader;

use empire_repository::{DataSourceConfig, RepositoryOptions};
pub(crate) use error::ConfigError;
pub(crate) use loader::{load_configuration, parse_cli};
use serde::{Deserialize, Serialize};

use crate::logger::{LoggerConfig, TelemetryConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Keys handed to the data source factory (`url`, `repo`, `files`, `dir`)
    pub data_source: DataSourceConfig,
    pub repository: RepositoryOptions,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}
