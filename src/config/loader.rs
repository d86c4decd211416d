use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command, value_parser};
use empire_repository::BackendSelection;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};

use super::{Config, defaults};
use crate::config::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub config_path: PathBuf,
    /// CONSTRUCT query to run once the data source is ready
    pub construct: Option<String>,
}

fn command() -> Command {
    Command::new("empire")
        .about("Builds an RDF repository data source from a config file")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Sets a custom config file (.toml format)"),
        )
        .arg(
            Arg::new("construct")
                .long("construct")
                .value_name("QUERY")
                .help("Runs a SPARQL CONSTRUCT query and prints the N-Triples result"),
        )
}

pub(crate) fn parse_cli() -> CliArgs {
    cli_args(&command().get_matches())
}

fn cli_args(matches: &ArgMatches) -> CliArgs {
    CliArgs {
        config_path: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        construct: matches.get_one::<String>("construct").cloned(),
    }
}

/// Load the config file at `path` on top of the typed defaults.
pub(crate) fn load_configuration(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingConfig(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(defaults::config()))
        .merge(Toml::file(path))
        .extract()
        .map_err(Box::new)?;

    if BackendSelection::from_config(&config.data_source).is_none() {
        return Err(ConfigError::InvalidConfig(
            "[data_source] needs url and repo, files, or dir".to_string(),
        ));
    }

    Ok(config)
}
