mod config;
mod error;
mod logger;

use std::process::ExitCode;

use empire_repository::{DataSourceFactory, RepositoryDataSourceFactory};

use crate::{config::Config, error::AppError};

#[tokio::main]
async fn main() -> ExitCode {
    let args = config::parse_cli();

    let config = match config::load_configuration(&args.config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    logger::initialize(&config.logger, &config.telemetry);

    match run(config, args.construct.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "empire failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, construct: Option<&str>) -> Result<(), AppError> {
    let factory = RepositoryDataSourceFactory::new(config.repository.clone());
    tracing::info!(
        factory = factory.alias(),
        keys = ?config.data_source.keys().collect::<Vec<_>>(),
        "Creating data source"
    );

    let source = factory.create(&config.data_source).await?;
    let statements = source.size().await?;
    tracing::info!(
        backend = source.backend_name(),
        statements = statements,
        "Data source ready"
    );

    if let Some(query) = construct {
        let triples = source.construct(query).await?;
        if !triples.is_empty() {
            println!("{triples}");
        }
    }

    Ok(())
}
