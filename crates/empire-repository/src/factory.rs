use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use async_trait::async_trait;

use crate::{
    backend::{DefaultEngine, RdfEngine, Repository},
    config::{BackendSelection, DataSourceConfig, RepositoryOptions},
    data_source::RepositoryDataSource,
    error::{DataSourceError, StoreError},
    ingest, metrics,
};

/// Alias under which the repository factory is registered
pub const ALIAS: &str = "sesame";

/// Builds a data source from a string-keyed configuration map
#[async_trait]
pub trait DataSourceFactory: Send + Sync {
    type Source;

    /// Short name the factory is registered under
    fn alias(&self) -> &'static str;

    /// Whether `config` carries enough keys for [`DataSourceFactory::create`]
    fn can_create(&self, config: &DataSourceConfig) -> bool;

    async fn create(&self, config: &DataSourceConfig) -> Result<Self::Source, DataSourceError>;
}

/// Factory for RDF repository data sources
///
/// Picks a backend from the configuration map, in order of precedence:
/// * `url` + `repo`: repository on a remote Sesame/RDF4J service
/// * `files`: in-memory repository loaded from the listed RDF files
/// * `dir`: on-disk repository rooted at the directory
pub struct RepositoryDataSourceFactory<E: RdfEngine = DefaultEngine> {
    engine: E,
    options: RepositoryOptions,
}

impl RepositoryDataSourceFactory<DefaultEngine> {
    pub fn new(options: RepositoryOptions) -> Self {
        Self::with_engine(DefaultEngine::new(options.clone()), options)
    }
}

impl<E: RdfEngine> RepositoryDataSourceFactory<E> {
    pub fn with_engine(engine: E, options: RepositoryOptions) -> Self {
        Self { engine, options }
    }

    async fn create_remote(
        &self,
        url: &str,
        repo: &str,
    ) -> Result<Box<dyn Repository>, StoreError> {
        let repository = self.engine.remote(url, repo).await?;
        repository.initialize().await?;
        Ok(repository)
    }

    async fn create_persistent(&self, dir: &Path) -> Result<Box<dyn Repository>, StoreError> {
        let repository = self.engine.persistent(dir).await?;
        repository.initialize().await?;
        Ok(repository)
    }

    async fn create_bulk_load(
        &self,
        files: &[PathBuf],
    ) -> Result<Box<dyn Repository>, DataSourceError> {
        let initialization = |source| DataSourceError::Initialization {
            backend: "memory",
            source,
        };

        let repository = self.engine.memory().await.map_err(initialization)?;
        repository.initialize().await.map_err(initialization)?;
        let mut connection = repository.connection().await.map_err(initialization)?;

        let started = Instant::now();
        let loaded = ingest::bulk_load(connection.as_mut(), files).await;
        metrics::record_bulk_load(
            files.len(),
            loaded.as_ref().copied().unwrap_or(0),
            loaded.as_ref().err(),
            started.elapsed(),
        );
        let statements = loaded?;

        tracing::info!(
            files = files.len(),
            statements = statements,
            "Bulk loaded RDF files into in-memory repository"
        );
        Ok(repository)
    }

    async fn create_repository(
        &self,
        selection: &BackendSelection,
    ) -> Result<Box<dyn Repository>, DataSourceError> {
        let initialization = |source| DataSourceError::Initialization {
            backend: selection.backend_name(),
            source,
        };

        match selection {
            BackendSelection::Remote { url, repo } => {
                self.create_remote(url, repo).await.map_err(initialization)
            }
            BackendSelection::BulkLoad { files } => self.create_bulk_load(files).await,
            BackendSelection::Persistent { dir } => {
                self.create_persistent(dir).await.map_err(initialization)
            }
        }
    }
}

#[async_trait]
impl<E: RdfEngine> DataSourceFactory for RepositoryDataSourceFactory<E> {
    type Source = RepositoryDataSource;

    fn alias(&self) -> &'static str {
        ALIAS
    }

    fn can_create(&self, config: &DataSourceConfig) -> bool {
        BackendSelection::from_config(config).is_some()
    }

    async fn create(&self, config: &DataSourceConfig) -> Result<Self::Source, DataSourceError> {
        let Some(selection) = BackendSelection::from_config(config) else {
            return Err(DataSourceError::InvalidConfiguration(format!("{config:?}")));
        };

        let backend = selection.backend_name();
        tracing::info!(backend = %backend, "Creating repository data source");

        let started = Instant::now();
        let result = self.create_repository(&selection).await;
        metrics::record_create(backend, result.as_ref().err(), started.elapsed());

        match result {
            Ok(repository) => {
                tracing::info!(
                    backend = %backend,
                    repository = %repository.name(),
                    "Repository data source ready"
                );
                Ok(RepositoryDataSource::new(repository, &self.options))
            }
            Err(error) => {
                tracing::error!(backend = %backend, error = %error, "Failed to create data source");
                Err(error)
            }
        }
    }
}
