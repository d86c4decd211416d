mod oxigraph_backend;
mod remote;

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use oxigraph::model::Quad;
pub use oxigraph_backend::OxigraphRepository;
pub use remote::RemoteRepository;

use crate::{
    config::RepositoryOptions,
    error::{Result, StoreError},
};

/// Trait for RDF repositories
///
/// Implementations wrap a specific store (embedded Oxigraph, a remote
/// Sesame/RDF4J service, ...). A repository is unusable until
/// [`Repository::initialize`] has succeeded.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Backend name for logging/debugging
    fn name(&self) -> &'static str;

    /// Bring the repository into a usable state, verifying it is reachable
    async fn initialize(&self) -> Result<()>;

    /// Open a write connection
    async fn connection(&self) -> Result<Box<dyn RepositoryConnection>>;

    /// Number of statements in the repository
    async fn size(&self) -> Result<usize>;

    /// Check whether the quad is stored
    async fn contains(&self, quad: &Quad) -> Result<bool>;

    /// Execute a SPARQL UPDATE query (INSERT/DELETE)
    async fn update(&self, query: &str, timeout: Duration) -> Result<()>;

    /// Execute a SPARQL CONSTRUCT query
    ///
    /// Returns N-Triples lines
    async fn construct(&self, query: &str, timeout: Duration) -> Result<String>;

    /// Execute a SPARQL ASK query
    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool>;
}

/// Write session against a repository.
///
/// Added quads are buffered until [`RepositoryConnection::commit`], which applies
/// them atomically. Dropping a connection discards uncommitted quads.
#[async_trait]
pub trait RepositoryConnection: Send {
    async fn add(&mut self, quad: Quad) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}

/// Capabilities the factory needs from an RDF engine.
///
/// Every method returns an un-initialized repository.
#[async_trait]
pub trait RdfEngine: Send + Sync {
    /// Repository `repo` on the service at `url`
    async fn remote(&self, url: &str, repo: &str) -> Result<Box<dyn Repository>>;

    /// Fresh transient in-memory repository
    async fn memory(&self) -> Result<Box<dyn Repository>>;

    /// On-disk repository rooted at `dir`, created if missing
    async fn persistent(&self, dir: &Path) -> Result<Box<dyn Repository>>;
}

/// Engine backed by Oxigraph for local stores and reqwest for remote services
#[derive(Debug, Clone, Default)]
pub struct DefaultEngine {
    options: RepositoryOptions,
}

impl DefaultEngine {
    pub fn new(options: RepositoryOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RdfEngine for DefaultEngine {
    async fn remote(&self, url: &str, repo: &str) -> Result<Box<dyn Repository>> {
        Ok(Box::new(RemoteRepository::new(url, repo, &self.options)?))
    }

    async fn memory(&self) -> Result<Box<dyn Repository>> {
        Ok(Box::new(OxigraphRepository::in_memory()?))
    }

    async fn persistent(&self, dir: &Path) -> Result<Box<dyn Repository>> {
        tokio::fs::create_dir_all(dir).await?;

        let dir = dir.to_path_buf();
        let repository = tokio::task::spawn_blocking(move || OxigraphRepository::open(&dir))
            .await
            .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))??;

        Ok(Box::new(repository))
    }
}
