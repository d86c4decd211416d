use std::{future::Future, sync::Arc, time::Instant};

use oxigraph::model::Quad;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{
    backend::{Repository, RepositoryConnection},
    config::{RepositoryOptions, TimeoutConfig},
    error::{Result, StoreError},
    metrics,
};

/// Initialized repository handed out by a data source factory
///
/// Calls into the repository are bounded by a concurrency limiter and
/// recorded as backend operation metrics.
pub struct RepositoryDataSource {
    repository: Box<dyn Repository>,
    timeouts: TimeoutConfig,
    max_concurrent_operations: usize,
    /// Semaphore for limiting concurrent operations
    concurrency_limiter: Arc<Semaphore>,
}

impl std::fmt::Debug for RepositoryDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryDataSource")
            .field("backend", &self.repository.name())
            .field("max_concurrent_operations", &self.max_concurrent_operations)
            .finish()
    }
}

impl RepositoryDataSource {
    /// Wrap an already initialized repository
    pub fn new(repository: Box<dyn Repository>, options: &RepositoryOptions) -> Self {
        let max_concurrent = options.max_concurrent_operations.max(1);
        if max_concurrent != options.max_concurrent_operations {
            tracing::warn!(
                configured = options.max_concurrent_operations,
                effective = max_concurrent,
                "Repository max_concurrent_operations too low; clamped"
            );
        }
        tracing::debug!(
            backend = %repository.name(),
            max_concurrent = max_concurrent,
            "Repository concurrency limiter initialized"
        );

        Self {
            repository,
            timeouts: options.timeouts.clone(),
            max_concurrent_operations: max_concurrent,
            concurrency_limiter: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Name of the backend serving this data source
    pub fn backend_name(&self) -> &'static str {
        self.repository.name()
    }

    /// Direct access to the underlying repository, bypassing the limiter
    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    /// Give up the wrapper and take the repository
    pub fn into_repository(self) -> Box<dyn Repository> {
        self.repository
    }

    /// Effective concurrency limit used by the internal semaphore.
    pub fn max_concurrent_operations(&self) -> usize {
        self.max_concurrent_operations
    }

    fn record_permit_snapshot(&self) {
        metrics::record_permit_snapshot(
            self.backend_name(),
            self.max_concurrent_operations,
            self.concurrency_limiter.available_permits(),
        );
    }

    async fn acquire_permit(&self, op: &str) -> Result<OwnedSemaphorePermit> {
        let wait_started = Instant::now();
        let permit = self
            .concurrency_limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreError::SemaphoreClosed)?;
        metrics::record_permit_wait(self.backend_name(), op, wait_started.elapsed());
        self.record_permit_snapshot();
        Ok(permit)
    }

    /// Run one repository call under a permit and record its outcome
    async fn limited<T, F>(&self, op: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let backend = self.backend_name();
        let started = Instant::now();

        let permit = match self.acquire_permit(op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = call.await;
        drop(permit);
        self.record_permit_snapshot();
        metrics::record_backend_operation(backend, op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Number of statements in the repository
    pub async fn size(&self) -> Result<usize> {
        self.limited("size", self.repository.size()).await
    }

    /// Check whether the quad is stored
    pub async fn contains(&self, quad: &Quad) -> Result<bool> {
        self.limited("contains", self.repository.contains(quad))
            .await
    }

    /// Execute a SPARQL UPDATE with the configured update timeout
    pub async fn update(&self, query: &str) -> Result<()> {
        let timeout = self.timeouts.update_timeout();
        self.limited("update", self.repository.update(query, timeout))
            .await
    }

    /// Execute a SPARQL CONSTRUCT with the configured query timeout
    pub async fn construct(&self, query: &str) -> Result<String> {
        let timeout = self.timeouts.query_timeout();
        self.limited("construct", self.repository.construct(query, timeout))
            .await
    }

    /// Execute a SPARQL ASK with the configured ask timeout
    pub async fn ask(&self, query: &str) -> Result<bool> {
        let timeout = self.timeouts.ask_timeout();
        self.limited("ask", self.repository.ask(query, timeout))
            .await
    }

    /// Open a write connection
    pub async fn connection(&self) -> Result<Box<dyn RepositoryConnection>> {
        self.limited("connection", self.repository.connection())
            .await
    }
}
