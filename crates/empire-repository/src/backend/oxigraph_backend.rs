use std::{path::Path, time::Duration};

use async_trait::async_trait;
use oxigraph::{
    model::Quad,
    sparql::{QueryResults, SparqlEvaluator},
    store::Store,
};

use super::{Repository, RepositoryConnection};
use crate::error::{Result, StoreError};

/// Oxigraph embedded repository
///
/// Backs both the transient in-memory store used for bulk loading and the
/// RocksDB-backed on-disk store.
pub struct OxigraphRepository {
    store: Store,
    name: &'static str,
}

impl OxigraphRepository {
    /// Open (or create) a persistent store rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Store::open(&path)
            .map_err(|e| StoreError::Other(format!("Failed to open Oxigraph store: {}", e)))?;

        tracing::info!(
            path = %path.as_ref().display(),
            "Opened Oxigraph persistent store"
        );

        Ok(Self {
            store,
            name: "oxigraph-disk",
        })
    }

    /// Create a new transient in-memory store
    pub fn in_memory() -> Result<Self> {
        let store = Store::new().map_err(|e| {
            StoreError::Other(format!("Failed to create in-memory Oxigraph store: {}", e))
        })?;

        tracing::debug!("Created in-memory Oxigraph store");

        Ok(Self {
            store,
            name: "oxigraph-memory",
        })
    }

    /// Get direct access to the underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[async_trait]
impl Repository for OxigraphRepository {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(&self) -> Result<()> {
        // Embedded: a trivial query proves the store answers
        let prepared = SparqlEvaluator::new()
            .parse_query("ASK { ?s ?p ?o }")
            .map_err(|e| StoreError::Other(format!("Health check query parse failed: {}", e)))?;

        // Reads RocksDB for the on-disk store
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let result = prepared
                .on_store(&store)
                .execute()
                .map_err(|e| StoreError::Other(format!("Health check query failed: {}", e)))?;

            match result {
                QueryResults::Boolean(_) => Ok(()),
                _ => Err(StoreError::Other(
                    "Health check returned a non-boolean result".to_string(),
                )),
            }
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?
    }

    async fn connection(&self) -> Result<Box<dyn RepositoryConnection>> {
        Ok(Box::new(OxigraphConnection {
            store: self.store.clone(),
            pending: Vec::new(),
        }))
    }

    async fn size(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            store
                .len()
                .map_err(|e| StoreError::Other(format!("Failed to count statements: {}", e)))
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?
    }

    async fn contains(&self, quad: &Quad) -> Result<bool> {
        let store = self.store.clone();
        let quad = quad.clone();
        tokio::task::spawn_blocking(move || {
            store
                .contains(&quad)
                .map_err(|e| StoreError::Other(format!("Failed to look up statement: {}", e)))
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?
    }

    async fn update(&self, query: &str, _timeout: Duration) -> Result<()> {
        let prepared =
            SparqlEvaluator::new()
                .parse_update(query)
                .map_err(|e| StoreError::InvalidQuery {
                    reason: format!("Failed to parse SPARQL UPDATE: {}", e),
                })?;

        // Updates touch RocksDB for the on-disk store
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            prepared
                .on_store(&store)
                .execute()
                .map_err(|e| StoreError::Other(format!("SPARQL UPDATE failed: {}", e)))
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn construct(&self, query: &str, _timeout: Duration) -> Result<String> {
        let prepared =
            SparqlEvaluator::new()
                .parse_query(query)
                .map_err(|e| StoreError::InvalidQuery {
                    reason: format!("Failed to parse SPARQL CONSTRUCT: {}", e),
                })?;

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let result = prepared
                .on_store(&store)
                .execute()
                .map_err(|e| StoreError::Other(format!("SPARQL CONSTRUCT failed: {}", e)))?;

            match result {
                QueryResults::Graph(triples) => {
                    let mut output = Vec::new();
                    for triple_result in triples {
                        let triple = triple_result.map_err(|e| {
                            StoreError::Other(format!("Failed to read triple: {}", e))
                        })?;

                        output.push(format!(
                            "{} {} {} .",
                            triple.subject, triple.predicate, triple.object
                        ));
                    }
                    Ok(output.join("\n"))
                }
                _ => Err(StoreError::Other(
                    "Expected CONSTRUCT to return graph results".to_string(),
                )),
            }
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?
    }

    async fn ask(&self, query: &str, _timeout: Duration) -> Result<bool> {
        let prepared =
            SparqlEvaluator::new()
                .parse_query(query)
                .map_err(|e| StoreError::InvalidQuery {
                    reason: format!("Failed to parse SPARQL ASK: {}", e),
                })?;

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let result = prepared
                .on_store(&store)
                .execute()
                .map_err(|e| StoreError::Other(format!("SPARQL ASK failed: {}", e)))?;

            match result {
                QueryResults::Boolean(value) => Ok(value),
                _ => Err(StoreError::Other(
                    "Expected ASK to return boolean result".to_string(),
                )),
            }
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?
    }
}

/// Buffers quads and writes them in one Oxigraph transaction on commit
struct OxigraphConnection {
    store: Store,
    pending: Vec<Quad>,
}

#[async_trait]
impl RepositoryConnection for OxigraphConnection {
    async fn add(&mut self, quad: Quad) -> Result<()> {
        self.pending.push(quad);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let quads = std::mem::take(&mut self.pending);
        let count = quads.len();
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || {
            store
                .extend(quads)
                .map_err(|e| StoreError::Other(format!("Failed to commit statements: {}", e)))
        })
        .await
        .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))??;

        tracing::debug!(statements = count, "Committed statements to Oxigraph store");
        Ok(())
    }
}
