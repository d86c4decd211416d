use std::path::PathBuf;

use oxigraph::io::RdfParseError;
use thiserror::Error;

/// Repository backend errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Semaphore closed
    #[error("Semaphore closed")]
    SemaphoreClosed,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository service returned an error response
    #[error("Repository error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Repository service did not answer its protocol endpoint successfully
    #[error("Repository service at {url} is unreachable (status {status})")]
    Unreachable { url: String, status: u16 },

    /// Named repository does not exist on the service
    #[error("Repository '{name}' not found")]
    RepositoryNotFound { name: String },

    /// Failed to parse response
    #[error("Failed to parse response: {reason}")]
    ParseError { reason: String },

    /// Invalid SPARQL query
    #[error("Invalid SPARQL query: {reason}")]
    InvalidQuery { reason: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Failures while bulk loading RDF files into a connection.
///
/// The loader stops at the first failure, so at most one of these is produced per load.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine RDF format of '{}' from its file name", path.display())]
    UnknownFormat { path: PathBuf },

    #[error("Failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: RdfParseError,
    },

    #[error("Failed to write statement from '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Failed to commit loaded statements: {0}")]
    Commit(#[source] StoreError),
}

/// Error surfaced by data source factories
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Invalid configuration map: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to initialize {backend} repository: {source}")]
    Initialization {
        backend: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to load statements: {0}")]
    Ingestion(#[from] IngestError),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
