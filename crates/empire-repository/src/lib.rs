//! RDF repository data sources.
//!
//! A [`RepositoryDataSourceFactory`] turns a string-keyed configuration map
//! into an initialized [`RepositoryDataSource`] backed by one of:
//! * a repository on a remote Sesame/RDF4J service (`url` + `repo`)
//! * an in-memory Oxigraph store bulk loaded from RDF files (`files`)
//! * an on-disk Oxigraph store (`dir`)
//!
//! Statements loaded from files are filed under a context equal to their own
//! subject.

pub mod backend;
pub mod config;
mod data_source;
pub mod error;
mod factory;
pub mod ingest;
mod metrics;

#[cfg(test)]
mod tests;

pub use backend::{
    DefaultEngine, OxigraphRepository, RdfEngine, RemoteRepository, Repository,
    RepositoryConnection,
};
pub use config::{
    BackendSelection, DIR, DataSourceConfig, FILES, REPO, RepositoryOptions, TimeoutConfig, URL,
};
pub use data_source::RepositoryDataSource;
pub use error::{DataSourceError, IngestError, StoreError};
pub use factory::{ALIAS, DataSourceFactory, RepositoryDataSourceFactory};
pub use ingest::{StatementLoader, bulk_load};
