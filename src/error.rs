use empire_repository::{DataSourceError, StoreError};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub(crate) enum AppError {
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Repository error: {0}")]
    Store(#[from] StoreError),
}
