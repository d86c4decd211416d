use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::error::{DataSourceError, IngestError, StoreError};

pub(crate) fn record_backend_operation(
    backend: &str,
    op: &str,
    error: Option<&StoreError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_error);

    counter!(
        "repository_backend_operations_total",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status,
        "error_class" => error_class
    )
    .increment(1);
    histogram!(
        "repository_backend_operation_duration_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status
    )
    .record(duration.as_secs_f64());
}

pub(crate) fn record_permit_wait(backend: &str, op: &str, wait: Duration) {
    histogram!(
        "repository_backend_permit_wait_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .record(wait.as_secs_f64());
}

pub(crate) fn record_permit_snapshot(backend: &str, max: usize, available: usize) {
    gauge!(
        "repository_backend_permits_in_use",
        "backend" => backend.to_string()
    )
    .set(max.saturating_sub(available) as f64);
}

pub(crate) fn record_create(backend: &str, error: Option<&DataSourceError>, duration: Duration) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_create_error);

    counter!(
        "repository_data_source_create_total",
        "backend" => backend.to_string(),
        "status" => status,
        "error_class" => error_class
    )
    .increment(1);
    histogram!(
        "repository_data_source_create_duration_seconds",
        "backend" => backend.to_string(),
        "status" => status
    )
    .record(duration.as_secs_f64());
}

pub(crate) fn record_bulk_load(
    files: usize,
    statements: usize,
    error: Option<&IngestError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };

    counter!("repository_bulk_load_total", "status" => status).increment(1);
    counter!("repository_bulk_load_files_total", "status" => status).increment(files as u64);
    histogram!(
        "repository_bulk_load_duration_seconds",
        "status" => status,
        "statements" => statements_bucket(statements)
    )
    .record(duration.as_secs_f64());

    if error.is_none() {
        counter!("repository_bulk_load_statements_total").increment(statements as u64);
    }
}

fn classify_error(error: &StoreError) -> &'static str {
    match error {
        StoreError::SemaphoreClosed => "semaphore_closed",
        StoreError::Http(_) => "http",
        StoreError::Io(_) => "io",
        StoreError::Backend { status, .. } if *status >= 500 => "backend_5xx",
        StoreError::Backend { status, .. } if *status >= 400 => "backend_4xx",
        StoreError::Backend { .. } => "backend_other",
        StoreError::Unreachable { .. } => "unreachable",
        StoreError::RepositoryNotFound { .. } => "repository_not_found",
        StoreError::ParseError { .. } => "parse_error",
        StoreError::InvalidQuery { .. } => "invalid_query",
        StoreError::Other(_) => "other",
    }
}

fn classify_create_error(error: &DataSourceError) -> &'static str {
    match error {
        DataSourceError::InvalidConfiguration(_) => "invalid_configuration",
        DataSourceError::Initialization { source, .. } => classify_error(source),
        DataSourceError::Ingestion(IngestError::Io { .. }) => "ingest_io",
        DataSourceError::Ingestion(IngestError::UnknownFormat { .. }) => "ingest_unknown_format",
        DataSourceError::Ingestion(IngestError::Parse { .. }) => "ingest_parse",
        DataSourceError::Ingestion(IngestError::Write { .. }) => "ingest_write",
        DataSourceError::Ingestion(IngestError::Commit(_)) => "ingest_commit",
    }
}

fn statements_bucket(statements: usize) -> &'static str {
    match statements {
        0..=1_000 => "<=1k",
        1_001..=100_000 => "1k-100k",
        100_001..=1_000_000 => "100k-1M",
        _ => ">1M",
    }
}
