#![allow(clippy::unwrap_used)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;

use super::subject_quad;
use crate::{
    DataSourceConfig, DataSourceError, DataSourceFactory, RepositoryDataSourceFactory,
    RepositoryOptions, StoreError,
};

const KNOWN_REPOSITORY: &str = "myrepo";

/// Minimal Sesame service: one repository, statement uploads recorded
#[derive(Clone, Default)]
struct FakeService {
    uploads: Arc<Mutex<Vec<(String, String)>>>,
}

async fn protocol() -> &'static str {
    "6"
}

async fn size(Path(repo): Path<String>) -> Result<&'static str, StatusCode> {
    if repo == KNOWN_REPOSITORY {
        Ok("42")
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn query(Path(_repo): Path<String>) -> ([(&'static str, &'static str); 1], String) {
    (
        [("content-type", "application/sparql-results+json")],
        json!({ "head": {}, "boolean": true }).to_string(),
    )
}

async fn statements(
    State(service): State<FakeService>,
    Path(_repo): Path<String>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    service.uploads.lock().unwrap().push((content_type, body));
    StatusCode::NO_CONTENT
}

async fn spawn_service(with_protocol: bool) -> (SocketAddr, FakeService) {
    let service = FakeService::default();
    let mut router = Router::new()
        .route("/repositories/{repo}/size", get(size))
        .route("/repositories/{repo}", post(query))
        .route("/repositories/{repo}/statements", post(statements));
    if with_protocol {
        router = router.route("/protocol", get(protocol));
    }
    let router = router.with_state(service.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, service)
}

fn remote_config(addr: SocketAddr, repo: &str) -> DataSourceConfig {
    DataSourceConfig::from([
        ("url".to_string(), json!(format!("http://{addr}/"))),
        ("repo".to_string(), json!(repo)),
    ])
}

fn factory() -> RepositoryDataSourceFactory {
    RepositoryDataSourceFactory::new(RepositoryOptions::default())
}

#[tokio::test]
async fn connects_to_existing_repository() {
    let (addr, _service) = spawn_service(true).await;

    let source = factory()
        .create(&remote_config(addr, KNOWN_REPOSITORY))
        .await
        .unwrap();

    assert_eq!(source.backend_name(), "remote");
    assert_eq!(source.size().await.unwrap(), 42);
    assert!(source.ask("ASK { ?s ?p ?o }").await.unwrap());
}

#[tokio::test]
async fn missing_repository_fails_initialization() {
    let (addr, _service) = spawn_service(true).await;

    let error = factory()
        .create(&remote_config(addr, "unknown"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DataSourceError::Initialization {
            backend: "remote",
            source: StoreError::RepositoryNotFound { ref name },
        } if name == "unknown"
    ));
}

#[tokio::test]
async fn unhealthy_service_is_unreachable() {
    let (addr, _service) = spawn_service(false).await;

    let error = factory()
        .create(&remote_config(addr, KNOWN_REPOSITORY))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DataSourceError::Initialization {
            source: StoreError::Unreachable { status: 404, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn commit_uploads_nquads() {
    let (addr, service) = spawn_service(true).await;
    let source = factory()
        .create(&remote_config(addr, KNOWN_REPOSITORY))
        .await
        .unwrap();

    let mut connection = source.connection().await.unwrap();
    connection
        .add(subject_quad("http://example.org/s1", "one"))
        .await
        .unwrap();
    assert!(service.uploads.lock().unwrap().is_empty());
    connection.commit().await.unwrap();

    let uploads = service.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let (content_type, body) = &uploads[0];
    assert_eq!(content_type, "application/n-quads");
    assert_eq!(
        body.trim_end(),
        "<http://example.org/s1> <http://example.org/p> \"one\" <http://example.org/s1> ."
    );
}

#[tokio::test]
async fn update_posts_sparql_update() {
    let (addr, service) = spawn_service(true).await;
    let source = factory()
        .create(&remote_config(addr, KNOWN_REPOSITORY))
        .await
        .unwrap();

    source.update("CLEAR ALL").await.unwrap();

    let uploads = service.uploads.lock().unwrap().clone();
    assert_eq!(
        uploads,
        vec![(
            "application/sparql-update".to_string(),
            "CLEAR ALL".to_string()
        )]
    );
}
