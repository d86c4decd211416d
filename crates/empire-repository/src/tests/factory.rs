#![allow(clippy::unwrap_used)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use oxigraph::model::{GraphName, NamedOrBlankNode, Quad};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
    ALIAS, DataSourceConfig, DataSourceError, DataSourceFactory, IngestError, RdfEngine,
    Repository, RepositoryConnection, RepositoryDataSourceFactory, RepositoryOptions, StoreError,
    error::Result,
};

/// Shared record of everything the fake engine was asked to do
#[derive(Clone, Default)]
struct Journal {
    calls: Arc<Mutex<Vec<String>>>,
    committed: Arc<Mutex<Vec<Quad>>>,
    commits: Arc<AtomicUsize>,
}

impl Journal {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn committed(&self) -> Vec<Quad> {
        self.committed.lock().unwrap().clone()
    }

    fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
struct RecordingEngine {
    journal: Journal,
    fail_initialize: bool,
}

impl RecordingEngine {
    fn repository(&self, name: &'static str) -> Box<dyn Repository> {
        Box::new(RecordingRepository {
            name,
            journal: self.journal.clone(),
            fail_initialize: self.fail_initialize,
        })
    }
}

#[async_trait]
impl RdfEngine for RecordingEngine {
    async fn remote(&self, url: &str, repo: &str) -> Result<Box<dyn Repository>> {
        self.journal.record(format!("remote {url} {repo}"));
        Ok(self.repository("fake-remote"))
    }

    async fn memory(&self) -> Result<Box<dyn Repository>> {
        self.journal.record("memory");
        Ok(self.repository("fake-memory"))
    }

    async fn persistent(&self, dir: &Path) -> Result<Box<dyn Repository>> {
        self.journal.record(format!("persistent {}", dir.display()));
        Ok(self.repository("fake-persistent"))
    }
}

struct RecordingRepository {
    name: &'static str,
    journal: Journal,
    fail_initialize: bool,
}

#[async_trait]
impl Repository for RecordingRepository {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(&self) -> Result<()> {
        self.journal.record(format!("initialize {}", self.name));
        if self.fail_initialize {
            return Err(StoreError::RepositoryNotFound {
                name: "myrepo".to_string(),
            });
        }
        Ok(())
    }

    async fn connection(&self) -> Result<Box<dyn RepositoryConnection>> {
        self.journal.record("connection");
        Ok(Box::new(RecordingConnection {
            journal: self.journal.clone(),
            pending: Vec::new(),
        }))
    }

    async fn size(&self) -> Result<usize> {
        Ok(self.journal.committed().len())
    }

    async fn contains(&self, quad: &Quad) -> Result<bool> {
        Ok(self.journal.committed().contains(quad))
    }

    async fn update(&self, _query: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn construct(&self, _query: &str, _timeout: Duration) -> Result<String> {
        Ok(String::new())
    }

    async fn ask(&self, _query: &str, _timeout: Duration) -> Result<bool> {
        Ok(false)
    }
}

struct RecordingConnection {
    journal: Journal,
    pending: Vec<Quad>,
}

#[async_trait]
impl RepositoryConnection for RecordingConnection {
    async fn add(&mut self, quad: Quad) -> Result<()> {
        self.pending.push(quad);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.journal
            .committed
            .lock()
            .unwrap()
            .append(&mut self.pending);
        self.journal.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config(pairs: &[(&str, Value)]) -> DataSourceConfig {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn factory(engine: &RecordingEngine) -> RepositoryDataSourceFactory<RecordingEngine> {
    RepositoryDataSourceFactory::with_engine(engine.clone(), RepositoryOptions::default())
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn files_value(paths: &[&PathBuf]) -> Value {
    let joined = paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(",");
    json!(joined)
}

#[test]
fn alias_is_sesame() {
    let engine = RecordingEngine::default();
    assert_eq!(factory(&engine).alias(), "sesame");
    assert_eq!(ALIAS, "sesame");
}

#[tokio::test]
async fn insufficient_config_is_rejected_without_touching_engine() {
    let engine = RecordingEngine::default();
    let factory = factory(&engine);

    for map in [
        config(&[]),
        config(&[("url", json!("http://host/rdf"))]),
        config(&[("repo", json!("myrepo"))]),
        config(&[("unrelated", json!("value")), ("dir", Value::Null)]),
    ] {
        assert!(!factory.can_create(&map));

        let error = factory.create(&map).await.unwrap_err();
        assert!(matches!(error, DataSourceError::InvalidConfiguration(_)));
    }

    assert!(engine.journal.calls().is_empty());
}

#[tokio::test]
async fn invalid_configuration_renders_the_map() {
    let engine = RecordingEngine::default();
    let map = config(&[("repo", json!("lonely"))]);

    let error = factory(&engine).create(&map).await.unwrap_err();

    assert!(error.to_string().contains("lonely"));
}

#[test]
fn can_create_is_idempotent() {
    let engine = RecordingEngine::default();
    let factory = factory(&engine);
    let valid = config(&[("dir", json!("/tmp/store"))]);
    let invalid = config(&[("url", json!("http://host/rdf"))]);

    for _ in 0..3 {
        assert!(factory.can_create(&valid));
        assert!(!factory.can_create(&invalid));
    }
    assert!(engine.journal.calls().is_empty());
}

#[tokio::test]
async fn remote_selection_does_no_local_access() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("never-created");
    let engine = RecordingEngine::default();
    let map = config(&[
        ("url", json!("http://host/rdf")),
        ("repo", json!("myrepo")),
        ("files", json!("/nonexistent/a.ttl")),
        ("dir", json!(dir.display().to_string())),
    ]);

    let source = factory(&engine).create(&map).await.unwrap();

    assert_eq!(source.backend_name(), "fake-remote");
    assert_eq!(
        engine.journal.calls(),
        vec!["remote http://host/rdf myrepo", "initialize fake-remote"]
    );
    assert!(!dir.exists());
}

#[tokio::test]
async fn bulk_load_commits_union_once() {
    let temp_dir = TempDir::new().unwrap();
    let turtle = write(
        &temp_dir,
        "a.ttl",
        "@prefix ex: <http://example.org/> .\n\
         ex:s1 ex:p \"one\" .\n\
         ex:s2 ex:p \"two\" .\n",
    );
    let ntriples = write(
        &temp_dir,
        "b.nt",
        "<http://example.org/s3> <http://example.org/p> \"three\" .\n",
    );
    let engine = RecordingEngine::default();
    let map = config(&[("files", files_value(&[&turtle, &ntriples]))]);

    let source = factory(&engine).create(&map).await.unwrap();

    assert_eq!(source.backend_name(), "fake-memory");
    assert_eq!(
        engine.journal.calls(),
        vec!["memory", "initialize fake-memory", "connection"]
    );
    assert_eq!(engine.journal.commits(), 1);

    let committed = engine.journal.committed();
    assert_eq!(committed.len(), 3);
    for quad in &committed {
        let NamedOrBlankNode::NamedNode(subject) = &quad.subject else {
            panic!("Expected named subject, got {}", quad.subject);
        };
        assert_eq!(quad.graph_name, GraphName::NamedNode(subject.clone()));
    }
    assert!(committed.contains(&super::subject_quad("http://example.org/s3", "three")));
    assert_eq!(source.size().await.unwrap(), 3);
}

#[tokio::test]
async fn missing_file_fails_without_commit() {
    let temp_dir = TempDir::new().unwrap();
    let present = write(
        &temp_dir,
        "present.nt",
        "<http://example.org/s> <http://example.org/p> \"o\" .\n",
    );
    let missing = temp_dir.path().join("missing.ttl");
    let engine = RecordingEngine::default();
    let map = config(&[("files", files_value(&[&present, &missing]))]);

    let error = factory(&engine).create(&map).await.unwrap_err();

    assert!(matches!(
        error,
        DataSourceError::Ingestion(IngestError::Io { ref path, .. }) if *path == missing
    ));
    assert_eq!(engine.journal.commits(), 0);
    assert!(engine.journal.committed().is_empty());
}

#[tokio::test]
async fn files_win_over_dir() {
    let temp_dir = TempDir::new().unwrap();
    let data = write(
        &temp_dir,
        "data.nt",
        "<http://example.org/s> <http://example.org/p> \"o\" .\n",
    );
    let engine = RecordingEngine::default();
    let map = config(&[
        ("files", files_value(&[&data])),
        ("dir", json!(temp_dir.path().join("store").display().to_string())),
    ]);

    factory(&engine).create(&map).await.unwrap();

    assert_eq!(engine.journal.calls()[0], "memory");
}

#[tokio::test]
async fn persistent_selection_opens_dir() {
    let engine = RecordingEngine::default();
    let map = config(&[("dir", json!("/var/lib/store"))]);

    let source = factory(&engine).create(&map).await.unwrap();

    assert_eq!(source.backend_name(), "fake-persistent");
    assert_eq!(
        engine.journal.calls(),
        vec!["persistent /var/lib/store", "initialize fake-persistent"]
    );
}

#[tokio::test]
async fn initialization_failure_names_backend() {
    let engine = RecordingEngine {
        fail_initialize: true,
        ..RecordingEngine::default()
    };
    let map = config(&[("url", json!("http://host/rdf")), ("repo", json!("myrepo"))]);

    let error = factory(&engine).create(&map).await.unwrap_err();

    assert!(matches!(
        error,
        DataSourceError::Initialization {
            backend: "remote",
            source: StoreError::RepositoryNotFound { .. },
        }
    ));
}

#[tokio::test]
async fn bulk_load_initialization_failure_loads_nothing() {
    let engine = RecordingEngine {
        fail_initialize: true,
        ..RecordingEngine::default()
    };
    let map = config(&[("files", json!("/nonexistent/a.ttl"))]);

    let error = factory(&engine).create(&map).await.unwrap_err();

    assert!(matches!(
        error,
        DataSourceError::Initialization {
            backend: "memory",
            ..
        }
    ));
    assert_eq!(
        engine.journal.calls(),
        vec!["memory", "initialize fake-memory"]
    );
}
