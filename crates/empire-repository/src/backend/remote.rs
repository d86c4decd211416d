use std::time::Duration;

use async_trait::async_trait;
use oxigraph::{
    io::{RdfFormat, RdfSerializer},
    model::{GraphName, Quad},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::{Repository, RepositoryConnection};
use crate::{
    config::RepositoryOptions,
    error::{Result, StoreError},
};

/// Repository hosted by a Sesame 2 / RDF4J server, spoken to over its REST protocol
#[derive(Clone)]
pub struct RemoteRepository {
    client: Client,
    url: String,
    repo: String,
    options: RepositoryOptions,
}

impl RemoteRepository {
    pub fn new(url: &str, repo: &str, options: &RepositoryOptions) -> Result<Self> {
        let client = Client::builder()
            // Connection pooling: keep up to 10 idle connections per host
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(options.timeouts.connect_timeout())
            // Default request timeout (overridden per-request)
            .timeout(options.timeouts.query_timeout())
            .build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            options: options.clone(),
        })
    }

    /// Protocol version endpoint, used as a liveness probe
    pub fn protocol_endpoint(&self) -> String {
        format!("{}/protocol", self.url)
    }

    /// Query endpoint of the repository
    pub fn repository_endpoint(&self) -> String {
        format!("{}/repositories/{}", self.url, self.repo)
    }

    pub fn statements_endpoint(&self) -> String {
        format!("{}/statements", self.repository_endpoint())
    }

    pub fn size_endpoint(&self) -> String {
        format!("{}/size", self.repository_endpoint())
    }

    fn auth_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        match (&self.options.username, &self.options.password) {
            (Some(user), Some(pass)) => builder.basic_auth(user, Some(pass)),
            _ => builder,
        }
    }

    /// Statement count, or `None` if the service does not know the repository
    async fn repository_size(&self) -> Result<Option<usize>> {
        let response = self
            .auth_headers(self.client.get(self.size_endpoint()))
            .timeout(self.options.timeouts.connect_timeout())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = success_body(response).await?;
        body.trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| StoreError::ParseError {
                reason: format!("Invalid repository size '{}': {e}", body.trim()),
            })
    }

    async fn post_statements(&self, body: Vec<u8>, timeout: Duration) -> Result<()> {
        let response = self
            .auth_headers(self.client.post(self.statements_endpoint()))
            .header("Content-Type", "application/n-quads")
            .timeout(timeout)
            .body(body)
            .send()
            .await?;

        success_body(response).await.map(|_| ())
    }

    async fn query(&self, query: &str, accept: &str, timeout: Duration) -> Result<String> {
        let response = self
            .auth_headers(self.client.post(self.repository_endpoint()))
            .header("Content-Type", "application/sparql-query")
            .header("Accept", accept)
            .timeout(timeout)
            .body(query.to_string())
            .send()
            .await?;

        success_body(response).await
    }
}

#[async_trait]
impl Repository for RemoteRepository {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn initialize(&self) -> Result<()> {
        let response = self
            .auth_headers(self.client.get(self.protocol_endpoint()))
            .timeout(self.options.timeouts.connect_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Unreachable {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let Some(size) = self.repository_size().await? else {
            return Err(StoreError::RepositoryNotFound {
                name: self.repo.clone(),
            });
        };

        tracing::info!(
            url = %self.url,
            repository = %self.repo,
            statements = size,
            "Connected to remote repository"
        );
        Ok(())
    }

    async fn connection(&self) -> Result<Box<dyn RepositoryConnection>> {
        Ok(Box::new(RemoteConnection {
            repository: self.clone(),
            pending: Vec::new(),
        }))
    }

    async fn size(&self) -> Result<usize> {
        self.repository_size()
            .await?
            .ok_or_else(|| StoreError::RepositoryNotFound {
                name: self.repo.clone(),
            })
    }

    async fn contains(&self, quad: &Quad) -> Result<bool> {
        self.ask(&contains_query(quad), self.options.timeouts.ask_timeout())
            .await
    }

    async fn update(&self, query: &str, timeout: Duration) -> Result<()> {
        let response = self
            .auth_headers(self.client.post(self.statements_endpoint()))
            .header("Content-Type", "application/sparql-update")
            .timeout(timeout)
            .body(query.to_string())
            .send()
            .await?;

        success_body(response).await.map(|_| ())
    }

    async fn construct(&self, query: &str, timeout: Duration) -> Result<String> {
        self.query(query, "application/n-triples", timeout).await
    }

    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool> {
        let body = self
            .query(query, "application/sparql-results+json", timeout)
            .await?;
        parse_ask_json(&body)
    }
}

/// Uploads buffered quads as a single N-Quads request on commit
struct RemoteConnection {
    repository: RemoteRepository,
    pending: Vec<Quad>,
}

#[async_trait]
impl RepositoryConnection for RemoteConnection {
    async fn add(&mut self, quad: Quad) -> Result<()> {
        self.pending.push(quad);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let body = serialize_nquads(&self.pending)?;
        self.repository
            .post_statements(body, self.repository.options.timeouts.update_timeout())
            .await?;

        tracing::debug!(
            repository = %self.repository.repo,
            statements = self.pending.len(),
            "Committed statements to remote repository"
        );
        self.pending.clear();
        Ok(())
    }
}

async fn success_body(response: Response) -> Result<String> {
    if response.status().is_success() {
        Ok(response.text().await?)
    } else {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Backend { status, message })
    }
}

fn serialize_nquads(quads: &[Quad]) -> Result<Vec<u8>> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::NQuads).for_writer(Vec::new());
    for quad in quads {
        serializer.serialize_quad(quad)?;
    }
    Ok(serializer.finish()?)
}

fn contains_query(quad: &Quad) -> String {
    let pattern = format!("{} {} {} .", quad.subject, quad.predicate, quad.object);
    match &quad.graph_name {
        GraphName::NamedNode(graph) => format!("ASK {{ GRAPH {graph} {{ {pattern} }} }}"),
        // Blank node labels are not valid graph references in SPARQL
        GraphName::BlankNode(_) => format!("ASK {{ GRAPH ?g {{ {pattern} }} }}"),
        GraphName::DefaultGraph => format!("ASK {{ {pattern} }}"),
    }
}

#[derive(Deserialize)]
struct SparqlAskResponse {
    boolean: bool,
}

fn parse_ask_json(json: &str) -> Result<bool> {
    let response: SparqlAskResponse =
        serde_json::from_str(json).map_err(|e| StoreError::ParseError {
            reason: format!("Failed to parse ASK response: {e}"),
        })?;

    Ok(response.boolean)
}
