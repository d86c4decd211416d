//! Bulk loading of RDF files into a repository connection.

use std::{
    ffi::OsStr,
    io::BufReader,
    path::{Path, PathBuf},
};

use oxigraph::{
    io::{RdfFormat, RdfParseError, RdfParser},
    model::{GraphName, NamedOrBlankNode, Quad},
};
use tokio::sync::mpsc;

use crate::{
    backend::RepositoryConnection,
    error::{IngestError, Result},
};

/// Parsed statements buffered between the parser thread and the writer
const PARSE_BUFFER: usize = 1024;

/// Writes parsed statements into one open connection.
///
/// Every statement is stored as a quad whose context is its own subject. Any
/// graph name carried by the source format is dropped.
pub struct StatementLoader<'a> {
    connection: &'a mut dyn RepositoryConnection,
    statements: usize,
}

impl<'a> StatementLoader<'a> {
    pub fn new(connection: &'a mut dyn RepositoryConnection) -> Self {
        Self {
            connection,
            statements: 0,
        }
    }

    /// Statements written so far
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub async fn handle_statement(&mut self, statement: Quad) -> Result<()> {
        let context = subject_context(&statement.subject);
        let quad = Quad::new(
            statement.subject,
            statement.predicate,
            statement.object,
            context,
        );

        self.connection.add(quad).await?;
        self.statements += 1;
        Ok(())
    }

    /// Parse one file and write its statements. Returns how many were written.
    ///
    /// Stops at the first read, parse or write failure.
    pub async fn load_file(&mut self, path: &Path) -> std::result::Result<usize, IngestError> {
        let format = detect_format(path).ok_or_else(|| IngestError::UnknownFormat {
            path: path.to_path_buf(),
        })?;

        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file.into_std().await,
            Err(source) => {
                return Err(IngestError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let (tx, mut rx) = mpsc::channel::<std::result::Result<Quad, RdfParseError>>(PARSE_BUFFER);
        let parser = tokio::task::spawn_blocking(move || {
            for parsed in RdfParser::from_format(format).for_reader(BufReader::new(file)) {
                let failed = parsed.is_err();
                // Receiver gone: the writer stopped on an error
                if tx.blocking_send(parsed).is_err() || failed {
                    break;
                }
            }
        });

        let before = self.statements;
        while let Some(parsed) = rx.recv().await {
            let statement = parsed.map_err(|source| IngestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

            self.handle_statement(statement)
                .await
                .map_err(|source| IngestError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        parser.await.map_err(|e| IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(format!("Parser task failed: {e}")),
        })?;

        let loaded = self.statements - before;
        tracing::debug!(
            path = %path.display(),
            format = format.name(),
            statements = loaded,
            "Loaded RDF file"
        );
        Ok(loaded)
    }
}

/// Load `files` in order through one connection and commit once at the end.
///
/// Nothing is committed if any file fails.
pub async fn bulk_load(
    connection: &mut dyn RepositoryConnection,
    files: &[PathBuf],
) -> std::result::Result<usize, IngestError> {
    let statements = {
        let mut loader = StatementLoader::new(connection);
        for file in files {
            loader.load_file(file).await?;
        }
        loader.statements()
    };

    connection.commit().await.map_err(IngestError::Commit)?;

    Ok(statements)
}

/// RDF serialization guessed from the file extension
///
/// Ontology extensions (`owl`, `rdfs`) are read as RDF/XML.
pub fn detect_format(path: &Path) -> Option<RdfFormat> {
    let extension = path.extension().and_then(OsStr::to_str)?.to_ascii_lowercase();
    match extension.as_str() {
        "rdf" | "rdfs" | "owl" | "xml" => Some(RdfFormat::RdfXml),
        other => RdfFormat::from_extension(other),
    }
}

/// Graph name a statement is filed under: its own subject
pub fn subject_context(subject: &NamedOrBlankNode) -> GraphName {
    match subject {
        NamedOrBlankNode::NamedNode(node) => GraphName::NamedNode(node.clone()),
        NamedOrBlankNode::BlankNode(node) => GraphName::BlankNode(node.clone()),
    }
}
