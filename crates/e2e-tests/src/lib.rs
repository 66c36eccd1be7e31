//! End-to-end test infrastructure for docsearch.
//!
//! Provides a shared TestHarness, sample document types and helpers for E2E
//! tests covering the register -> write -> close -> open -> search pipeline.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use docsearch_index::{DocumentSearcher, IndexConfig, IndexRegistrar};
use docsearch_service::run_server_with_shutdown;
use docsearch_types::{Describe, FieldDescriptor};

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Path of the finalized index
    pub index_path: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with a temp directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_path = temp_dir.path().join("index");
        Self {
            _temp_dir: temp_dir,
            index_path,
        }
    }

    /// Index configuration pointing at the harness index path.
    pub fn config(&self) -> IndexConfig {
        IndexConfig::new(&self.index_path)
    }

    /// A registrar with every sample type registered.
    pub fn registrar(&self) -> IndexRegistrar {
        let mut registrar = IndexRegistrar::new(self.config());
        registrar
            .register(&Article::default())
            .expect("Failed to register Article");
        registrar
            .register(&Note::default())
            .expect("Failed to register Note");
        registrar
    }

    /// Build the index from the sample articles and notes.
    pub fn build_sample_index(&self) -> u64 {
        let mut registrar = self.registrar();
        for (id, article) in sample_articles() {
            registrar.write(id, &article).expect("Failed to write article");
        }
        for (id, note) in sample_notes() {
            registrar.write(id, &note).expect("Failed to write note");
        }
        registrar.close().expect("Failed to close registrar")
    }

    /// Open the finalized index.
    pub fn searcher(&self) -> DocumentSearcher {
        DocumentSearcher::open(&self.index_path).expect("Failed to open index")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Author {
    pub name: String,
}

impl Describe for Author {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::text("name")]
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    pub title: String,
    pub published: String,
    pub author: Author,
}

impl Describe for Metadata {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::text("title"),
            FieldDescriptor::date("published"),
            FieldDescriptor::nested("author", &self.author),
        ]
    }
}

/// Sample article: every annotation, nested metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Article {
    pub path: String,
    pub body: String,
    pub secret: String,
    pub draft: bool,
    pub metadata: Metadata,
}

impl Describe for Article {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::no_index("path"),
            FieldDescriptor::text("body"),
            FieldDescriptor::no_store("secret"),
            FieldDescriptor::other("draft", "bool"),
            FieldDescriptor::nested("metadata", &self.metadata),
        ]
    }

    fn doc_type(&self) -> Option<String> {
        Some("article".to_string())
    }
}

/// Sample note analyzed in French.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Note {
    pub text: String,
}

impl Describe for Note {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::text("text")]
    }

    fn language(&self) -> Option<String> {
        Some("fr".to_string())
    }
}

pub fn article(path: &str, title: &str, author: &str, body: &str, published: &str) -> Article {
    Article {
        path: path.to_string(),
        body: body.to_string(),
        secret: "hunter2".to_string(),
        draft: false,
        metadata: Metadata {
            title: title.to_string(),
            published: published.to_string(),
            author: Author {
                name: author.to_string(),
            },
        },
    }
}

/// Articles used by the sample index, keyed by id.
pub fn sample_articles() -> Vec<(&'static str, Article)> {
    vec![
        (
            "rust",
            article(
                "/posts/rust",
                "Ownership in Rust",
                "John Doe",
                "The borrow checker tracks ownership of every value",
                "2024-01-29",
            ),
        ),
        (
            "python",
            article(
                "/posts/python",
                "Python web frameworks",
                "Jane Roe",
                "Django and Flask provide rapid development for web apps",
                "2023-06-15",
            ),
        ),
        (
            "sql",
            article(
                "/posts/sql",
                "Query planning",
                "John Smith",
                "Indexing and execution plans drive query performance",
                "2022-11-02T08:30:00Z",
            ),
        ),
    ]
}

/// Notes used by the sample index, keyed by id.
pub fn sample_notes() -> Vec<(&'static str, Note)> {
    vec![(
        "note-1",
        Note {
            text: "Les chats mangent des souris".to_string(),
        },
    )]
}

/// A running HTTP server over an index.
pub struct ServerHandle {
    pub base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
}

impl ServerHandle {
    /// Start the server on `port` and wait until it accepts requests.
    pub async fn start(searcher: DocumentSearcher, port: u16) -> Self {
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            run_server_with_shutdown(addr, Arc::new(searcher), 10, async {
                shutdown_rx.await.ok();
            })
            .await
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(200)).await;

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle
            .await
            .expect("Server task panicked")
            .expect("Server returned an error");
    }
}
