//! Index error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while registering, indexing or searching.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Field selection body is not a JSON object
    #[error("Error parsing request body: {0}")]
    RequestParse(#[source] serde_json::Error),

    /// The build pipeline could not be created
    #[error("Failed to create index at {}: {reason}", .path.display())]
    BuildInit { path: PathBuf, reason: String },

    /// A document could not be written
    #[error("Failed to index document {id}: {reason}")]
    Write { id: String, reason: String },

    /// Query execution failed
    #[error("Search error: {0}")]
    Search(String),

    /// Index not found
    #[error("Index not found at path: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// Two structural types resolved to the same document type name
    #[error("Document type {doc_type} is already registered for {existing}, cannot register {incoming}")]
    TypeCollision {
        doc_type: String,
        existing: String,
        incoming: String,
    },

    /// Document type name unusable as a field namespace
    #[error("Invalid document type name {0:?}")]
    InvalidTypeName(String),

    /// Registration after the build pipeline was created
    #[error("Cannot register {0}: the index schema is frozen once writing starts")]
    SchemaFrozen(String),

    /// Stored schema does not look like a docsearch index
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
