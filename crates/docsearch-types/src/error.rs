//! Error types for docsearch shared types.

use thiserror::Error;

/// Errors raised while loading configuration or descriptor tables.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A type definition file could not be parsed
    #[error("Invalid type definitions: {0}")]
    InvalidDescriptor(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
