//! Tantivy index management.
//!
//! Handles index configuration, creation in a scratch directory and opening
//! of finalized indexes.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, ReloadPolicy};
use tracing::{debug, info};

use crate::analysis::register_analyzers;
use crate::error::IndexError;
use crate::schema::IndexSchema;

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Default analysis language
const DEFAULT_LANGUAGE: &str = "en";

/// Suffix of the scratch directory an index is built in.
const BUILD_SUFFIX: &str = ".build";

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Path of the finalized index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
    /// Language for types that report none
    pub default_language: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./index"),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl IndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            ..Self::default()
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Scratch directory the index is written to before finalization.
    pub fn build_path(&self) -> PathBuf {
        let mut name = self.index_path.as_os_str().to_owned();
        name.push(BUILD_SUFFIX);
        PathBuf::from(name)
    }

    /// Writer memory budget in bytes
    pub fn writer_memory_bytes(&self) -> usize {
        self.writer_memory_mb * 1024 * 1024
    }
}

/// Check if an index exists at the given path
pub fn index_exists(path: &Path) -> bool {
    path.join("meta.json").exists()
}

/// Create a new index in `path` with the compiled schema.
///
/// Any stale content of `path` is removed first.
pub fn create_index(path: &Path, schema: &IndexSchema) -> Result<Index, IndexError> {
    if path.exists() {
        debug!(path = ?path, "Removing stale build directory");
        std::fs::remove_dir_all(path)?;
    }
    std::fs::create_dir_all(path)?;

    let index = Index::create_in_dir(path, schema.schema().clone())?;
    register_analyzers(&index, schema);

    info!(path = ?path, fields = schema.fields().count(), "Created index");
    Ok(index)
}

/// Open a finalized index and rebuild its field table.
pub fn open_index(path: &Path) -> Result<(Index, IndexSchema), IndexError> {
    if !index_exists(path) {
        return Err(IndexError::IndexNotFound(path.to_path_buf()));
    }

    let index = Index::open_in_dir(path)?;
    let schema = IndexSchema::from_schema(index.schema())?;
    register_analyzers(&index, &schema);

    debug!(path = ?path, "Opened index");
    Ok((index, schema))
}

/// Create an IndexReader over a finalized, read-only index
pub fn open_reader(index: &Index) -> Result<IndexReader, IndexError> {
    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    debug!("Created index reader");
    Ok(reader)
}
