//! Build pipeline for a new index.
//!
//! The index is written into a scratch directory next to its final path and
//! only renamed into place once every document is committed, so readers never
//! observe a partial index.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tantivy::{Index, IndexWriter};
use tracing::{debug, info};

use crate::document::to_tantivy_doc;
use crate::error::IndexError;
use crate::index::{create_index, index_exists, IndexConfig};
use crate::schema::{DocumentSchema, IndexSchema};

/// Writes documents into a scratch index and finalizes it on close.
pub struct IndexBuilder {
    index: Index,
    writer: IndexWriter,
    schema: IndexSchema,
    build_path: PathBuf,
    index_path: PathBuf,
    count: u64,
}

impl IndexBuilder {
    /// Create the scratch index for `schema`.
    ///
    /// Fails when the final path already holds an index.
    pub fn create(config: &IndexConfig, schema: IndexSchema) -> Result<Self, IndexError> {
        let index_path = config.index_path.clone();
        let build_path = config.build_path();
        let build_init = |reason: String| IndexError::BuildInit {
            path: index_path.clone(),
            reason,
        };

        if index_exists(&index_path) {
            return Err(build_init("an index already exists at this path".to_string()));
        }

        let index = create_index(&build_path, &schema).map_err(|e| build_init(e.to_string()))?;
        let writer = index
            .writer(config.writer_memory_bytes())
            .map_err(|e| build_init(e.to_string()))?;

        debug!(
            path = ?build_path,
            memory_mb = config.writer_memory_mb,
            "Created index builder"
        );

        Ok(Self {
            index,
            writer,
            schema,
            build_path,
            index_path,
            count: 0,
        })
    }

    /// Add one document of type `doc_type`.
    pub fn index_document(
        &mut self,
        id: &str,
        doc_type: &str,
        type_schema: &DocumentSchema,
        document: &Map<String, Value>,
    ) -> Result<(), IndexError> {
        let doc = to_tantivy_doc(&self.schema, type_schema, id, doc_type, document);
        self.writer.add_document(doc).map_err(|e| IndexError::Write {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.count += 1;

        debug!(id, doc_type, "Indexed document");
        Ok(())
    }

    /// Documents added so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub fn build_path(&self) -> &Path {
        &self.build_path
    }

    /// Commit, wait for merges and move the index to its final path.
    ///
    /// Returns the number of documents written.
    pub fn close(self) -> Result<u64, IndexError> {
        let Self {
            index,
            mut writer,
            build_path,
            index_path,
            count,
            ..
        } = self;

        writer.commit()?;
        writer.wait_merging_threads()?;
        drop(index);

        // An empty leftover directory would make the rename fail.
        if index_path.is_dir() && std::fs::read_dir(&index_path)?.next().is_none() {
            std::fs::remove_dir(&index_path)?;
        }
        if let Some(parent) = index_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::rename(&build_path, &index_path)?;

        info!(path = ?index_path, documents = count, "Finalized index");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldMapping;
    use serde_json::json;
    use tempfile::TempDir;

    fn simple_schema() -> DocumentSchema {
        let mut schema = DocumentSchema::new();
        schema.add_leaf(
            "text",
            FieldMapping::Text {
                language: "en".to_string(),
            },
        );
        schema
    }

    #[test]
    fn test_build_and_finalize() {
        let temp_dir = TempDir::new().unwrap();
        let config = IndexConfig::new(temp_dir.path().join("simple"));
        let type_schema = simple_schema();
        let schema = IndexSchema::build([("simple", &type_schema)]);

        let mut builder = IndexBuilder::create(&config, schema).unwrap();
        assert!(builder.build_path().exists());
        assert!(!index_exists(&config.index_path));

        let doc = json!({"text": "Ping"});
        builder
            .index_document("alice", "simple", &type_schema, doc.as_object().unwrap())
            .unwrap();
        assert_eq!(builder.count(), 1);

        let count = builder.close().unwrap();
        assert_eq!(count, 1);
        assert!(index_exists(&config.index_path));
        assert!(!config.build_path().exists());
    }

    #[test]
    fn test_create_fails_over_existing_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = IndexConfig::new(temp_dir.path().join("simple"));
        let type_schema = simple_schema();

        let builder =
            IndexBuilder::create(&config, IndexSchema::build([("simple", &type_schema)])).unwrap();
        builder.close().unwrap();

        let result = IndexBuilder::create(&config, IndexSchema::build([("simple", &type_schema)]));
        assert!(matches!(result, Err(IndexError::BuildInit { .. })));
    }

    #[test]
    fn test_close_replaces_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = IndexConfig::new(temp_dir.path().join("simple"));
        std::fs::create_dir_all(&config.index_path).unwrap();
        let type_schema = simple_schema();

        let builder =
            IndexBuilder::create(&config, IndexSchema::build([("simple", &type_schema)])).unwrap();
        assert_eq!(builder.close().unwrap(), 0);
        assert!(index_exists(&config.index_path));
    }
}
