//! Index registrar: type registration and the write pipeline.
//!
//! Types are registered first; the first write compiles every registered
//! schema into the index definition and creates the [`IndexBuilder`]. From
//! then on the schema is frozen. Closing consumes the registrar.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use docsearch_types::{Describe, TypeDescriptor};

use crate::builder::IndexBuilder;
use crate::derive::{derive_schema, resolve_type_name};
use crate::error::IndexError;
use crate::index::IndexConfig;
use crate::schema::{DocumentSchema, IndexSchema, TYPE_PATH_SEPARATOR};

/// A registered document type.
#[derive(Debug, Clone)]
struct RegisteredType {
    structural_name: String,
    schema: DocumentSchema,
}

fn check_type_name(doc_type: &str) -> Result<(), IndexError> {
    if doc_type.is_empty() || doc_type.contains(TYPE_PATH_SEPARATOR) {
        return Err(IndexError::InvalidTypeName(doc_type.to_string()));
    }
    Ok(())
}

/// Collects document types and writes documents into a new index.
pub struct IndexRegistrar {
    config: IndexConfig,
    /// Registration order, used when compiling the index schema
    order: Vec<String>,
    types: BTreeMap<String, RegisteredType>,
    builder: Option<IndexBuilder>,
}

impl IndexRegistrar {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            order: Vec::new(),
            types: BTreeMap::new(),
            builder: None,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Register the type of `value`.
    ///
    /// Returns false when the type name is already registered for the same
    /// structural type.
    pub fn register<T: Describe + ?Sized>(&mut self, value: &T) -> Result<bool, IndexError> {
        self.register_descriptor(&value.describe())
    }

    /// Register a type from its descriptor table.
    pub fn register_descriptor(&mut self, descriptor: &TypeDescriptor) -> Result<bool, IndexError> {
        let doc_type = resolve_type_name(descriptor);
        check_type_name(&doc_type)?;

        if let Some(existing) = self.types.get(&doc_type) {
            if existing.structural_name != descriptor.structural_name {
                return Err(IndexError::TypeCollision {
                    doc_type,
                    existing: existing.structural_name.clone(),
                    incoming: descriptor.structural_name.clone(),
                });
            }
            debug!(doc_type = %doc_type, "Type already registered");
            return Ok(false);
        }

        if self.builder.is_some() {
            return Err(IndexError::SchemaFrozen(doc_type));
        }

        let schema = derive_schema(descriptor, &self.config.default_language);
        Ok(self.insert(doc_type, descriptor.structural_name.clone(), schema))
    }

    /// Register an already derived schema under `doc_type`.
    pub fn register_schema(
        &mut self,
        doc_type: &str,
        schema: DocumentSchema,
    ) -> Result<bool, IndexError> {
        check_type_name(doc_type)?;
        if self.types.contains_key(doc_type) {
            debug!(doc_type, "Type already registered");
            return Ok(false);
        }
        if self.builder.is_some() {
            return Err(IndexError::SchemaFrozen(doc_type.to_string()));
        }
        Ok(self.insert(doc_type.to_string(), doc_type.to_string(), schema))
    }

    fn insert(&mut self, doc_type: String, structural_name: String, schema: DocumentSchema) -> bool {
        info!(
            doc_type = %doc_type,
            structural_name = %structural_name,
            fields = schema.leaves().len(),
            "Registered document type"
        );
        self.order.push(doc_type.clone());
        self.types.insert(
            doc_type,
            RegisteredType {
                structural_name,
                schema,
            },
        );
        true
    }

    /// Schema registered under `doc_type`
    pub fn schema(&self, doc_type: &str) -> Option<&DocumentSchema> {
        self.types.get(doc_type).map(|t| &t.schema)
    }

    /// Registered type names in registration order
    pub fn doc_types(&self) -> &[String] {
        &self.order
    }

    /// Compile the index definition from every registered schema.
    pub fn index_schema(&self) -> IndexSchema {
        IndexSchema::build(self.order.iter().filter_map(|doc_type| {
            self.types
                .get(doc_type)
                .map(|t| (doc_type.as_str(), &t.schema))
        }))
    }

    /// Whether writing has started
    pub fn is_frozen(&self) -> bool {
        self.builder.is_some()
    }

    /// Index `value` under `id`; its type must be registered.
    pub fn write<T: Describe + Serialize + ?Sized>(
        &mut self,
        id: &str,
        value: &T,
    ) -> Result<(), IndexError> {
        let doc_type = resolve_type_name(&value.describe());
        let document = serde_json::to_value(value).map_err(|e| IndexError::Write {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.write_value(id, &doc_type, &document)
    }

    /// Index a serialized document of a registered type.
    pub fn write_value(&mut self, id: &str, doc_type: &str, document: &Value) -> Result<(), IndexError> {
        let write_error = |reason: String| IndexError::Write {
            id: id.to_string(),
            reason,
        };

        let Some(fields) = document.as_object() else {
            return Err(write_error("document is not an object".to_string()));
        };

        if !self.types.contains_key(doc_type) {
            return Err(write_error(format!("type {} is not registered", doc_type)));
        }

        if self.builder.is_none() {
            let builder = IndexBuilder::create(&self.config, self.index_schema())?;
            self.builder = Some(builder);
        }

        let Self { types, builder, .. } = self;
        let registered = types
            .get(doc_type)
            .ok_or_else(|| write_error(format!("type {} is not registered", doc_type)))?;
        let builder = builder
            .as_mut()
            .ok_or_else(|| write_error("index builder is not available".to_string()))?;

        builder.index_document(id, doc_type, &registered.schema, fields)
    }

    /// Finalize the index. Returns the number of documents written.
    pub fn close(self) -> Result<u64, IndexError> {
        match self.builder {
            Some(builder) => builder.close(),
            None => {
                debug!("Nothing written, no index created");
                Ok(0)
            }
        }
    }
}
