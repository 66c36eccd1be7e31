//! Document schemas and their compilation into a Tantivy schema.
//!
//! A [`DocumentSchema`] mirrors the annotated part of one document type. All
//! registered document schemas are compiled into a single [`IndexSchema`],
//! where every leaf becomes a Tantivy field named `<doc_type>:<flat path>`:
//! - `_id`: document id (STRING | STORED)
//! - `_type`: document type (STRING | STORED)
//! - text leaves: analyzed with `lang_<code>`, positions, STORED
//! - date leaves: INDEXED | STORED | FAST
//! - no_index leaves: STORED only
//! - no_store leaves: no field at all

use std::collections::{BTreeMap, BTreeSet};

use docsearch_types::join_path;
use tantivy::schema::{
    FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED,
    STRING,
};
use tracing::warn;

use crate::analysis::{analyzer_name, language_of};
use crate::error::IndexError;

/// Reserved field holding the document id.
pub const ID_FIELD: &str = "_id";

/// Reserved field holding the document type.
pub const TYPE_FIELD: &str = "_type";

/// How a leaf field is indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMapping {
    /// Searchable and stored, analyzed for `language`
    Text { language: String },
    /// Range-queryable and stored
    Date,
    /// Stored only
    NoIndex,
    /// Dropped at write time
    NoStore,
}

impl FieldMapping {
    /// True for fields a free-text match can target.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldMapping::Text { .. })
    }

    pub fn is_stored(&self) -> bool {
        !matches!(self, FieldMapping::NoStore)
    }
}

/// Node of a document schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Leaf(FieldMapping),
    Nested(DocumentSchema),
}

/// Named entry of a document schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub node: SchemaNode,
}

/// Indexing schema of one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSchema {
    fields: Vec<SchemaField>,
}

impl DocumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_leaf(&mut self, name: impl Into<String>, mapping: FieldMapping) {
        self.fields.push(SchemaField {
            name: name.into(),
            node: SchemaNode::Leaf(mapping),
        });
    }

    pub fn add_nested(&mut self, name: impl Into<String>, schema: DocumentSchema) {
        self.fields.push(SchemaField {
            name: name.into(),
            node: SchemaNode::Nested(schema),
        });
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a node by flat path.
    pub fn get(&self, path: &str) -> Option<&SchemaNode> {
        let (head, rest) = match path.split_once(docsearch_types::PATH_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let node = self.fields.iter().find(|f| f.name == head).map(|f| &f.node)?;
        match (node, rest) {
            (node, None) => Some(node),
            (SchemaNode::Nested(nested), Some(rest)) => nested.get(rest),
            (SchemaNode::Leaf(_), Some(_)) => None,
        }
    }

    /// Mapping of the leaf at `path`, if any.
    pub fn leaf(&self, path: &str) -> Option<&FieldMapping> {
        match self.get(path)? {
            SchemaNode::Leaf(mapping) => Some(mapping),
            SchemaNode::Nested(_) => None,
        }
    }

    /// Every leaf with its flat path, depth first in declaration order.
    pub fn leaves(&self) -> Vec<(String, &FieldMapping)> {
        let mut leaves = Vec::new();
        self.collect_leaves("", &mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, leaves: &mut Vec<(String, &'a FieldMapping)>) {
        for field in &self.fields {
            let path = join_path(prefix, &field.name);
            match &field.node {
                SchemaNode::Leaf(mapping) => leaves.push((path, mapping)),
                SchemaNode::Nested(nested) => nested.collect_leaves(&path, leaves),
            }
        }
    }
}

/// Separator between the document type and the leaf path in field names.
pub const TYPE_PATH_SEPARATOR: char = ':';

/// Tantivy field name of the leaf at `path` of `doc_type`.
pub fn field_name(doc_type: &str, path: &str) -> String {
    format!("{}{}{}", doc_type, TYPE_PATH_SEPARATOR, path)
}

/// A leaf of one document type bound to its Tantivy field.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    pub doc_type: String,
    pub path: String,
    pub field: tantivy::schema::Field,
    pub mapping: FieldMapping,
}

/// Tantivy schema compiled from every registered document schema.
///
/// Each document type owns its fields, so two types may map the same path
/// differently.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    schema: Schema,
    /// Document id (STRING | STORED)
    pub id: tantivy::schema::Field,
    /// Document type (STRING | STORED)
    pub doc_type: tantivy::schema::Field,
    /// Keyed by (document type, path)
    fields: BTreeMap<(String, String), IndexField>,
}

impl IndexSchema {
    /// Compile document schemas, in registration order.
    pub fn build<'a, I>(schemas: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a DocumentSchema)>,
    {
        let mut builder = Schema::builder();
        let id = builder.add_text_field(ID_FIELD, STRING | STORED);
        let doc_type_field = builder.add_text_field(TYPE_FIELD, STRING | STORED);

        let mut fields = BTreeMap::new();
        for (doc_type, schema) in schemas {
            for (path, mapping) in schema.leaves() {
                let key = (doc_type.to_string(), path.clone());
                if fields.contains_key(&key) {
                    warn!(doc_type, path = %path, "Duplicate field path, keeping the first one");
                    continue;
                }

                let name = field_name(doc_type, &path);
                let field = match mapping {
                    FieldMapping::Text { language } => {
                        let indexing = TextFieldIndexing::default()
                            .set_tokenizer(&analyzer_name(language))
                            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
                        let options = TextOptions::default()
                            .set_indexing_options(indexing)
                            .set_stored();
                        builder.add_text_field(&name, options)
                    }
                    FieldMapping::Date => builder.add_date_field(&name, INDEXED | STORED | FAST),
                    FieldMapping::NoIndex => builder.add_text_field(&name, STORED),
                    FieldMapping::NoStore => continue,
                };
                fields.insert(
                    key,
                    IndexField {
                        doc_type: doc_type.to_string(),
                        path,
                        field,
                        mapping: mapping.clone(),
                    },
                );
            }
        }

        Self {
            schema: builder.build(),
            id,
            doc_type: doc_type_field,
            fields,
        }
    }

    /// Rebuild the field table from the schema of an existing index.
    pub fn from_schema(schema: Schema) -> Result<Self, IndexError> {
        let id = schema
            .get_field(ID_FIELD)
            .map_err(|_| IndexError::SchemaMismatch(format!("missing {} field", ID_FIELD)))?;
        let doc_type = schema
            .get_field(TYPE_FIELD)
            .map_err(|_| IndexError::SchemaMismatch(format!("missing {} field", TYPE_FIELD)))?;

        let mut fields = BTreeMap::new();
        for (field, entry) in schema.fields() {
            let name = entry.name();
            if name == ID_FIELD || name == TYPE_FIELD {
                continue;
            }
            let Some((type_name, path)) = name.split_once(TYPE_PATH_SEPARATOR) else {
                return Err(IndexError::SchemaMismatch(format!(
                    "field {} is not bound to a document type",
                    name
                )));
            };

            let mapping = match entry.field_type() {
                FieldType::Str(options) => match options.get_indexing_options() {
                    Some(indexing) => match language_of(indexing.tokenizer()) {
                        Some(language) => FieldMapping::Text {
                            language: language.to_string(),
                        },
                        None => {
                            return Err(IndexError::SchemaMismatch(format!(
                                "field {} uses unknown tokenizer {}",
                                name,
                                indexing.tokenizer()
                            )))
                        }
                    },
                    None => FieldMapping::NoIndex,
                },
                FieldType::Date(_) => FieldMapping::Date,
                other => {
                    return Err(IndexError::SchemaMismatch(format!(
                        "field {} has unsupported type {:?}",
                        name,
                        other.value_type()
                    )))
                }
            };

            fields.insert(
                (type_name.to_string(), path.to_string()),
                IndexField {
                    doc_type: type_name.to_string(),
                    path: path.to_string(),
                    field,
                    mapping,
                },
            );
        }

        Ok(Self {
            schema,
            id,
            doc_type,
            fields,
        })
    }

    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field of the leaf at `path` of `doc_type`.
    pub fn field(&self, doc_type: &str, path: &str) -> Option<&IndexField> {
        self.fields.get(&(doc_type.to_string(), path.to_string()))
    }

    /// Fields ordered by document type, then path.
    pub fn fields(&self) -> impl Iterator<Item = &IndexField> {
        self.fields.values()
    }

    /// Fields of every document type at `path`.
    pub fn fields_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a IndexField> + 'a {
        self.fields().filter(move |f| f.path == path)
    }

    /// Fields of one document type.
    pub fn fields_of<'a>(&'a self, doc_type: &'a str) -> impl Iterator<Item = &'a IndexField> + 'a {
        self.fields().filter(move |f| f.doc_type == doc_type)
    }

    pub fn text_fields(&self) -> impl Iterator<Item = &IndexField> {
        self.fields().filter(|f| f.mapping.is_text())
    }

    pub fn stored_fields(&self) -> impl Iterator<Item = &IndexField> {
        self.fields().filter(|f| f.mapping.is_stored())
    }

    /// Languages referenced by text fields.
    pub fn languages(&self) -> BTreeSet<String> {
        self.fields()
            .filter_map(|f| match &f.mapping {
                FieldMapping::Text { language } => Some(language.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_schema() -> DocumentSchema {
        let mut author = DocumentSchema::new();
        author.add_leaf(
            "name",
            FieldMapping::Text {
                language: "en".to_string(),
            },
        );

        let mut metadata = DocumentSchema::new();
        metadata.add_leaf("published", FieldMapping::Date);
        metadata.add_nested("author", author);

        let mut schema = DocumentSchema::new();
        schema.add_leaf(
            "title",
            FieldMapping::Text {
                language: "en".to_string(),
            },
        );
        schema.add_leaf("path", FieldMapping::NoIndex);
        schema.add_leaf("secret", FieldMapping::NoStore);
        schema.add_nested("metadata", metadata);
        schema
    }

    #[test]
    fn test_leaves_use_flat_paths() {
        let schema = article_schema();
        let paths: Vec<String> = schema.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "title",
                "path",
                "secret",
                "metadata.published",
                "metadata.author.name"
            ]
        );
    }

    #[test]
    fn test_get_by_path() {
        let schema = article_schema();
        assert_eq!(schema.leaf("metadata.published"), Some(&FieldMapping::Date));
        assert!(matches!(
            schema.get("metadata.author"),
            Some(SchemaNode::Nested(_))
        ));
        assert_eq!(schema.leaf("metadata.author"), None);
        assert_eq!(schema.leaf("title.extra"), None);
        assert_eq!(schema.leaf("missing"), None);
    }

    #[test]
    fn test_build_index_schema() {
        let schema = article_schema();
        let index_schema = IndexSchema::build([("article", &schema)]);

        assert!(index_schema.schema().get_field(ID_FIELD).is_ok());
        assert!(index_schema.schema().get_field(TYPE_FIELD).is_ok());
        assert!(index_schema.field("article", "metadata.author.name").is_some());
        assert!(index_schema.field("article", "secret").is_none());
        assert!(index_schema.field("other", "title").is_none());
        assert!(index_schema
            .schema()
            .get_field("article:metadata.author.name")
            .is_ok());

        let text: Vec<&str> = index_schema
            .text_fields()
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(text, vec!["metadata.author.name", "title"]);

        let stored: Vec<&str> = index_schema
            .stored_fields()
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(
            stored,
            vec!["metadata.author.name", "metadata.published", "path", "title"]
        );
        assert_eq!(
            index_schema.languages().into_iter().collect::<Vec<_>>(),
            vec!["en"]
        );
    }

    #[test]
    fn test_types_map_shared_path_independently() {
        let mut first = DocumentSchema::new();
        first.add_leaf("title", FieldMapping::NoIndex);
        let mut second = DocumentSchema::new();
        second.add_leaf(
            "title",
            FieldMapping::Text {
                language: "fr".to_string(),
            },
        );
        let mut third = DocumentSchema::new();
        third.add_leaf(
            "title",
            FieldMapping::Text {
                language: "en".to_string(),
            },
        );

        let index_schema =
            IndexSchema::build([("first", &first), ("second", &second), ("third", &third)]);
        assert_eq!(
            index_schema.field("first", "title").map(|f| &f.mapping),
            Some(&FieldMapping::NoIndex)
        );
        assert_eq!(
            index_schema.field("second", "title").map(|f| &f.mapping),
            Some(&FieldMapping::Text {
                language: "fr".to_string()
            })
        );
        assert_eq!(
            index_schema.field("third", "title").map(|f| &f.mapping),
            Some(&FieldMapping::Text {
                language: "en".to_string()
            })
        );
        assert_eq!(index_schema.fields_at("title").count(), 3);
        assert_eq!(index_schema.fields_of("second").count(), 1);
        assert_eq!(
            index_schema.languages().into_iter().collect::<Vec<_>>(),
            vec!["en", "fr"]
        );
    }

    #[test]
    fn test_from_schema_round_trip() {
        let schema = article_schema();
        let original = IndexSchema::build([("article", &schema)]);
        let rebuilt = IndexSchema::from_schema(original.schema().clone()).unwrap();

        assert_eq!(rebuilt.id, original.id);
        assert_eq!(rebuilt.doc_type, original.doc_type);
        let original_fields: Vec<&IndexField> = original.fields().collect();
        let rebuilt_fields: Vec<&IndexField> = rebuilt.fields().collect();
        assert_eq!(rebuilt_fields, original_fields);
    }

    #[test]
    fn test_from_schema_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("title", STRING | STORED);
        let result = IndexSchema::from_schema(builder.build());
        assert!(matches!(result, Err(IndexError::SchemaMismatch(_))));

        let mut builder = Schema::builder();
        builder.add_text_field(ID_FIELD, STRING | STORED);
        builder.add_text_field(TYPE_FIELD, STRING | STORED);
        builder.add_text_field("title", STORED);
        let result = IndexSchema::from_schema(builder.build());
        assert!(matches!(result, Err(IndexError::SchemaMismatch(_))));
    }
}
