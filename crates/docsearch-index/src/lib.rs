//! # docsearch-index
//!
//! Schema derivation, indexing and field-scoped search for docsearch using
//! Tantivy.
//!
//! Document types describe their fields through [`docsearch_types::Describe`].
//! The [`IndexRegistrar`] derives a schema per type, compiles all of them into
//! one Tantivy schema and writes documents into a scratch index that is moved
//! into place on close. The [`DocumentSearcher`] runs match queries over a
//! selected set of fields and rebuilds nested documents from the stored flat
//! fields of each hit.
//!
//! ## Features
//! - Per-type schemas with `text`, `date`, `no_index` and `no_store` fields
//! - Language-specific analyzers (`lang_<code>`) with stemming
//! - Atomic index finalization
//! - Match locations per field and term

pub mod analysis;
pub mod builder;
pub mod derive;
pub mod document;
pub mod error;
pub mod hit;
pub mod index;
pub mod query;
pub mod registrar;
pub mod schema;
pub mod searcher;

pub use analysis::{analyzer_name, build_analyzer, register_analyzers, stemmer_language};
pub use builder::IndexBuilder;
pub use derive::{derive_schema, resolve_language, resolve_type_name};
pub use document::{format_date, parse_date, to_tantivy_doc};
pub use error::IndexError;
pub use hit::{build_hit_record, EngineHit, HitRecord, Location, MatchFragment, TermLocations};
pub use index::{create_index, index_exists, open_index, open_reader, IndexConfig};
pub use query::{execute, select_fields};
pub use registrar::IndexRegistrar;
pub use schema::{
    field_name, DocumentSchema, FieldMapping, IndexField, IndexSchema, SchemaField, SchemaNode,
    ID_FIELD, TYPE_FIELD, TYPE_PATH_SEPARATOR,
};
pub use searcher::{DocumentSearcher, SearchOptions, SearchResults};
