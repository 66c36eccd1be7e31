//! # docsearch-types
//!
//! Shared domain types for the docsearch service.
//!
//! This crate defines the data structures used throughout the system:
//! - Path codec: flattening nested documents into dotted field paths and back
//! - Descriptors: per-type field tables with indexing annotations
//! - Settings: configuration types
//!
//! ## Usage
//!
//! ```rust
//! use docsearch_types::{flatten, unflatten};
//! use serde_json::json;
//!
//! let doc = json!({"metadata": {"title": "Title"}});
//! let paths = flatten(doc.as_object().unwrap());
//! assert_eq!(paths, vec!["metadata.title".to_string()]);
//!
//! let rebuilt = unflatten([("metadata.title", json!("Title"))]);
//! assert_eq!(serde_json::Value::Object(rebuilt), doc);
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod path;

pub use config::Settings;
pub use descriptor::{
    Describe, FieldAnnotation, FieldDescriptor, FieldKind, TypeDefinitions, TypeDescriptor,
};
pub use error::TypesError;
pub use path::{flatten, flatten_entries, join_path, split_path, unflatten, PATH_SEPARATOR};
