//! Document mapping from serialized values to Tantivy documents.
//!
//! A document is flattened into `(path, leaf)` pairs; every leaf whose path
//! belongs to the document's type schema is added to that type's field.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tantivy::TantivyDocument;
use tracing::{debug, warn};

use docsearch_types::flatten_entries;

use crate::schema::{DocumentSchema, FieldMapping, IndexSchema};

/// Convert a serialized document of type `doc_type` to a Tantivy document.
pub fn to_tantivy_doc(
    schema: &IndexSchema,
    type_schema: &DocumentSchema,
    id: &str,
    doc_type: &str,
    document: &Map<String, Value>,
) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    doc.add_text(schema.id, id);
    doc.add_text(schema.doc_type, doc_type);

    for (path, value) in flatten_entries(document) {
        match type_schema.leaf(&path) {
            Some(FieldMapping::NoStore) | None => continue,
            Some(_) => {}
        }
        let Some(index_field) = schema.field(doc_type, &path) else {
            continue;
        };

        match &index_field.mapping {
            FieldMapping::Text { .. } | FieldMapping::NoIndex => {
                doc.add_text(index_field.field, leaf_text(value));
            }
            FieldMapping::Date => match parse_date(&leaf_text(value)) {
                Some(date) => doc.add_date(index_field.field, date),
                None => warn!(id, path = %path, value = %value, "Unparseable date, skipping field"),
            },
            FieldMapping::NoStore => {}
        }
    }

    debug!(id, doc_type, "Mapped document");
    doc
}

/// Text form of a scalar leaf.
fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(text: &str) -> Option<tantivy::DateTime> {
    let text = text.trim();
    let micros = match DateTime::parse_from_rfc3339(text) {
        Ok(parsed) => parsed.timestamp_micros(),
        Err(_) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp_micros(),
    };
    Some(tantivy::DateTime::from_timestamp_micros(micros))
}

/// Format a stored date as RFC 3339 with second precision.
pub fn format_date(date: tantivy::DateTime) -> Option<String> {
    DateTime::<Utc>::from_timestamp_micros(date.into_timestamp_micros())
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}
