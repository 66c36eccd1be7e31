//! Schema derivation from field descriptor tables.
//!
//! Walks a [`TypeDescriptor`] and builds the [`DocumentSchema`] of the type:
//! nested structures always recurse, annotated string fields become leaves,
//! everything else stays invisible to the index.

use docsearch_types::{FieldAnnotation, FieldKind, TypeDescriptor};
use tracing::debug;

use crate::schema::{DocumentSchema, FieldMapping};

/// Document type name: the self-reported type, else the structural fallback.
pub fn resolve_type_name(descriptor: &TypeDescriptor) -> String {
    match descriptor.doc_type.as_deref() {
        Some(doc_type) if !doc_type.is_empty() => doc_type.to_string(),
        _ => descriptor.fallback_name().to_string(),
    }
}

/// Effective language: the self-reported language, else the inherited one.
pub fn resolve_language<'a>(descriptor: &'a TypeDescriptor, inherited: &'a str) -> &'a str {
    match descriptor.language.as_deref() {
        Some(language) if !language.is_empty() => language,
        _ => inherited,
    }
}

/// Leaf mapping of an annotation; only text binds the language.
pub fn mapping_for(annotation: FieldAnnotation, language: &str) -> FieldMapping {
    match annotation {
        FieldAnnotation::Text => FieldMapping::Text {
            language: language.to_string(),
        },
        FieldAnnotation::Date => FieldMapping::Date,
        FieldAnnotation::NoIndex => FieldMapping::NoIndex,
        FieldAnnotation::NoStore => FieldMapping::NoStore,
    }
}

/// Derive the schema of `descriptor`, inheriting `language` unless overridden.
pub fn derive_schema(descriptor: &TypeDescriptor, language: &str) -> DocumentSchema {
    let language = resolve_language(descriptor, language);
    let mut schema = DocumentSchema::new();

    for field in &descriptor.fields {
        match &field.kind {
            FieldKind::Struct { descriptor: nested } => {
                let nested_schema = derive_schema(nested, language);
                if nested_schema.is_empty() {
                    debug!(field = %field.name, "Nested structure has no indexed fields");
                    continue;
                }
                schema.add_nested(&field.name, nested_schema);
            }
            FieldKind::String {
                annotation: Some(tag),
            } => match FieldAnnotation::parse(tag) {
                Some(annotation) => {
                    debug!(field = %field.name, %annotation, language, "Mapped field");
                    schema.add_leaf(&field.name, mapping_for(annotation, language));
                }
                None => debug!(field = %field.name, tag = %tag, "Unknown annotation, field ignored"),
            },
            FieldKind::String { annotation: None } => {
                debug!(field = %field.name, "Field has no annotation, ignored");
            }
            FieldKind::Other { type_name } => {
                debug!(field = %field.name, type_name = %type_name, "Unsupported field kind, ignored");
            }
        }
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;
    use docsearch_types::{Describe, FieldDescriptor};

    struct Tags;

    impl Describe for Tags {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::text("text"),
                FieldDescriptor::date("date"),
                FieldDescriptor::no_index("temp"),
                FieldDescriptor::no_store("pass"),
            ]
        }

        fn doc_type(&self) -> Option<String> {
            Some("tags".to_string())
        }
    }

    struct Label {
        language: Option<String>,
    }

    impl Describe for Label {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::text("label")]
        }

        fn language(&self) -> Option<String> {
            self.language.clone()
        }
    }

    struct Nested {
        meta: Label,
        data: Label,
    }

    impl Describe for Nested {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::text("text"),
                FieldDescriptor::nested("meta", &self.meta),
                FieldDescriptor::nested("data", &self.data),
            ]
        }

        fn language(&self) -> Option<String> {
            Some("de".to_string())
        }
    }

    fn text(language: &str) -> FieldMapping {
        FieldMapping::Text {
            language: language.to_string(),
        }
    }

    #[test]
    fn test_annotation_table() {
        let schema = derive_schema(&Tags.describe(), "en");
        assert_eq!(schema.leaf("text"), Some(&text("en")));
        assert_eq!(schema.leaf("date"), Some(&FieldMapping::Date));
        assert_eq!(schema.leaf("temp"), Some(&FieldMapping::NoIndex));
        assert_eq!(schema.leaf("pass"), Some(&FieldMapping::NoStore));
    }

    #[test]
    fn test_unannotated_and_unsupported_fields_omitted() {
        let descriptor = TypeDescriptor::new("Mixed")
            .with_field(FieldDescriptor::plain("internal"))
            .with_field(FieldDescriptor::tagged("keyword", "keyword"))
            .with_field(FieldDescriptor::other("count", "u64"))
            .with_field(FieldDescriptor::text("body"));

        let schema = derive_schema(&descriptor, "en");
        let paths: Vec<String> = schema.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["body"]);
    }

    #[test]
    fn test_language_propagates_to_nested() {
        let value = Nested {
            meta: Label { language: None },
            data: Label {
                language: Some(String::new()),
            },
        };
        let schema = derive_schema(&value.describe(), "en");

        assert_eq!(schema.leaf("text"), Some(&text("de")));
        assert_eq!(schema.leaf("meta.label"), Some(&text("de")));
        assert_eq!(schema.leaf("data.label"), Some(&text("de")));
    }

    #[test]
    fn test_nested_override_applies_to_subtree_only() {
        let value = Nested {
            meta: Label {
                language: Some("fr".to_string()),
            },
            data: Label { language: None },
        };
        let schema = derive_schema(&value.describe(), "en");

        assert_eq!(schema.leaf("text"), Some(&text("de")));
        assert_eq!(schema.leaf("meta.label"), Some(&text("fr")));
        assert_eq!(schema.leaf("data.label"), Some(&text("de")));
    }

    #[test]
    fn test_inherited_language_when_not_overridden() {
        let schema = derive_schema(&Label { language: None }.describe(), "it");
        assert_eq!(schema.leaf("label"), Some(&text("it")));
    }

    #[test]
    fn test_nested_without_indexed_fields_not_attached() {
        let inner = TypeDescriptor::new("Inner").with_field(FieldDescriptor::plain("note"));
        let descriptor = TypeDescriptor::new("Outer")
            .with_field(FieldDescriptor::text("title"))
            .with_field(FieldDescriptor::nested("inner", &inner));

        let schema = derive_schema(&descriptor, "en");
        assert!(schema.get("inner").is_none());
        assert!(matches!(schema.get("title"), Some(SchemaNode::Leaf(_))));
    }

    #[test]
    fn test_nested_structure_recursed_regardless_of_annotation() {
        let inner = TypeDescriptor::new("Inner").with_field(FieldDescriptor::date("when"));
        let descriptor = TypeDescriptor::new("Outer").with_field(FieldDescriptor::nested("inner", &inner));

        let schema = derive_schema(&descriptor, "en");
        assert_eq!(schema.leaf("inner.when"), Some(&FieldMapping::Date));
    }

    #[test]
    fn test_resolve_type_name() {
        assert_eq!(resolve_type_name(&Tags.describe()), "tags");
        assert_eq!(
            resolve_type_name(&Label { language: None }.describe()),
            "Label"
        );
        assert_eq!(
            resolve_type_name(&TypeDescriptor::new("app::Doc").with_doc_type("")),
            "Doc"
        );
    }
}
