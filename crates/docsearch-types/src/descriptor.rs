//! Field descriptor tables for indexable document types.
//!
//! A [`TypeDescriptor`] lists the fields of a document type together with
//! their indexing annotation, standing in for runtime reflection. Rust types
//! provide one by implementing [`Describe`]; dynamic types are loaded from
//! TOML or JSON [`TypeDefinitions`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Indexing policy attached to a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAnnotation {
    /// Tokenized, searchable, stored, analyzed with the field's language.
    Text,
    /// Temporal value, range-queryable and stored.
    Date,
    /// Stored but not searchable.
    NoIndex,
    /// Neither searchable nor retrievable.
    NoStore,
}

impl FieldAnnotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldAnnotation::Text => "text",
            FieldAnnotation::Date => "date",
            FieldAnnotation::NoIndex => "no_index",
            FieldAnnotation::NoStore => "no_store",
        }
    }

    /// Parse an annotation tag, returning None for unknown tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(FieldAnnotation::Text),
            "date" => Some(FieldAnnotation::Date),
            "no_index" => Some(FieldAnnotation::NoIndex),
            "no_store" => Some(FieldAnnotation::NoStore),
            _ => None,
        }
    }
}

impl FromStr for FieldAnnotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown field annotation: {}", s))
    }
}

impl fmt::Display for FieldAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a described field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// String field with an optional annotation tag.
    ///
    /// The tag is kept verbatim so unknown tags can be reported and ignored.
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotation: Option<String>,
    },
    /// Nested structure described by its own table.
    Struct { descriptor: TypeDescriptor },
    /// Any other kind; never indexed.
    Other {
        #[serde(default)]
        type_name: String,
    },
}

/// One entry of a descriptor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as it appears in the serialized document
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// String field carrying an annotation.
    pub fn annotated(name: impl Into<String>, annotation: FieldAnnotation) -> Self {
        Self::tagged(name, annotation.as_str())
    }

    /// String field carrying a raw annotation tag.
    pub fn tagged(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::String {
                annotation: Some(tag.into()),
            },
        }
    }

    /// String field without annotation.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::String { annotation: None },
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldAnnotation::Text)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldAnnotation::Date)
    }

    pub fn no_index(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldAnnotation::NoIndex)
    }

    pub fn no_store(name: impl Into<String>) -> Self {
        Self::annotated(name, FieldAnnotation::NoStore)
    }

    /// Nested structure field, described from the nested value itself.
    pub fn nested<T: Describe + ?Sized>(name: impl Into<String>, value: &T) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Struct {
                descriptor: value.describe(),
            },
        }
    }

    /// Field of a kind that cannot be indexed.
    pub fn other(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Other {
                type_name: type_name.into(),
            },
        }
    }
}

/// Field table of a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Structural type name; the fallback document type derives from it
    #[serde(rename = "name")]
    pub structural_name: String,

    /// Self-reported document type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Self-reported analysis language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(structural_name: impl Into<String>) -> Self {
        Self {
            structural_name: structural_name.into(),
            doc_type: None,
            language: None,
            fields: Vec::new(),
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Document type name used when no type is self-reported.
    ///
    /// The last path segment of the structural name, without generic
    /// arguments: `app::model::Article<T>` becomes `Article`.
    pub fn fallback_name(&self) -> &str {
        let name = self.structural_name.as_str();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }
}

/// Exposes the field table of an indexable value.
///
/// `doc_type` and `language` are optional capabilities: a value reports them
/// only when it has something better than the structural defaults.
pub trait Describe {
    /// Fields of the value in declaration order.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Self-reported document type.
    fn doc_type(&self) -> Option<String> {
        None
    }

    /// Self-reported analysis language for this value and its descendants.
    fn language(&self) -> Option<String> {
        None
    }

    fn structural_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn describe(&self) -> TypeDescriptor {
        TypeDescriptor {
            structural_name: self.structural_name(),
            doc_type: self.doc_type(),
            language: self.language(),
            fields: self.fields(),
        }
    }
}

impl Describe for TypeDescriptor {
    fn fields(&self) -> Vec<FieldDescriptor> {
        self.fields.clone()
    }

    fn doc_type(&self) -> Option<String> {
        self.doc_type.clone()
    }

    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn structural_name(&self) -> String {
        self.structural_name.clone()
    }

    fn describe(&self) -> TypeDescriptor {
        self.clone()
    }
}

/// A set of type descriptors loaded from a definitions file.
///
/// ```toml
/// [[types]]
/// name = "Article"
/// type = "article"
/// language = "en"
///
/// [[types.fields]]
/// name = "title"
/// kind = "string"
/// annotation = "text"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitions {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl TypeDefinitions {
    /// Parse definitions from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, TypesError> {
        toml::from_str(text).map_err(|e| TypesError::InvalidDescriptor(e.to_string()))
    }

    /// Load definitions from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, TypesError> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Self::from_toml_str(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Meta {
        lang: String,
    }

    impl Describe for Meta {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::text("label")]
        }

        fn language(&self) -> Option<String> {
            Some(self.lang.clone())
        }
    }

    struct Page {
        meta: Meta,
    }

    impl Describe for Page {
        fn fields(&self) -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::text("body"),
                FieldDescriptor::nested("meta", &self.meta),
                FieldDescriptor::other("views", "u64"),
            ]
        }

        fn doc_type(&self) -> Option<String> {
            Some("page".to_string())
        }
    }

    #[test]
    fn test_annotation_conversion() {
        assert_eq!(FieldAnnotation::NoIndex.as_str(), "no_index");
        assert_eq!(FieldAnnotation::parse("date"), Some(FieldAnnotation::Date));
        assert_eq!(FieldAnnotation::parse("keyword"), None);
        assert_eq!(
            "no_store".parse::<FieldAnnotation>().unwrap(),
            FieldAnnotation::NoStore
        );
        assert!("invalid".parse::<FieldAnnotation>().is_err());
    }

    #[test]
    fn test_describe_captures_capabilities() {
        let page = Page {
            meta: Meta {
                lang: "fr".to_string(),
            },
        };
        let descriptor = page.describe();

        assert_eq!(descriptor.doc_type.as_deref(), Some("page"));
        assert_eq!(descriptor.language, None);
        assert!(descriptor.structural_name.ends_with("Page"));
        assert_eq!(descriptor.fields.len(), 3);

        match &descriptor.fields[1].kind {
            FieldKind::Struct { descriptor } => {
                assert_eq!(descriptor.language.as_deref(), Some("fr"));
                assert_eq!(descriptor.fallback_name(), "Meta");
            }
            other => panic!("expected nested struct, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(
            TypeDescriptor::new("app::model::Article").fallback_name(),
            "Article"
        );
        assert_eq!(
            TypeDescriptor::new("app::Wrapper<app::Inner>").fallback_name(),
            "Wrapper"
        );
        assert_eq!(TypeDescriptor::new("Plain").fallback_name(), "Plain");
    }

    #[test]
    fn test_builder() {
        let descriptor = TypeDescriptor::new("Note")
            .with_doc_type("note")
            .with_language("de")
            .with_field(FieldDescriptor::text("body"))
            .with_field(FieldDescriptor::plain("internal"));

        assert_eq!(descriptor.doc_type.as_deref(), Some("note"));
        assert_eq!(descriptor.language.as_deref(), Some("de"));
        assert_eq!(
            descriptor.fields[1].kind,
            FieldKind::String { annotation: None }
        );
        assert_eq!(descriptor.describe(), descriptor);
    }

    #[test]
    fn test_definitions_from_toml() {
        let text = r#"
            [[types]]
            name = "Article"
            type = "article"
            language = "en"

            [[types.fields]]
            name = "title"
            kind = "string"
            annotation = "text"

            [[types.fields]]
            name = "secret"
            kind = "string"
            annotation = "no_store"

            [[types.fields]]
            name = "meta"
            kind = "struct"

            [types.fields.descriptor]
            name = "Meta"

            [[types.fields.descriptor.fields]]
            name = "published"
            kind = "string"
            annotation = "date"
        "#;

        let defs = TypeDefinitions::from_toml_str(text).unwrap();
        assert_eq!(defs.types.len(), 1);

        let article = &defs.types[0];
        assert_eq!(article.structural_name, "Article");
        assert_eq!(article.doc_type.as_deref(), Some("article"));
        assert_eq!(article.fields[0], FieldDescriptor::text("title"));
        assert_eq!(article.fields[1], FieldDescriptor::no_store("secret"));

        match &article.fields[2].kind {
            FieldKind::Struct { descriptor } => {
                assert_eq!(descriptor.fields[0], FieldDescriptor::date("published"));
            }
            other => panic!("expected nested struct, got {:?}", other),
        }
    }

    #[test]
    fn test_definitions_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("types.json");
        std::fs::write(
            &path,
            r#"{"types": [{"name": "Simple", "fields": [{"name": "text", "kind": "string", "annotation": "text"}]}]}"#,
        )
        .unwrap();

        let defs = TypeDefinitions::load(&path).unwrap();
        assert_eq!(defs.types[0].fallback_name(), "Simple");
        assert_eq!(defs.types[0].fields[0], FieldDescriptor::text("text"));
    }

    #[test]
    fn test_definitions_invalid_toml() {
        let err = TypeDefinitions::from_toml_str("[[types]]\nfields = 3").unwrap_err();
        assert!(matches!(err, TypesError::InvalidDescriptor(_)));
    }
}
