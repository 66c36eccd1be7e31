//! Path codec for nested documents.
//!
//! A nested JSON object is addressed leaf by leaf through dotted paths
//! (`metadata.author.name`). [`flatten`] turns a document into the list of
//! paths reaching its leaves, [`unflatten`] rebuilds a nested document from
//! `(path, value)` pairs such as the stored fields of a search hit.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Separator between field names in a flat path.
pub const PATH_SEPARATOR: char = '.';

/// Join a parent path and a field name.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{name}")
    }
}

/// Split a flat path into its field names.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).collect()
}

/// List the flat paths of every leaf reachable from the root.
///
/// Booleans, numbers and strings are leaves and objects are walked. Nulls and
/// arrays are skipped with a warning. The order of the result follows the
/// traversal and carries no meaning.
pub fn flatten(document: &Map<String, Value>) -> Vec<String> {
    flatten_entries(document)
        .into_iter()
        .map(|(path, _)| path)
        .collect()
}

/// Like [`flatten`], keeping a reference to each leaf value.
pub fn flatten_entries(document: &Map<String, Value>) -> Vec<(String, &Value)> {
    let mut entries = Vec::new();
    collect_leaves("", document, &mut entries);
    entries
}

fn collect_leaves<'a>(
    prefix: &str,
    object: &'a Map<String, Value>,
    entries: &mut Vec<(String, &'a Value)>,
) {
    for (name, value) in object {
        let path = join_path(prefix, name);
        match value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => entries.push((path, value)),
            Value::Object(nested) => collect_leaves(&path, nested, entries),
            Value::Null | Value::Array(_) => {
                warn!(path = %path, kind = value_kind(value), "Unsupported value kind, skipping");
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rebuild a nested document from `(flat path, value)` pairs.
///
/// Intermediate objects are created on demand. A path whose walk runs into an
/// existing non-object value is dropped; the rest of the entries are still
/// assigned.
pub fn unflatten<I, K>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    let mut document = Map::new();
    for (path, value) in entries {
        let path = path.as_ref();
        if let Err(segment) = assign(&mut document, path, value) {
            debug!(path, segment = %segment, "Path collides with an existing leaf, skipping");
        }
    }
    document
}

/// Assign `value` at `path`, returning the colliding segment on conflict.
fn assign(document: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), String> {
    let mut segments = split_path(path);
    let leaf = segments.pop().unwrap_or(path);

    let mut current = document;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(nested) => nested,
            _ => return Err(segment.to_string()),
        };
    }

    current.insert(leaf.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn sorted_paths(value: Value) -> Vec<String> {
        let mut paths = flatten(&object(value));
        paths.sort();
        paths
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&Map::new()).is_empty());
    }

    #[test]
    fn test_flatten_single_field() {
        assert_eq!(sorted_paths(json!({"field": true})), vec!["field"]);
    }

    #[test]
    fn test_flatten_siblings() {
        assert_eq!(
            sorted_paths(json!({"field": true, "other": false})),
            vec!["field", "other"]
        );
    }

    #[test]
    fn test_flatten_nested() {
        assert_eq!(
            sorted_paths(json!({"field": true, "other": {"field": true}})),
            vec!["field", "other.field"]
        );
    }

    #[test]
    fn test_flatten_deeply_nested() {
        let doc = json!({
            "field": true,
            "other": {
                "field": true,
                "nested": {"field": true}
            }
        });
        assert_eq!(
            sorted_paths(doc),
            vec!["field", "other.field", "other.nested.field"]
        );
    }

    #[test]
    fn test_flatten_scalar_kinds() {
        let doc = json!({"flag": false, "count": 3, "ratio": 0.5, "name": "x"});
        assert_eq!(sorted_paths(doc), vec!["count", "flag", "name", "ratio"]);
    }

    #[test]
    fn test_flatten_skips_unsupported_kinds() {
        let doc = json!({"tags": ["a", "b"], "missing": null, "kept": "yes"});
        assert_eq!(sorted_paths(doc), vec!["kept"]);
    }

    #[test]
    fn test_flatten_empty_object_has_no_leaves() {
        let doc = json!({"empty": {}, "leaf": 1});
        assert_eq!(sorted_paths(doc), vec!["leaf"]);
    }

    #[test]
    fn test_flatten_independent_of_key_order() {
        let a: Value =
            serde_json::from_str(r#"{"b": {"y": 1, "x": 2}, "a": true, "c": "z"}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"c": "z", "a": true, "b": {"x": 2, "y": 1}}"#).unwrap();
        assert_eq!(sorted_paths(a), sorted_paths(b));
    }

    #[test]
    fn test_flatten_entries_keep_values() {
        let doc = object(json!({"metadata": {"title": "Title"}}));
        let entries = flatten_entries(&doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "metadata.title");
        assert_eq!(entries[0].1, &json!("Title"));
    }

    #[test]
    fn test_unflatten_simple() {
        let doc = unflatten([("field", json!(true))]);
        assert_eq!(Value::Object(doc), json!({"field": true}));
    }

    #[test]
    fn test_unflatten_nested() {
        let doc = unflatten([("field.other", json!(true))]);
        assert_eq!(Value::Object(doc), json!({"field": {"other": true}}));
    }

    #[test]
    fn test_unflatten_mixed_depths() {
        let doc = unflatten([
            ("path", json!("url")),
            ("metadata.title", json!("Title")),
            ("metadata.tags", json!(["tag1", "tag2"])),
            ("metadata.author.name", json!("John Doe")),
        ]);
        assert_eq!(
            Value::Object(doc),
            json!({
                "path": "url",
                "metadata": {
                    "title": "Title",
                    "tags": ["tag1", "tag2"],
                    "author": {"name": "John Doe"}
                }
            })
        );
    }

    #[test]
    fn test_unflatten_skips_colliding_path() {
        let doc = unflatten([
            ("meta", json!("leaf")),
            ("meta.title", json!("Title")),
            ("other", json!(1)),
        ]);
        assert_eq!(Value::Object(doc), json!({"meta": "leaf", "other": 1}));
    }

    #[test]
    fn test_unflatten_skips_collision_at_last_intermediate() {
        let doc = unflatten([("a.b", json!(1)), ("a.b.c", json!(2))]);
        assert_eq!(Value::Object(doc), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_unflatten_empty() {
        let entries: Vec<(String, Value)> = Vec::new();
        assert!(unflatten(entries).is_empty());
    }

    #[test]
    fn test_round_trip() {
        let original = json!({
            "path": "url",
            "score": 4.5,
            "published": true,
            "metadata": {
                "title": "Title",
                "author": {"name": "John Doe", "age": 42}
            }
        });
        let map = object(original.clone());
        let rebuilt = unflatten(
            flatten_entries(&map)
                .into_iter()
                .map(|(path, value)| (path, value.clone())),
        );
        assert_eq!(Value::Object(rebuilt), original);
    }

    #[test]
    fn test_join_and_split() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a.b", "c"), "a.b.c");
        assert_eq!(split_path("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(split_path("a.b.c").join("."), "a.b.c");
    }
}
