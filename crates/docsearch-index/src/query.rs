//! Request adapter: field selection parsing and query execution.

use serde_json::{Map, Value};
use tracing::debug;

use docsearch_types::flatten;

use crate::error::IndexError;
use crate::searcher::{DocumentSearcher, SearchOptions, SearchResults};

/// Parse a field selection body.
///
/// An empty body selects every field, as does an object without any scalar
/// leaf. Otherwise the body is a JSON object
/// whose flattened leaf paths are the selected fields, e.g.
/// `{"title": true, "metadata": {"author": true}}` selects `title` and
/// `metadata.author`.
pub fn select_fields(body: &[u8]) -> Result<Option<Vec<String>>, IndexError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let document: Map<String, Value> =
        serde_json::from_slice(body).map_err(IndexError::RequestParse)?;
    let fields = flatten(&document);

    if fields.is_empty() {
        debug!("Field selection names no fields, searching every field");
    } else {
        debug!(fields = ?fields, "Parsed field selection");
    }
    Ok(Some(fields))
}

/// Run a match query over the selected fields, with match locations.
pub fn execute(
    searcher: &DocumentSearcher,
    query: &str,
    fields: Option<Vec<String>>,
    limit: usize,
) -> Result<SearchResults, IndexError> {
    let options = SearchOptions::new()
        .with_fields(fields)
        .with_limit(limit)
        .with_locations(true);
    searcher.search(query, &options)
}
