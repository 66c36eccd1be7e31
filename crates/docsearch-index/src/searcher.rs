//! Field-scoped match search over a finalized index.
//!
//! The query text is analyzed with the analyzer of every field in scope and
//! becomes a disjunction of term queries. Hits carry the stored fields and,
//! optionally, the byte ranges of every matched term.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, IndexReader, TantivyDocument, Term};
use tracing::{debug, info};

use docsearch_types::PATH_SEPARATOR;

use crate::document::format_date;
use crate::error::IndexError;
use crate::hit::{build_hit_record, EngineHit, HitRecord, Location, TermLocations};
use crate::index::{open_index, open_reader};
use crate::schema::{FieldMapping, IndexField, IndexSchema};

/// Default maximum number of hits
const DEFAULT_LIMIT: usize = 10;

/// Search options for scoping and limiting results.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Selected field paths (None or empty = every field)
    pub fields: Option<Vec<String>>,
    /// Maximum hits to return
    pub limit: usize,
    /// Compute match locations per field and term
    pub include_locations: bool,
    /// Restrict hits to one document type
    pub doc_type: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self {
            fields: None,
            limit: DEFAULT_LIMIT,
            include_locations: false,
            doc_type: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_locations(mut self, include: bool) -> Self {
        self.include_locations = include;
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Effective field selection; an empty list selects everything.
    fn selection(&self) -> Option<&[String]> {
        self.fields.as_deref().filter(|fields| !fields.is_empty())
    }
}

/// Results of one search.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Number of matching documents
    pub total: usize,
    /// Time spent in the engine
    pub took: Duration,
    /// Hits in relevance order
    pub hits: Vec<HitRecord>,
}

impl SearchResults {
    fn empty(took: Duration) -> Self {
        Self {
            total: 0,
            took,
            hits: Vec::new(),
        }
    }
}

/// True when `path` is selected directly or through one of its ancestors.
fn is_selected(selection: &[String], path: &str) -> bool {
    selection.iter().any(|selected| {
        path == selected
            || (path.starts_with(selected.as_str())
                && path[selected.len()..].starts_with(PATH_SEPARATOR))
    })
}

fn search_error(e: impl std::fmt::Display) -> IndexError {
    IndexError::Search(e.to_string())
}

/// Searcher over a finalized index.
pub struct DocumentSearcher {
    index: Index,
    reader: IndexReader,
    schema: IndexSchema,
    path: PathBuf,
}

impl DocumentSearcher {
    /// Open the finalized index at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let (index, schema) = open_index(path)?;
        let reader = open_reader(&index)?;

        info!(
            path = ?path,
            documents = reader.searcher().num_docs(),
            "Opened index for search"
        );

        Ok(Self {
            index,
            reader,
            schema,
            path: path.to_path_buf(),
        })
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of indexed documents
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Text fields a query targets, across document types unless
    /// `doc_type` restricts them.
    fn scope(&self, selection: Option<&[String]>, doc_type: Option<&str>) -> Vec<&IndexField> {
        let in_type = |f: &&IndexField| doc_type.map_or(true, |t| f.doc_type == t);

        let Some(selection) = selection else {
            return self.schema.text_fields().filter(in_type).collect();
        };

        for path in selection {
            let single = std::slice::from_ref(path);
            if !self.schema.fields().any(|f| is_selected(single, &f.path)) {
                debug!(path = %path, "Selected path has no index field, ignored");
            }
        }

        self.schema
            .fields()
            .filter(in_type)
            .filter(|f| is_selected(selection, &f.path))
            .filter(|f| {
                if !f.mapping.is_text() {
                    debug!(
                        doc_type = %f.doc_type,
                        path = %f.path,
                        "Selected field is not searchable, ignored"
                    );
                }
                f.mapping.is_text()
            })
            .collect()
    }

    /// Analyze `text` with the analyzer of `field`.
    fn analyze(&self, field: Field, text: &str) -> Result<Vec<(String, Location)>, IndexError> {
        let mut analyzer = self.index.tokenizer_for_field(field).map_err(search_error)?;
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            let token = stream.token();
            tokens.push((
                token.text.clone(),
                Location::new(token.offset_from as u64, token.offset_to as u64),
            ));
        }
        Ok(tokens)
    }

    fn with_type_filter(&self, query: Box<dyn Query>, doc_type: Option<&str>) -> Box<dyn Query> {
        match doc_type {
            Some(doc_type) => {
                let type_term = Term::from_field_text(self.schema.doc_type, doc_type);
                let type_query = TermQuery::new(type_term, IndexRecordOption::Basic);
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, query),
                    (Occur::Must, Box::new(type_query)),
                ]))
            }
            None => query,
        }
    }

    /// Match `query` against the fields selected by `options`.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults, IndexError> {
        let start = Instant::now();
        let selection = options.selection();
        let scope = self.scope(selection, options.doc_type.as_deref());

        // Query terms per scoped field
        let mut field_terms: Vec<(&IndexField, BTreeSet<String>)> = Vec::new();
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for index_field in scope {
            let terms: BTreeSet<String> = self
                .analyze(index_field.field, query)?
                .into_iter()
                .map(|(term, _)| term)
                .collect();
            for term in &terms {
                let term = Term::from_field_text(index_field.field, term);
                clauses.push((
                    Occur::Should,
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqsAndPositions)),
                ));
            }
            if !terms.is_empty() {
                field_terms.push((index_field, terms));
            }
        }

        if clauses.is_empty() {
            debug!(query, "Query has no searchable terms");
            return Ok(SearchResults::empty(start.elapsed()));
        }

        let query_obj =
            self.with_type_filter(Box::new(BooleanQuery::new(clauses)), options.doc_type.as_deref());
        let results = self.collect(query_obj.as_ref(), options, selection, &field_terms, start)?;

        info!(
            query,
            total = results.total,
            results = results.hits.len(),
            took_ms = results.took.as_millis() as u64,
            "Search complete"
        );
        Ok(results)
    }

    /// Documents whose date field at `path` lies in `[start, end]`.
    pub fn search_date_range(
        &self,
        path: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        options: &SearchOptions,
    ) -> Result<SearchResults, IndexError> {
        let began = Instant::now();
        let fields: Vec<Field> = self
            .schema
            .fields_at(path)
            .filter(|f| f.mapping == FieldMapping::Date)
            .map(|f| f.field)
            .collect();
        if fields.is_empty() {
            debug!(path, "No date field at path");
            return Ok(SearchResults::empty(began.elapsed()));
        }

        let start = tantivy::DateTime::from_timestamp_micros(start.timestamp_micros());
        let end = tantivy::DateTime::from_timestamp_micros(end.timestamp_micros());
        let clauses: Vec<(Occur, Box<dyn Query>)> = fields
            .into_iter()
            .map(|field| {
                let lower = Term::from_field_date(field, start);
                let upper = Term::from_field_date(field, end);
                let range: Box<dyn Query> =
                    Box::new(RangeQuery::new(Bound::Included(lower), Bound::Included(upper)));
                (Occur::Should, range)
            })
            .collect();
        let range = BooleanQuery::new(clauses);
        let query = self.with_type_filter(Box::new(range), options.doc_type.as_deref());

        let results = self.collect(query.as_ref(), options, options.selection(), &[], began)?;
        info!(
            path,
            total = results.total,
            results = results.hits.len(),
            "Date range search complete"
        );
        Ok(results)
    }

    fn collect(
        &self,
        query: &dyn Query,
        options: &SearchOptions,
        selection: Option<&[String]>,
        field_terms: &[(&IndexField, BTreeSet<String>)],
        start: Instant,
    ) -> Result<SearchResults, IndexError> {
        let searcher = self.reader.searcher();

        if options.limit == 0 {
            let total = searcher.search(query, &Count).map_err(search_error)?;
            return Ok(SearchResults {
                total,
                took: start.elapsed(),
                hits: Vec::new(),
            });
        }

        let (top_docs, total) = searcher
            .search(query, &(TopDocs::with_limit(options.limit), Count))
            .map_err(search_error)?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let hit = self.engine_hit(&searcher, address, score, options, selection, field_terms)?;
            hits.push(build_hit_record(hit));
        }

        Ok(SearchResults {
            total,
            took: start.elapsed(),
            hits,
        })
    }

    fn engine_hit(
        &self,
        searcher: &tantivy::Searcher,
        address: DocAddress,
        score: f32,
        options: &SearchOptions,
        selection: Option<&[String]>,
        field_terms: &[(&IndexField, BTreeSet<String>)],
    ) -> Result<EngineHit, IndexError> {
        let doc: TantivyDocument = searcher.doc(address).map_err(search_error)?;

        let id = doc
            .get_first(self.schema.id)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let doc_type = doc
            .get_first(self.schema.doc_type)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let mut fields = BTreeMap::new();
        for index_field in self.schema.fields_of(&doc_type) {
            if !index_field.mapping.is_stored() {
                continue;
            }
            if let Some(selection) = selection {
                if !is_selected(selection, &index_field.path) {
                    continue;
                }
            }
            let Some(value) = doc.get_first(index_field.field) else {
                continue;
            };
            let stored = match &index_field.mapping {
                FieldMapping::Date => value.as_datetime().and_then(format_date),
                _ => value.as_str().map(|s| s.to_string()),
            };
            if let Some(stored) = stored {
                fields.insert(index_field.path.clone(), JsonValue::String(stored));
            }
        }

        let mut locations = BTreeMap::new();
        if options.include_locations {
            for (index_field, terms) in field_terms {
                if index_field.doc_type != doc_type {
                    continue;
                }
                let Some(text) = doc.get_first(index_field.field).and_then(|v| v.as_str()) else {
                    continue;
                };
                let mut matched = TermLocations::new();
                for (token, location) in self.analyze(index_field.field, text)? {
                    if terms.contains(&token) {
                        matched.entry(token).or_default().push(location);
                    }
                }
                if !matched.is_empty() {
                    locations.insert(index_field.path.clone(), matched);
                }
            }
        }

        debug!(id = %id, doc_type = %doc_type, score, "Collected hit");
        Ok(EngineHit {
            id,
            score,
            fields,
            locations,
        })
    }
}
