//! Hit records returned to clients.
//!
//! The engine layer produces [`EngineHit`]s with flat stored fields; a
//! [`HitRecord`] carries the same hit with the stored fields reassembled into
//! a nested document and the match locations grouped per field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use docsearch_types::unflatten;

/// Half-open byte range of a matched term in the stored field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: u64,
    pub end: u64,
}

impl Location {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// Term locations keyed by analyzed term.
pub type TermLocations = BTreeMap<String, Vec<Location>>;

/// Matches within one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFragment {
    pub field: String,
    pub locations: TermLocations,
}

/// One search hit as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub id: String,
    pub score: f32,
    pub fragments: Vec<MatchFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Map<String, Value>>,
}

/// Raw hit produced by the engine layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineHit {
    pub id: String,
    pub score: f32,
    /// Stored field values keyed by flat path
    pub fields: BTreeMap<String, Value>,
    /// Match locations keyed by flat path, then term
    pub locations: BTreeMap<String, TermLocations>,
}

/// Build the client record of an engine hit.
///
/// Fields without matches produce no fragment; an empty document is absent.
pub fn build_hit_record(hit: EngineHit) -> HitRecord {
    let fragments = hit
        .locations
        .into_iter()
        .filter(|(_, terms)| terms.values().any(|locations| !locations.is_empty()))
        .map(|(field, locations)| MatchFragment { field, locations })
        .collect();

    let document = unflatten(hit.fields);
    HitRecord {
        id: hit.id,
        score: hit.score,
        fragments,
        document: if document.is_empty() {
            None
        } else {
            Some(document)
        },
    }
}

impl From<EngineHit> for HitRecord {
    fn from(hit: EngineHit) -> Self {
        build_hit_record(hit)
    }
}
