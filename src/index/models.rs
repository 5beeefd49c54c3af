//! Index acknowledgement and search result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Acknowledgement returned by the engine for an indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexAck {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: u64,
    /// "created" or "updated"
    #[serde(default)]
    pub result: String,
}

/// Ranked search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Number of matches reported by the engine
    pub total: u64,
    pub results: Vec<SearchHit>,
}

/// One hit: the engine score merged with the stored document fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchHit {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Raw `_search` response, only the parts we read
#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    pub hits: RawHits,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHits {
    pub total: Option<RawTotal>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// `hits.total` is an object since Elasticsearch 7 and a bare number before
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTotal {
    Object { value: u64 },
    Count(u64),
}

impl RawTotal {
    pub fn value(&self) -> u64 {
        match self {
            RawTotal::Object { value } => *value,
            RawTotal::Count(count) => *count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHit {
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl From<RawSearchResponse> for SearchResult {
    fn from(raw: RawSearchResponse) -> Self {
        let results: Vec<SearchHit> = raw
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let mut fields = hit.source;
                fields.remove("score");
                SearchHit {
                    score: hit.score.unwrap_or(0.0),
                    fields,
                }
            })
            .collect();

        let total = raw
            .hits
            .total
            .map(|t| t.value())
            .unwrap_or(results.len() as u64);

        SearchResult { total, results }
    }
}
