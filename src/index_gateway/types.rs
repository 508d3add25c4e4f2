use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One action in a `_bulk` request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    Index { id: String, source: Value },
    Update { id: String, partial_source: Value },
    Delete { id: String },
}

impl BulkOperation {
    /// Renders this operation as the two NDJSON lines the `_bulk` endpoint
    /// expects (action-and-meta line, then source line — omitted for
    /// deletes).
    pub fn to_ndjson_lines(&self, index: &str) -> Vec<String> {
        match self {
            BulkOperation::Index { id, source } => vec![
                serde_json::json!({ "index": { "_index": index, "_id": id } }).to_string(),
                source.to_string(),
            ],
            BulkOperation::Update { id, partial_source } => vec![
                serde_json::json!({ "update": { "_index": index, "_id": id } }).to_string(),
                serde_json::json!({ "doc": partial_source }).to_string(),
            ],
            BulkOperation::Delete { id } => vec![
                serde_json::json!({ "delete": { "_index": index, "_id": id } }).to_string(),
            ],
        }
    }
}

/// Response shape of a `_bulk` call, trimmed to what callers need (§4.4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub took: u64,
    pub errors: bool,
}

/// One hit from a `_search` (or scroll page) response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score")]
    pub score: f64,
    #[serde(rename = "_source")]
    pub source: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsSearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    pub hits: EsHits,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsHits {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsBulkItemResult {
    pub status: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsBulkItem {
    #[serde(alias = "index", alias = "update", alias = "delete")]
    pub result: Option<EsBulkItemResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EsBulkResponse {
    pub took: u64,
    pub errors: bool,
    #[serde(default)]
    #[allow(dead_code)]
    pub items: Vec<EsBulkItem>,
}
