//! Typed building blocks for the Elasticsearch-compatible `bool` query DSL.
//!
//! Each type knows how to render itself to the `serde_json::Value` shape
//! the index store expects; composing them through [`BoolQuery`] catches
//! malformed queries (wrong field type, missing boost) before they reach
//! the wire, instead of hand-assembling JSON inline at each call site.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct TermQuery {
    pub field: String,
    pub value: Value,
    pub boost: Option<f64>,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into(), boost: None }
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn to_value(&self) -> Value {
        let mut inner = json!({ "value": self.value });
        if let Some(boost) = self.boost {
            inner["boost"] = json!(boost);
        }
        json!({ "term": { self.field.clone(): inner } })
    }
}

#[derive(Debug, Clone)]
pub struct TermsQuery {
    pub field: String,
    pub values: Vec<Value>,
}

impl TermsQuery {
    pub fn to_value(&self) -> Value {
        json!({ "terms": { self.field.clone(): self.values } })
    }
}

#[derive(Debug, Clone)]
pub struct RangeQuery {
    pub field: String,
    pub gte: Option<Value>,
    pub lte: Option<Value>,
}

impl RangeQuery {
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), gte: Some(value.into()), lte: None }
    }

    pub fn to_value(&self) -> Value {
        let mut bounds = serde_json::Map::new();
        if let Some(gte) = &self.gte {
            bounds.insert("gte".to_string(), gte.clone());
        }
        if let Some(lte) = &self.lte {
            bounds.insert("lte".to_string(), lte.clone());
        }
        json!({ "range": { self.field.clone(): Value::Object(bounds) } })
    }
}

#[derive(Debug, Clone)]
pub struct ExistsQuery {
    pub field: String,
}

impl ExistsQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }

    pub fn to_value(&self) -> Value {
        json!({ "exists": { "field": self.field } })
    }
}

#[derive(Debug, Clone)]
pub struct WildcardQuery {
    pub field: String,
    pub pattern: String,
}

impl WildcardQuery {
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self { field: field.into(), pattern: pattern.into() }
    }

    pub fn to_value(&self) -> Value {
        json!({ "wildcard": { self.field.clone(): { "value": self.pattern } } })
    }
}

/// `more_like_this` over one field, seeded by `like_text`.
#[derive(Debug, Clone)]
pub struct MoreLikeThisQuery {
    pub fields: Vec<String>,
    pub like_text: String,
    pub min_doc_freq: u32,
    pub min_term_freq: u32,
    pub max_query_terms: u32,
    pub minimum_should_match: String,
    pub boost: Option<f64>,
}

impl MoreLikeThisQuery {
    pub fn to_value(&self) -> Value {
        let mut inner = json!({
            "fields": self.fields,
            "like": self.like_text,
            "min_doc_freq": self.min_doc_freq,
            "min_term_freq": self.min_term_freq,
            "max_query_terms": self.max_query_terms,
            "minimum_should_match": self.minimum_should_match,
            "include": true,
        });
        if let Some(boost) = self.boost {
            inner["boost"] = json!(boost);
        }
        json!({ "more_like_this": inner })
    }
}

/// A generic clause: anything that can render to a query `Value`. Using a
/// boxed closure-free enum keeps `BoolQuery`'s fields homogeneous without
/// forcing every leaf query through a shared trait object for no reason
/// beyond storage.
#[derive(Debug, Clone)]
pub enum Clause {
    Term(TermQuery),
    Terms(TermsQuery),
    Range(RangeQuery),
    Exists(ExistsQuery),
    Wildcard(WildcardQuery),
    MoreLikeThis(MoreLikeThisQuery),
    Raw(Value),
}

impl Clause {
    pub fn to_value(&self) -> Value {
        match self {
            Clause::Term(q) => q.to_value(),
            Clause::Terms(q) => q.to_value(),
            Clause::Range(q) => q.to_value(),
            Clause::Exists(q) => q.to_value(),
            Clause::Wildcard(q) => q.to_value(),
            Clause::MoreLikeThis(q) => q.to_value(),
            Clause::Raw(v) => v.clone(),
        }
    }
}

impl From<TermQuery> for Clause {
    fn from(q: TermQuery) -> Self {
        Clause::Term(q)
    }
}
impl From<TermsQuery> for Clause {
    fn from(q: TermsQuery) -> Self {
        Clause::Terms(q)
    }
}
impl From<RangeQuery> for Clause {
    fn from(q: RangeQuery) -> Self {
        Clause::Range(q)
    }
}
impl From<ExistsQuery> for Clause {
    fn from(q: ExistsQuery) -> Self {
        Clause::Exists(q)
    }
}
impl From<WildcardQuery> for Clause {
    fn from(q: WildcardQuery) -> Self {
        Clause::Wildcard(q)
    }
}
impl From<MoreLikeThisQuery> for Clause {
    fn from(q: MoreLikeThisQuery) -> Self {
        Clause::MoreLikeThis(q)
    }
}

/// The base skeleton shared by every query family (§4.5).
#[derive(Debug, Clone, Default)]
pub struct BoolQuery {
    pub must: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub should: Vec<Clause>,
    pub filter: Vec<Clause>,
}

impl BoolQuery {
    pub fn to_value(&self) -> Value {
        json!({
            "bool": {
                "must": self.must.iter().map(Clause::to_value).collect::<Vec<_>>(),
                "must_not": self.must_not.iter().map(Clause::to_value).collect::<Vec<_>>(),
                "should": self.should.iter().map(Clause::to_value).collect::<Vec<_>>(),
                "filter": self.filter.iter().map(Clause::to_value).collect::<Vec<_>>(),
            }
        })
    }

    /// Wraps this bool query in a full `_search` request body.
    pub fn into_search_body(self, source_fields: &[&str]) -> Value {
        json!({
            "query": self.to_value(),
            "_source": source_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_query_renders_value_and_optional_boost() {
        let q = TermQuery::new("is_merged", true);
        assert_eq!(q.to_value(), json!({ "term": { "is_merged": { "value": true } } }));

        let boosted = TermQuery::new("unique_id", "abc").with_boost(2.0);
        assert_eq!(
            boosted.to_value(),
            json!({ "term": { "unique_id": { "value": "abc", "boost": 2.0 } } })
        );
    }

    #[test]
    fn bool_query_groups_clauses_under_their_section() {
        let mut bq = BoolQuery::default();
        bq.must.push(RangeQuery::gte("log_level", 40000).into());
        bq.must_not.push(WildcardQuery::new("issue_type", "TI*").into());
        let value = bq.to_value();
        assert_eq!(value["bool"]["must"].as_array().unwrap().len(), 1);
        assert_eq!(value["bool"]["must_not"].as_array().unwrap().len(), 1);
    }
}
