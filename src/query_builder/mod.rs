//! Assembles the three query families over [`LogDocument`]s (§4.5).

mod types;

pub use types::{
    BoolQuery, Clause, ExistsQuery, MoreLikeThisQuery, RangeQuery, TermQuery, TermsQuery,
    WildcardQuery,
};

use serde_json::Value;

use crate::config::SearchTuningConfig;
use crate::constants::ERROR_LEVEL;
use crate::model::{AnalyzerConfig, AnalyzerMode, LogDocument};

/// Pushes the two clauses every query family shares: `log_level >=
/// ERROR_LEVEL` and `exists(issue_type)`.
fn base_skeleton() -> BoolQuery {
    let mut query = BoolQuery::default();
    query.must.push(RangeQuery::gte("log_level", ERROR_LEVEL).into());
    query.must.push(ExistsQuery::new("issue_type").into());
    query
}

fn more_like_this(field: &str, like_text: &str, tuning: &SearchTuningConfig, min_should_match: &str) -> MoreLikeThisQuery {
    MoreLikeThisQuery {
        fields: vec![field.to_string()],
        like_text: like_text.to_string(),
        min_doc_freq: tuning.min_doc_freq,
        min_term_freq: tuning.min_term_freq,
        max_query_terms: tuning.max_query_terms,
        minimum_should_match: min_should_match.to_string(),
        boost: None,
    }
}

/// Builds the analyze-mode query (auto-classification, §4.5).
pub fn build_analyze_query(
    query_doc: &LogDocument,
    analyzer_config: &AnalyzerConfig,
    tuning: &SearchTuningConfig,
) -> Value {
    let mut query = base_skeleton();

    query.must.push(TermQuery::new("is_merged", true).into());
    let min_should_match = format!("5<{}", analyzer_config.min_should_match);
    let mlt = more_like_this("message", &query_doc.message, tuning, &min_should_match);
    query.must.push(mlt.into());

    query.must_not.push(WildcardQuery::new("issue_type", "TI*").into());
    query.must_not.push(WildcardQuery::new("issue_type", "ti*").into());

    query
        .should
        .push(TermQuery::new("unique_id", query_doc.unique_id.clone()).with_boost(tuning.boost_unique_id.abs()).into());
    query.should.push(
        TermQuery::new("is_auto_analyzed", tuning.boost_aa < 0.0)
            .with_boost(tuning.boost_aa.abs())
            .into(),
    );

    match analyzer_config.analyzer_mode {
        AnalyzerMode::LaunchName => {
            query.must.push(TermQuery::new("launch_name", query_doc.launch_name.clone()).into());
        }
        AnalyzerMode::CurrentLaunch => {
            query.must.push(TermQuery::new("launch_id", query_doc.launch_id).into());
        }
        AnalyzerMode::All => {
            query.should.push(
                TermQuery::new("launch_name", query_doc.launch_name.clone())
                    .with_boost(tuning.boost_launch.abs())
                    .into(),
            );
        }
    }

    query.into_search_body(&["test_item", "issue_type", "unique_id", "is_auto_analyzed", "launch_name"])
}

/// Which field triple a suggest query variant uses (§4.5, §4.10 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestFieldVariant {
    Extended,
    WithoutParamsExtended,
    WithoutParamsAndBrackets,
}

impl SuggestFieldVariant {
    fn fields(self) -> (&'static str, &'static str, &'static str) {
        match self {
            SuggestFieldVariant::Extended => {
                ("message_extended", "detected_message_extended", "stacktrace_extended")
            }
            SuggestFieldVariant::WithoutParamsExtended => (
                "message_without_params_extended",
                "detected_message_without_params_extended",
                "stacktrace_extended",
            ),
            SuggestFieldVariant::WithoutParamsAndBrackets => (
                "message_without_params_and_brackets",
                "detected_message_without_params_and_brackets",
                "stacktrace_extended",
            ),
        }
    }
}

/// Builds one of the three suggest-query variants over `query_doc`
/// (§4.5, §4.10 step 3).
pub fn build_suggest_query(
    query_doc: &LogDocument,
    variant: SuggestFieldVariant,
    analyzer_config: &AnalyzerConfig,
    tuning: &SearchTuningConfig,
) -> Value {
    let (message_field, det_mes_field, stacktrace_field) = variant.fields();
    let message_text = query_doc.field(message_field);

    let mut query = base_skeleton();

    if message_text.trim().is_empty() {
        query.should.push(more_like_this(
            "merged_small_logs",
            query_doc.field("merged_small_logs"),
            tuning,
            &tuning.min_should_match,
        ).into());
        query.must_not.push(WildcardQuery::new(message_field, "*").into());
        return query.into_search_body(&["test_item", "issue_type", "start_time"]);
    }

    let det_mes_mlt = more_like_this(det_mes_field, query_doc.field(det_mes_field), tuning, &tuning.min_should_match)
        .to_value();
    query.must.push(Clause::Raw(boosted(det_mes_mlt, 4.0)));

    let stacktrace_text = query_doc.field(stacktrace_field);
    if !stacktrace_text.trim().is_empty() {
        if analyzer_config.wants_full_message() {
            let stacktrace_mlt =
                more_like_this(stacktrace_field, stacktrace_text, tuning, &tuning.min_should_match).to_value();
            query.must.push(Clause::Raw(boosted(stacktrace_mlt, 2.0)));
        } else {
            let stacktrace_mlt =
                more_like_this(stacktrace_field, stacktrace_text, tuning, &tuning.min_should_match).to_value();
            query.should.push(Clause::Raw(boosted(stacktrace_mlt, 1.0)));

            let without_params = "detected_message_without_params_extended";
            let mlt = more_like_this(without_params, query_doc.field(without_params), tuning, &tuning.min_should_match)
                .to_value();
            query.should.push(Clause::Raw(boosted(mlt, 1.0)));
        }
    } else {
        query.must_not.push(WildcardQuery::new(stacktrace_field, "*").into());
    }

    let merged = more_like_this("merged_small_logs", query_doc.field("merged_small_logs"), tuning, "80%").to_value();
    query.should.push(Clause::Raw(boosted(merged, 0.5)));

    for field in ["only_numbers", "message_params", "urls", "paths"] {
        let text = query_doc.field(field);
        if text.trim().is_empty() {
            continue;
        }
        let mlt = more_like_this(field, text, tuning, "1").to_value();
        query.should.push(Clause::Raw(boosted(mlt, 4.0)));
    }

    for field in ["found_exceptions_extended", "potential_status_codes"] {
        let text = query_doc.field(field);
        if text.trim().is_empty() {
            continue;
        }
        let mlt = more_like_this(field, text, tuning, "1").to_value();
        query.should.push(Clause::Raw(boosted(mlt, 4.0)));
    }

    query.into_search_body(&[
        "test_item",
        "issue_type",
        "start_time",
        "detected_message_with_numbers",
        "stacktrace",
        "merged_small_logs",
        "unique_id",
        "is_auto_analyzed",
        "launch_name",
    ])
}

fn boosted(mut value: Value, boost: f64) -> Value {
    if let Some(inner) = value.get_mut("more_like_this") {
        inner["boost"] = Value::from(boost);
    }
    value
}

/// Builds the `search-logs` query: find historically similar logs across
/// launches, excluding the requesting test item itself (§4.5).
pub fn build_search_logs_query(
    query_doc: &LogDocument,
    test_item_id: i64,
    filtered_launch_ids: &[i64],
    tuning: &SearchTuningConfig,
) -> Value {
    let mut query = base_skeleton();

    query.must_not.push(TermQuery::new("test_item", test_item_id).into());
    query.must.push(TermQuery::new("is_merged", true).into());
    query.must.push(Clause::Raw(serde_json::json!({
        "bool": {
            "should": [
                WildcardQuery::new("issue_type", "TI*").to_value(),
                WildcardQuery::new("issue_type", "ti*").to_value(),
            ]
        }
    })));
    query.must.push(
        TermsQuery {
            field: "launch_id".to_string(),
            values: filtered_launch_ids.iter().map(|id| Value::from(*id)).collect(),
        }
        .into(),
    );
    query.must.push(
        more_like_this("message", &query_doc.message, tuning, &tuning.search_logs_min_should_match).into(),
    );

    query.should.push(TermQuery::new("is_auto_analyzed", false).with_boost(1.0).into());

    query.into_search_body(&["test_item", "issue_type", "unique_id", "is_auto_analyzed", "launch_name"])
}
