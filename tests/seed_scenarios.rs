//! Black-box coverage of the end-to-end seed scenarios and cross-cutting
//! invariants enumerated in the testable-properties section of the design
//! doc. `IndexGateway` is a concrete `reqwest` client with no live cluster
//! in this test run, so scenarios that hinge on actual search hits are
//! exercised as close to the public surface as possible: pipeline-level
//! where the scenario's own precondition (empty message, transport
//! failure) already forces the zero-hit path, and at the
//! `similarity`/`ranker` function level — which the library exposes
//! publicly — where a scenario needs a concrete hit to reason about.

use prism::config::{AppConfig, EsConnectionConfig, SearchTuningConfig};
use prism::featurizer::NoDefectTypeModel;
use prism::index_gateway::IndexGateway;
use prism::message_bus::NullMessageBus;
use prism::model::{AnalyzerConfig, AnalyzerMode, Launch, Log, TestItem};
use prism::pipeline::{AnalyzerPipeline, SearchLogsPipeline, SearchLogsRequest, SuggestPipeline};
use prism::ranker::StubRanker;
use prism::similarity;

fn gateway() -> IndexGateway {
    IndexGateway::new(&EsConnectionConfig::default()).unwrap()
}

fn suggest_ctx() -> prism::log_preparation::SuggestLogContext {
    prism::log_preparation::SuggestLogContext {
        launch_id: 1,
        launch_name: "Launch 1".to_string(),
        test_item: 3,
        unique_id: "auto:3".to_string(),
        is_auto_analyzed: false,
    }
}

fn analyzer_config() -> AnalyzerConfig {
    AnalyzerConfig { analyzer_mode: AnalyzerMode::All, min_should_match: "80%".to_string(), min_doc_freq: 1, min_term_freq: 1, number_of_log_lines: -1 }
}

/// Scenario 1: no-hit search-logs. There is no live index store to return
/// an explicit zero-hit response from, so this drives the same observable
/// outcome (§7: "an error on one log is logged and that log is skipped")
/// via a transport failure instead — the caller-visible result is
/// identical: a well-formed, empty result list, never a raised error.
#[tokio::test]
async fn no_hit_search_logs_yields_empty_result() {
    let tuning = SearchTuningConfig::default();
    let gateway = gateway();
    let pipeline = SearchLogsPipeline::new(&gateway, &tuning);

    let request = SearchLogsRequest {
        launch_id: 1,
        launch_name: "Launch 1".to_string(),
        item_id: 3,
        project_id: 1,
        filtered_launch_ids: vec![1],
        log_messages: vec!["error".to_string()],
        log_lines: -1,
    };
    let results = pipeline.search_logs(&request).await;
    assert_eq!(results.len(), 0);
}

/// Scenario 2: empty message skips search entirely; result length 0.
#[tokio::test]
async fn empty_message_search_logs_yields_empty_result() {
    let tuning = SearchTuningConfig::default();
    let gateway = gateway();
    let pipeline = SearchLogsPipeline::new(&gateway, &tuning);

    let request = SearchLogsRequest {
        launch_id: 1,
        launch_name: "Launch 1".to_string(),
        item_id: 3,
        project_id: 1,
        filtered_launch_ids: vec![1],
        log_messages: vec![String::new()],
        log_lines: -1,
    };
    let results = pipeline.search_logs(&request).await;
    assert_eq!(results.len(), 0);
}

/// Scenario 2, suggest-path variant: an all-empty-message input also never
/// reaches the index store.
#[tokio::test]
async fn empty_message_suggest_yields_empty_result() {
    let gateway = gateway();
    let ranker = StubRanker::new(prism::featurizer::features::SUGGEST_FEATURE_IDS.to_vec());
    let defect_model = NoDefectTypeModel;
    let bus = NullMessageBus;
    let config = AppConfig::default();
    let pipeline = SuggestPipeline::new(&config, &gateway, &ranker, &defect_model, &bus);

    let logs = vec![Log { log_id: 1, message: String::new(), log_level: 40000 }];
    let results = pipeline.suggest(1, &suggest_ctx(), &logs, &analyzer_config(), 5).await;
    assert_eq!(results.len(), 0);
}

/// Scenario 3: below-similarity hit. A candidate whose message is
/// unrelated to the query falls under `SearchLogsMinSimilarity = 0.9`, so
/// the pipeline would exclude it — proven here at the similarity function
/// the pipeline calls internally, since asserting on the full pipeline
/// would require a live hit from the index store.
#[test]
fn below_similarity_hit_is_excluded() {
    let tuning = SearchTuningConfig { search_logs_min_similarity: 0.9, ..SearchTuningConfig::default() };
    let score = similarity::cosine_similarity(
        "error occurred once",
        "a completely different unrelated log line",
        tuning.min_word_length,
        tuning.max_query_terms as usize,
        None,
    );
    assert!(score < tuning.search_logs_min_similarity, "expected a low-similarity score, got {score}");
}

/// Scenario 4: above-similarity hit. Of two candidates, the one that
/// shares the query's wording exceeds the threshold and would be kept.
#[test]
fn above_similarity_hit_is_included() {
    let tuning = SearchTuningConfig { search_logs_min_similarity: 0.5, ..SearchTuningConfig::default() };

    let close = similarity::cosine_similarity(
        "error occurred once",
        "error occurred once again",
        tuning.min_word_length,
        tuning.max_query_terms as usize,
        None,
    );
    let far = similarity::cosine_similarity(
        "error occurred once",
        "totally unrelated text about something else",
        tuning.min_word_length,
        tuning.max_query_terms as usize,
        None,
    );
    assert!(close >= tuning.search_logs_min_similarity);
    assert!(far < tuning.search_logs_min_similarity);
}

/// Scenario 5 (match-score formula): `matchScore = round(prob * 100, 2)`,
/// as the suggest pipeline's result-selection step computes it (the step
/// itself is unit-tested directly in `pipeline::suggest`; this confirms
/// the formula a public `Ranker` implementation feeds it).
#[test]
fn suggest_single_hit_match_score_formula() {
    let ranker = StubRanker::new(prism::featurizer::features::SUGGEST_FEATURE_IDS.to_vec());
    let predictions = ranker.predict(&[vec![0.8]]);
    let prob = predictions.probabilities[0].1;
    let match_score = (prob * 100.0 * 100.0).round() / 100.0;
    assert_eq!(match_score, 80.0);
}

/// `analyzerMode = LAUNCH_NAME` scopes the analyze query to the request's
/// own launch_name (§8 invariant); proven against the query builder
/// directly since that's the unit actually responsible for the scoping.
#[test]
fn launch_name_mode_scopes_query_to_request_launch_name() {
    use prism::model::LogDocument;
    use prism::query_builder::build_analyze_query;

    let doc = LogDocument {
        launch_id: 7,
        launch_name: "nightly-regression".to_string(),
        test_item: 1,
        unique_id: "auto:1".to_string(),
        is_auto_analyzed: false,
        issue_type: String::new(),
        log_level: 40000,
        start_time: "2026-01-01T00:00:00Z".to_string(),
        message: "boom".to_string(),
        message_extended: "boom".to_string(),
        message_without_params_extended: "boom".to_string(),
        message_without_params_and_brackets: "boom".to_string(),
        detected_message: "boom".to_string(),
        detected_message_extended: "boom".to_string(),
        detected_message_without_params_extended: "boom".to_string(),
        detected_message_without_params_and_brackets: "boom".to_string(),
        detected_message_with_numbers: "boom".to_string(),
        stacktrace: String::new(),
        stacktrace_extended: String::new(),
        merged_small_logs: String::new(),
        only_numbers: String::new(),
        message_params: String::new(),
        urls: String::new(),
        paths: String::new(),
        found_exceptions_extended: String::new(),
        potential_status_codes: String::new(),
        is_merged: true,
        original_message: "boom".to_string(),
    };
    let config = AnalyzerConfig { analyzer_mode: AnalyzerMode::LaunchName, min_should_match: "80%".to_string(), min_doc_freq: 1, min_term_freq: 1, number_of_log_lines: -1 };
    let tuning = SearchTuningConfig::default();

    let query = build_analyze_query(&doc, &config, &tuning);
    let must = query["query"]["bool"]["must"].as_array().unwrap();
    assert!(must.iter().any(|clause| clause["term"]["launch_name"]["value"] == "nightly-regression"));
}

/// Ranking determinism (§8 invariant): identical inputs and model produce
/// an identical result list, including ordering and scores.
#[test]
fn ranking_determinism() {
    let ranker = StubRanker::new(prism::featurizer::features::ANALYZE_FEATURE_IDS.to_vec());
    let matrix = vec![vec![0.9, 0.2], vec![0.3, 0.7], vec![0.55, 0.1]];
    let first = ranker.predict(&matrix);
    let second = ranker.predict(&matrix);
    assert_eq!(first, second);
}

/// Analyze pipeline with no failing logs in the launch yields no results
/// (no index-store round trip required to observe this).
#[tokio::test]
async fn analyzer_pipeline_with_empty_launch_yields_no_results() {
    let gateway = gateway();
    let ranker = StubRanker::new(prism::featurizer::features::ANALYZE_FEATURE_IDS.to_vec());
    let defect_model = NoDefectTypeModel;
    let config = AppConfig::default();
    let pipeline = AnalyzerPipeline::new(&config, &gateway, &ranker, &defect_model);

    let launch = Launch {
        launch_id: 1,
        launch_name: "nightly".to_string(),
        project: 42,
        analyzer_config: analyzer_config(),
        test_items: vec![TestItem { test_item_id: 1, unique_id: "auto:1".to_string(), is_auto_analyzed: false, issue_type: String::new(), logs: vec![] }],
    };
    let results = pipeline.analyze(42, &launch).await;
    assert_eq!(results.len(), 0);
}
