//! Orchestrates a single suggest request: find historically similar
//! failures for one test item, ranked by learned probability (§4.10).

use std::collections::HashSet;

use crate::config::{AppConfig, SearchTuningConfig};
use crate::constants::{ERROR_LEVEL, SIMILARITY_DEDUP_THRESHOLD, SUGGEST_THRESHOLD};
use crate::featurizer::{self, features::SUGGEST_FEATURE_IDS, DefectTypeModel, FeaturizerOptions, QueryHits};
use crate::index_gateway::IndexGateway;
use crate::log_merger;
use crate::log_preparation::{self, SuggestLogContext};
use crate::message_bus::{self, MessageBus, StatsInfoMessage};
use crate::model::{extract_real_id, AnalyzerConfig, Log, StoredLog};
use crate::query_builder::{self, SuggestFieldVariant};
use crate::ranker::Ranker;
use crate::similarity;
use crate::text;

/// Per-result metadata accompanying a suggested match (§4.10 step 7).
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestAnalysisResult {
    pub test_item: i64,
    pub issue_type: String,
    pub relevant_item: i64,
    pub relevant_log_id: String,
    pub match_score: f64,
    pub es_score: f64,
    pub es_position: usize,
    pub model_feature_names: Vec<String>,
    pub model_feature_values: Vec<f64>,
    pub model_info: Vec<String>,
    pub result_position: usize,
    pub used_log_lines: i32,
    pub min_should_match: String,
}

/// One ranked candidate before the dedup/threshold/format pass.
struct Candidate {
    test_item_id: i64,
    issue_type: String,
    relevant_log_id: String,
    es_score: f64,
    es_position: usize,
    probability: f64,
    start_time: String,
    feature_values: Vec<f64>,
    detected_message_with_numbers: String,
    stacktrace: String,
    merged_small_logs: String,
}

/// Sorts by `(probability DESC, start_time DESC)` (§4.10 step 5).
fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.probability.partial_cmp(&a.probability).unwrap().then_with(|| b.start_time.cmp(&a.start_time))
    });
}

/// Pairwise dedup: for candidates sharing an issue_type, if all three
/// similarity fields are `>= SIMILARITY_DEDUP_THRESHOLD` against an
/// already-kept candidate, drop it (§4.10 step 6). `candidates` must
/// already be sorted — the later (lower-ranked) duplicate is dropped.
/// Idempotent: running this again on its own output changes nothing,
/// since no two kept candidates can be mutual duplicates.
fn dedup_candidates(candidates: Vec<Candidate>, min_word_length: usize, max_query_terms: usize) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::new();
    'outer: for candidate in candidates {
        if candidate.issue_type.is_empty() {
            continue;
        }
        for existing in &kept {
            if existing.issue_type != candidate.issue_type {
                continue;
            }
            let dm_sim = similarity::cosine_similarity(
                &existing.detected_message_with_numbers,
                &candidate.detected_message_with_numbers,
                min_word_length,
                max_query_terms,
                None,
            );
            let st_sim = similarity::cosine_similarity(&existing.stacktrace, &candidate.stacktrace, min_word_length, max_query_terms, None);
            let merged_sim = similarity::cosine_similarity(
                &existing.merged_small_logs,
                &candidate.merged_small_logs,
                min_word_length,
                max_query_terms,
                None,
            );
            if dm_sim >= SIMILARITY_DEDUP_THRESHOLD && st_sim >= SIMILARITY_DEDUP_THRESHOLD && merged_sim >= SIMILARITY_DEDUP_THRESHOLD {
                continue 'outer;
            }
        }
        kept.push(candidate);
    }
    kept
}

/// Emits up to `num_items` results with `probability >= SUGGEST_THRESHOLD`
/// (§4.10 step 7), in the order `candidates` is already sorted in.
#[allow(clippy::too_many_arguments)]
fn select_results(
    candidates: Vec<Candidate>,
    num_items: usize,
    test_item: i64,
    feature_names: &[String],
    model_info: &[String],
    used_log_lines: i32,
    min_should_match: &str,
) -> Vec<SuggestAnalysisResult> {
    let mut results = Vec::new();
    for (result_position, candidate) in candidates.into_iter().enumerate() {
        if results.len() >= num_items {
            break;
        }
        if candidate.probability < SUGGEST_THRESHOLD {
            continue;
        }
        results.push(SuggestAnalysisResult {
            test_item,
            issue_type: candidate.issue_type,
            relevant_item: candidate.test_item_id,
            relevant_log_id: candidate.relevant_log_id,
            match_score: (candidate.probability * 100.0 * 100.0).round() / 100.0,
            es_score: candidate.es_score,
            es_position: candidate.es_position,
            model_feature_names: feature_names.to_vec(),
            model_feature_values: candidate.feature_values,
            model_info: model_info.to_vec(),
            result_position,
            used_log_lines,
            min_should_match: min_should_match.to_string(),
        });
    }
    results
}

pub struct SuggestPipeline<'a> {
    pub index_gateway: &'a IndexGateway,
    pub ranker: &'a dyn Ranker,
    pub defect_type_model: &'a dyn DefectTypeModel,
    pub message_bus: &'a dyn MessageBus,
    pub tuning: &'a SearchTuningConfig,
}

impl<'a> SuggestPipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        index_gateway: &'a IndexGateway,
        ranker: &'a dyn Ranker,
        defect_type_model: &'a dyn DefectTypeModel,
        message_bus: &'a dyn MessageBus,
    ) -> Self {
        Self { index_gateway, ranker, defect_type_model, message_bus, tuning: &config.search_tuning }
    }

    /// Runs a suggest request for one test item's raw log messages against
    /// `project`'s index, returning up to `num_items` results.
    #[tracing::instrument(skip(self, ctx, raw_logs, analyzer_config))]
    pub async fn suggest(
        &self,
        project: i64,
        ctx: &SuggestLogContext,
        raw_logs: &[Log],
        analyzer_config: &AnalyzerConfig,
        num_items: usize,
    ) -> Vec<SuggestAnalysisResult> {
        // Step 1: drop duplicate input logs by normalized message.
        let mut seen_messages: HashSet<String> = HashSet::new();
        let deduped_logs: Vec<&Log> = raw_logs
            .iter()
            .filter(|log| seen_messages.insert(text::sanitize_text(&log.message)))
            .collect();

        // Step 2: prepare & merge, keep only error-level documents.
        let raw_docs: Vec<StoredLog> = deduped_logs
            .iter()
            .map(|log| StoredLog {
                id: log.log_id.to_string(),
                document: log_preparation::prepare_log_document_for_suggest(ctx, log, analyzer_config),
            })
            .filter(|stored| stored.document.log_level >= ERROR_LEVEL)
            .collect();
        if raw_docs.is_empty() {
            return Vec::new();
        }

        let merge_outcome = log_merger::merge_logs(&raw_docs);
        let merged_docs: Vec<_> = merge_outcome.new_documents.iter().filter(|d| d.document.is_merged).collect();
        if merged_docs.is_empty() {
            return Vec::new();
        }

        let index = project.to_string();

        // Step 3: stable order extended -> without-params-extended ->
        // without-params-and-brackets, three queries per merged log.
        let variants = [
            SuggestFieldVariant::Extended,
            SuggestFieldVariant::WithoutParamsExtended,
            SuggestFieldVariant::WithoutParamsAndBrackets,
        ];

        let mut query_docs = Vec::new();
        let mut all_hits = Vec::new();
        for merged in &merged_docs {
            for variant in variants {
                let query = query_builder::build_suggest_query(&merged.document, variant, analyzer_config, self.tuning);
                match self.index_gateway.search(&index, query).await {
                    Ok(hits) => {
                        query_docs.push(merged.document.clone());
                        all_hits.push(hits);
                    }
                    Err(err) => {
                        tracing::warn!(test_item = ctx.test_item, error = %err, "suggest search failed for one variant, skipping");
                    }
                }
            }
        }

        let pairs: Vec<QueryHits<'_>> =
            query_docs.iter().zip(all_hits.iter()).map(|(doc, hits)| QueryHits { query_doc: doc, hits }).collect();

        // Step 4: featurize, predict.
        let options = FeaturizerOptions {
            min_word_length: self.tuning.min_word_length,
            max_query_terms: self.tuning.max_query_terms as usize,
            word_weights: None,
            defect_type_model: self.defect_type_model,
        };
        let feature_output = featurizer::featurize(&pairs, SUGGEST_FEATURE_IDS, &options);
        if feature_output.feature_matrix.is_empty() {
            return Vec::new();
        }

        let predictions = self.ranker.predict(&feature_output.feature_matrix);
        let model_info = self.ranker.model_info();
        let feature_names: Vec<String> = SUGGEST_FEATURE_IDS.iter().map(|f| format!("{f:?}")).collect();

        // Build one candidate per (test_item, best hit), carrying its
        // position in the original hit list (esPosition) and score.
        let mut candidates = Vec::new();
        for (row_idx, &test_item_id) in feature_output.test_item_ids.iter().enumerate() {
            let probability = predictions.probabilities.get(row_idx).map(|(_, p)| *p).unwrap_or(0.0);
            let mut best: Option<(usize, f64, usize)> = None;
            for (hit_list_idx, hits) in all_hits.iter().enumerate() {
                for (position, hit) in hits.iter().enumerate() {
                    let Some(hit_test_item) = hit.source.get("test_item").and_then(|v| v.as_i64()) else { continue };
                    if hit_test_item != test_item_id {
                        continue;
                    }
                    if best.map(|(_, score, _)| hit.score > score).unwrap_or(true) {
                        best = Some((hit_list_idx, hit.score, position));
                    }
                }
            }
            let Some((hit_list_idx, es_score, es_position)) = best else { continue };
            let source = &all_hits[hit_list_idx][es_position];
            let issue_type = source.source.get("issue_type").and_then(|v| v.as_str()).unwrap_or("").to_string();
            if issue_type.is_empty() {
                continue;
            }
            let start_time = source.source.get("start_time").and_then(|v| v.as_str()).unwrap_or("").to_string();

            candidates.push(Candidate {
                test_item_id,
                issue_type,
                relevant_log_id: extract_real_id(&source.id).to_string(),
                es_score,
                es_position,
                probability,
                start_time,
                feature_values: feature_output.feature_matrix[row_idx].clone(),
                detected_message_with_numbers: source.source.get("detected_message_with_numbers").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                stacktrace: source.source.get("stacktrace").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                merged_small_logs: source.source.get("merged_small_logs").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            });
        }

        // Step 5: sort by (probability DESC, start_time DESC).
        sort_candidates(&mut candidates);

        // Step 6: pairwise dedup on three fields, similarity >= 0.98 on all
        // three drops the later (j) candidate. Candidates already sorted,
        // so "later" means lower rank.
        let kept = dedup_candidates(candidates, self.tuning.min_word_length, self.tuning.max_query_terms as usize);

        // Step 7: emit up to num_items results with probability >= threshold.
        let results = select_results(
            kept,
            num_items,
            ctx.test_item,
            &feature_names,
            &model_info,
            analyzer_config.number_of_log_lines,
            &self.tuning.min_should_match,
        );

        // Step 8: asynchronously publish request statistics.
        let stats = StatsInfoMessage {
            project_id: project,
            launch_id: ctx.launch_id,
            number_of_items: results.len(),
            gap_between_predict: 0.0,
        };
        if let Err(err) = message_bus::publish(self.message_bus, "stats_info", &stats).await {
            tracing::warn!(project, error = %err, "failed to publish stats_info message");
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EsConnectionConfig;
    use crate::message_bus::NullMessageBus;
    use crate::model::AnalyzerMode;
    use crate::ranker::StubRanker;

    fn ctx() -> SuggestLogContext {
        SuggestLogContext { launch_id: 1, launch_name: "nightly".to_string(), test_item: 9, unique_id: "auto:9".to_string(), is_auto_analyzed: false }
    }

    fn analyzer_config() -> AnalyzerConfig {
        AnalyzerConfig { analyzer_mode: AnalyzerMode::All, min_should_match: "80%".to_string(), min_doc_freq: 1, min_term_freq: 1, number_of_log_lines: -1 }
    }

    #[tokio::test]
    async fn empty_message_skips_search_entirely() {
        let gateway = IndexGateway::new(&EsConnectionConfig::default()).unwrap();
        let ranker = StubRanker::new(SUGGEST_FEATURE_IDS.to_vec());
        let defect_model = crate::featurizer::NoDefectTypeModel;
        let bus = NullMessageBus;
        let config = AppConfig::default();
        let pipeline = SuggestPipeline::new(&config, &gateway, &ranker, &defect_model, &bus);

        let logs = vec![Log { log_id: 1, message: String::new(), log_level: 40000 }];
        let results = pipeline.suggest(1, &ctx(), &logs, &analyzer_config(), 5).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn duplicate_input_logs_collapse_to_one() {
        let gateway = IndexGateway::new(&EsConnectionConfig::default()).unwrap();
        let ranker = StubRanker::new(SUGGEST_FEATURE_IDS.to_vec());
        let defect_model = crate::featurizer::NoDefectTypeModel;
        let bus = NullMessageBus;
        let config = AppConfig::default();
        let pipeline = SuggestPipeline::new(&config, &gateway, &ranker, &defect_model, &bus);

        let logs = vec![
            Log { log_id: 1, message: "boom".to_string(), log_level: 40000 },
            Log { log_id: 2, message: "BOOM".to_string(), log_level: 40000 },
        ];
        // No live index store in unit tests, so the search calls fail and
        // are skipped; this only exercises the dedup + empty-result path.
        let results = pipeline.suggest(1, &ctx(), &logs, &analyzer_config(), 5).await;
        assert!(results.is_empty());
    }

    fn candidate(test_item_id: i64, issue_type: &str, probability: f64, start_time: &str) -> Candidate {
        Candidate {
            test_item_id,
            issue_type: issue_type.to_string(),
            relevant_log_id: format!("{test_item_id}_log"),
            es_score: 1.0,
            es_position: 0,
            probability,
            start_time: start_time.to_string(),
            feature_values: vec![probability],
            detected_message_with_numbers: "connection refused at socket 42".to_string(),
            stacktrace: "at com.example.Foo.bar(Foo.java:10)".to_string(),
            merged_small_logs: "connection refused".to_string(),
        }
    }

    #[test]
    fn sort_candidates_orders_by_probability_then_start_time_desc() {
        let mut candidates = vec![
            candidate(1, "pb001", 0.5, "2020-01-01"),
            candidate(2, "pb001", 0.9, "2020-01-01"),
            candidate(3, "pb001", 0.9, "2020-06-01"),
        ];
        sort_candidates(&mut candidates);
        let order: Vec<i64> = candidates.iter().map(|c| c.test_item_id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn dedup_candidates_drops_near_identical_lower_ranked_duplicate() {
        let candidates = vec![
            candidate(1, "pb001", 0.9, "2020-01-01"),
            candidate(2, "pb001", 0.5, "2020-01-01"),
        ];
        let kept = dedup_candidates(candidates, 2, 50);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].test_item_id, 1);
    }

    #[test]
    fn dedup_candidates_keeps_distinct_issue_types() {
        let mut other = candidate(2, "pb002", 0.5, "2020-01-01");
        other.detected_message_with_numbers = "out of memory heap space exceeded".to_string();
        other.stacktrace = "at com.other.Thing.run(Thing.java:99)".to_string();
        other.merged_small_logs = "out of memory".to_string();
        let candidates = vec![candidate(1, "pb001", 0.9, "2020-01-01"), other];
        let kept = dedup_candidates(candidates, 2, 50);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn dedup_candidates_is_idempotent() {
        let candidates = vec![
            candidate(1, "pb001", 0.9, "2020-01-01"),
            candidate(2, "pb001", 0.5, "2020-01-01"),
            candidate(3, "pb002", 0.4, "2020-01-01"),
        ];
        let once = dedup_candidates(candidates, 2, 50);
        let ids_once: Vec<i64> = once.iter().map(|c| c.test_item_id).collect();
        let twice = dedup_candidates(once, 2, 50);
        let ids_twice: Vec<i64> = twice.iter().map(|c| c.test_item_id).collect();
        assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn select_results_caps_at_num_items_and_floors_at_suggest_threshold() {
        let candidates = vec![
            candidate(1, "pb001", 0.9, "2020-01-01"),
            candidate(2, "pb002", 0.5, "2020-01-01"),
            candidate(3, "pb003", 0.35, "2020-01-01"),
            candidate(4, "pb004", 0.45, "2020-01-01"),
        ];
        let feature_names = vec!["SimilarityField(detected_message_with_numbers)".to_string()];
        let model_info = vec!["stub".to_string()];
        let results = select_results(candidates, 2, 9, &feature_names, &model_info, -1, "80%");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.match_score >= SUGGEST_THRESHOLD * 100.0));
        assert_eq!(results[0].result_position, 0);
        assert_eq!(results[1].result_position, 1);
        assert_eq!(results[0].relevant_item, 1);
        assert_eq!(results[1].relevant_item, 2);
    }

    #[test]
    fn select_results_empty_when_all_below_threshold() {
        let candidates = vec![candidate(1, "pb001", 0.1, "2020-01-01")];
        let results = select_results(candidates, 5, 9, &[], &[], -1, "80%");
        assert!(results.is_empty());
    }
}
