//! Orchestrates auto-classification for a single launch (§4.9).

use std::collections::{HashMap, HashSet};

use crate::config::{AppConfig, SearchTuningConfig};
use crate::featurizer::{self, features::ANALYZE_FEATURE_IDS, DefectTypeModel, FeaturizerOptions, QueryHits};
use crate::index_gateway::IndexGateway;
use crate::log_merger::{self};
use crate::log_preparation;
use crate::model::{extract_real_id, AnalyzerConfig, Launch, StoredLog, TestItem};
use crate::index_gateway::SearchHit;
use crate::query_builder;
use crate::ranker::Ranker;

/// One classified test item, naming the historical item its failure most
/// resembles (§4.9 step 6).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub test_item: i64,
    pub issue_type: String,
    pub relevant_item: i64,
    pub relevant_log_id: String,
}

pub struct AnalyzerPipeline<'a> {
    pub index_gateway: &'a IndexGateway,
    pub ranker: &'a dyn Ranker,
    pub defect_type_model: &'a dyn DefectTypeModel,
    pub tuning: &'a SearchTuningConfig,
}

impl<'a> AnalyzerPipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        index_gateway: &'a IndexGateway,
        ranker: &'a dyn Ranker,
        defect_type_model: &'a dyn DefectTypeModel,
    ) -> Self {
        Self { index_gateway, ranker, defect_type_model, tuning: &config.search_tuning }
    }

    /// Classifies every test item in `launch` against project `project`'s
    /// index. Test items the ranker has no opinion on are simply omitted
    /// from the result list (§4.9 step 6: "only if non-empty").
    #[tracing::instrument(skip(self, launch))]
    pub async fn analyze(&self, project: i64, launch: &Launch) -> Vec<AnalysisResult> {
        let mut results = Vec::new();
        for test_item in &launch.test_items {
            if let Some(result) = self.analyze_test_item(project, launch, test_item).await {
                results.push(result);
            }
        }
        results
    }

    async fn analyze_test_item(&self, project: i64, launch: &Launch, test_item: &TestItem) -> Option<AnalysisResult> {
        let raw_docs: Vec<StoredLog> = test_item
            .logs
            .iter()
            .filter(|log| log.log_level >= crate::constants::ERROR_LEVEL)
            .map(|log| StoredLog {
                id: log.log_id.to_string(),
                document: log_preparation::prepare_log_document(launch, test_item, log),
            })
            .collect();
        if raw_docs.is_empty() {
            return None;
        }

        let merge_outcome = log_merger::merge_logs(&raw_docs);
        let index = project.to_string();

        let mut all_hits = Vec::new();
        let mut query_docs = Vec::new();
        for merged in &merge_outcome.new_documents {
            if !merged.document.is_merged {
                continue;
            }
            let query = query_builder::build_analyze_query(&merged.document, &launch.analyzer_config, self.tuning);
            match self.index_gateway.search(&index, query).await {
                Ok(hits) => {
                    query_docs.push(merged.document.clone());
                    all_hits.push(hits);
                }
                Err(err) => {
                    tracing::warn!(test_item = test_item.test_item_id, error = %err, "analyze search failed for one log, skipping");
                }
            }
        }

        let pairs: Vec<QueryHits<'_>> =
            query_docs.iter().zip(all_hits.iter()).map(|(doc, hits)| QueryHits { query_doc: doc, hits }).collect();

        let options = FeaturizerOptions {
            min_word_length: self.tuning.min_word_length,
            max_query_terms: self.tuning.max_query_terms as usize,
            word_weights: None,
            defect_type_model: self.defect_type_model,
        };
        let feature_output = featurizer::featurize(&pairs, ANALYZE_FEATURE_IDS, &options);
        if feature_output.feature_matrix.is_empty() {
            return None;
        }

        let predictions = self.ranker.predict(&feature_output.feature_matrix);
        let positive_test_items: HashSet<i64> = feature_output
            .test_item_ids
            .iter()
            .zip(predictions.labels.iter())
            .filter(|(_, &label)| label == 1)
            .map(|(&test_item_id, _)| test_item_id)
            .collect();

        let (issue_type_scores, issue_type_best_hit) = aggregate_issue_type_scores(&all_hits, &positive_test_items);
        if issue_type_scores.is_empty() {
            return None;
        }

        // §9 resolution: tie-break by highest `_score` of mrHit, then
        // lexicographically smaller issue_type.
        let winner = issue_type_scores
            .iter()
            .max_by(|(a_type, a_score), (b_type, b_score)| {
                a_score
                    .partial_cmp(b_score)
                    .unwrap()
                    .then_with(|| {
                        let a_mr_score = issue_type_best_hit.get(*a_type).map(|e| e.0).unwrap_or(f64::MIN);
                        let b_mr_score = issue_type_best_hit.get(*b_type).map(|e| e.0).unwrap_or(f64::MIN);
                        a_mr_score.partial_cmp(&b_mr_score).unwrap()
                    })
                    .then_with(|| b_type.cmp(a_type))
            })
            .map(|(issue_type, _)| issue_type.clone())?;

        let (_, mr_hit_id, relevant_item) = issue_type_best_hit.get(&winner)?.clone();

        Some(AnalysisResult {
            test_item: test_item.test_item_id,
            issue_type: winner,
            relevant_item,
            relevant_log_id: extract_real_id(&mr_hit_id).to_string(),
        })
    }
}

/// §4.9 step 5: aggregates score by issue_type of the hit across all
/// merged-log query batches, tracking each issue_type's best hit (mrHit) as
/// it goes. Each batch's hits are normalized against that batch's own total
/// score before their contribution is accumulated — never against a single
/// total spanning every batch.
fn aggregate_issue_type_scores(
    all_hits: &[Vec<SearchHit>],
    positive_test_items: &HashSet<i64>,
) -> (HashMap<String, f64>, HashMap<String, (f64, String, i64)>) {
    let mut issue_type_scores: HashMap<String, f64> = HashMap::new();
    let mut issue_type_best_hit: HashMap<String, (f64, String, i64)> = HashMap::new();

    for hits in all_hits {
        let total_score: f64 = hits.iter().map(|hit| hit.score).sum();
        if total_score <= 0.0 {
            continue;
        }
        for hit in hits {
            let Some(hit_test_item) = hit.source.get("test_item").and_then(|v| v.as_i64()) else { continue };
            if !positive_test_items.contains(&hit_test_item) {
                continue;
            }
            let issue_type = hit.source.get("issue_type").and_then(|v| v.as_str()).unwrap_or("").to_string();
            if issue_type.is_empty() {
                continue;
            }
            *issue_type_scores.entry(issue_type.clone()).or_insert(0.0) += hit.score / total_score;

            let entry = issue_type_best_hit.entry(issue_type).or_insert((f64::MIN, String::new(), 0));
            if hit.score > entry.0 {
                *entry = (hit.score, hit.id.clone(), hit_test_item);
            }
        }
    }

    (issue_type_scores, issue_type_best_hit)
}
