//! Turns raw search results into the fixed-width numeric feature matrix the
//! [`Ranker`](crate::ranker) consumes (§4.7). Two call-sites (analyze,
//! suggest) share the same mid-stage aggregation and differ only in which
//! feature ids they ask for.

pub mod features;

pub use features::FeatureId;

use std::collections::HashMap;

use crate::index_gateway::SearchHit;
use crate::model::LogDocument;
use crate::similarity::{self, WordWeights};

/// A per-project (or global-default) defect-type classifier. The core only
/// consumes trained artifacts; training itself is out of scope (§1).
pub trait DefectTypeModel {
    /// Probability the given text belongs to the model's defect type.
    fn predict_proba(&self, text: &str) -> f64;
}

/// Falls back to a neutral `0.5` when no defect-type model is configured
/// for a project and there is no global default either (§7: model-load
/// errors degrade gracefully rather than failing the request).
pub struct NoDefectTypeModel;

impl DefectTypeModel for NoDefectTypeModel {
    fn predict_proba(&self, _text: &str) -> f64 {
        0.5
    }
}

/// One `(query_log, elasticsearch_response)` tuple feeding the featurizer.
pub struct QueryHits<'a> {
    pub query_doc: &'a LogDocument,
    pub hits: &'a [SearchHit],
}

/// Mid-stage state: the best-scoring hit seen so far for each candidate
/// test item, and the query log it matched against (§4.7).
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub mr_hit: SearchHit,
    pub score: f64,
    pub compared_log: LogDocument,
}

/// Builds `scores_by_test_items`: for every `test_item` appearing across
/// all hits, keeps the hit with the highest `_score` as `mrHit`.
fn scores_by_test_items(pairs: &[QueryHits<'_>]) -> HashMap<i64, ScoreEntry> {
    let mut best: HashMap<i64, ScoreEntry> = HashMap::new();

    for pair in pairs {
        for hit in pair.hits {
            let Some(test_item) = hit.source.get("test_item").and_then(|v| v.as_i64()) else {
                continue;
            };
            let entry = best.entry(test_item).or_insert_with(|| ScoreEntry {
                mr_hit: hit.clone(),
                score: hit.score,
                compared_log: pair.query_doc.clone(),
            });
            if hit.score > entry.score {
                entry.mr_hit = hit.clone();
                entry.score = hit.score;
                entry.compared_log = pair.query_doc.clone();
            }
        }
    }

    best
}

fn field_of_source(source: &serde_json::Value, field: &str) -> String {
    source.get(field).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

/// Tunable knobs the featurizer needs that aren't baked into
/// [`crate::config::SearchTuningConfig`] alone.
pub struct FeaturizerOptions<'a> {
    pub min_word_length: usize,
    pub max_query_terms: usize,
    pub word_weights: Option<&'a WordWeights>,
    pub defect_type_model: &'a dyn DefectTypeModel,
}

/// Output of featurization: aligned `feature_matrix` / `test_item_ids`
/// (§4.7). `feature_matrix[i]` corresponds to `test_item_ids[i]`.
#[derive(Debug, Clone, Default)]
pub struct FeatureOutput {
    pub feature_matrix: Vec<Vec<f64>>,
    pub test_item_ids: Vec<i64>,
}

/// Computes the requested `feature_ids` for every candidate test item
/// across `pairs` (§4.7). Deterministic given inputs and model artifacts;
/// an empty `pairs`/hits set yields an empty output.
pub fn featurize(
    pairs: &[QueryHits<'_>],
    feature_ids: &[FeatureId],
    options: &FeaturizerOptions<'_>,
) -> FeatureOutput {
    let scores = scores_by_test_items(pairs);
    if scores.is_empty() {
        return FeatureOutput::default();
    }

    // Stable order: ascending test_item id, so ranking output is
    // reproducible across runs with identical inputs.
    let mut test_item_ids: Vec<i64> = scores.keys().copied().collect();
    test_item_ids.sort_unstable();

    let all_hits: Vec<&SearchHit> = pairs.iter().flat_map(|p| p.hits.iter()).collect();
    let total_hits = all_hits.len().max(1) as f64;

    let mut top_scores: Vec<f64> = scores.values().map(|e| e.score).collect();
    top_scores.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let top_two_gap = if top_scores.len() >= 2 { top_scores[0] - top_scores[1] } else { 0.0 };

    let predicted_issue_type = scores
        .values()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
        .map(|e| field_of_source(&e.mr_hit.source, "issue_type"));

    let matching_issue_type_fraction = predicted_issue_type.as_ref().map(|predicted| {
        let matching = all_hits.iter().filter(|h| field_of_source(&h.source, "issue_type") == *predicted).count();
        matching as f64 / total_hits
    });

    let mut feature_matrix = Vec::with_capacity(test_item_ids.len());

    for (rank, test_item) in test_item_ids.iter().enumerate() {
        let entry = &scores[test_item];
        let mut row = Vec::with_capacity(feature_ids.len());

        for feature_id in feature_ids {
            let value = match feature_id {
                FeatureId::SimilarityField(field) => {
                    let hit_text = field_of_source(&entry.mr_hit.source, field);
                    let query_text = entry.compared_log.field(field);
                    similarity::cosine_similarity(
                        &hit_text,
                        query_text,
                        options.min_word_length,
                        options.max_query_terms,
                        options.word_weights,
                    )
                }
                FeatureId::ScaledScore => entry.score / top_scores.first().copied().unwrap_or(1.0).max(1e-9),
                FeatureId::RankPosition => rank as f64,
                FeatureId::IsAutoAnalyzed => {
                    if entry.mr_hit.source.get("is_auto_analyzed").and_then(|v| v.as_bool()).unwrap_or(false) {
                        1.0
                    } else {
                        0.0
                    }
                }
                FeatureId::UniqueIdMatches => {
                    if field_of_source(&entry.mr_hit.source, "unique_id") == entry.compared_log.unique_id {
                        1.0
                    } else {
                        0.0
                    }
                }
                FeatureId::LaunchNameMatches => {
                    if field_of_source(&entry.mr_hit.source, "launch_name") == entry.compared_log.launch_name {
                        1.0
                    } else {
                        0.0
                    }
                }
                FeatureId::DefectTypeProbability => {
                    let text = field_of_source(&entry.mr_hit.source, "detected_message");
                    options.defect_type_model.predict_proba(&text)
                }
                FeatureId::MatchingIssueTypeFraction => matching_issue_type_fraction.unwrap_or(0.0),
                FeatureId::TopTwoScoreGap => top_two_gap,
                FeatureId::HitCount => all_hits.len() as f64,
            };
            row.push(value);
        }

        feature_matrix.push(row);
    }

    FeatureOutput { feature_matrix, test_item_ids }
}
