//! The enumerated feature ids a [`Ranker`](crate::ranker) model can request
//! (§4.7). A model declares the subset it needs via
//! [`crate::ranker::Ranker::feature_ids`]; the featurizer computes exactly
//! that subset, in that order.

/// One column of the feature matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    /// Normalized cosine similarity between the mrHit and the compared
    /// query log, for the named `LogDocument` field.
    SimilarityField(&'static str),
    /// mrHit's `_score`, scaled relative to the top score across all
    /// candidate test items.
    ScaledScore,
    /// Position of the mrHit's test item in the (stably ordered)
    /// candidate list.
    RankPosition,
    IsAutoAnalyzed,
    UniqueIdMatches,
    LaunchNameMatches,
    /// Per-project defect-type classifier probability for the mrHit's
    /// detected message, falling back to a global default model (§4.7).
    DefectTypeProbability,
    /// Fraction of all hits sharing the predicted issue_type.
    MatchingIssueTypeFraction,
    /// Gap between the top two aggregated scores across candidates.
    TopTwoScoreGap,
    /// Total number of hits across all queries for this request.
    HitCount,
}

/// The feature ids used by the analyze-mode model.
pub const ANALYZE_FEATURE_IDS: &[FeatureId] = &[
    FeatureId::SimilarityField("message"),
    FeatureId::SimilarityField("merged_small_logs"),
    FeatureId::ScaledScore,
    FeatureId::RankPosition,
    FeatureId::IsAutoAnalyzed,
    FeatureId::UniqueIdMatches,
    FeatureId::LaunchNameMatches,
    FeatureId::DefectTypeProbability,
    FeatureId::MatchingIssueTypeFraction,
    FeatureId::TopTwoScoreGap,
    FeatureId::HitCount,
];

/// The feature ids used by the suggest-mode model.
pub const SUGGEST_FEATURE_IDS: &[FeatureId] = &[
    FeatureId::SimilarityField("detected_message_with_numbers"),
    FeatureId::SimilarityField("stacktrace"),
    FeatureId::SimilarityField("merged_small_logs"),
    FeatureId::ScaledScore,
    FeatureId::RankPosition,
    FeatureId::IsAutoAnalyzed,
    FeatureId::UniqueIdMatches,
    FeatureId::LaunchNameMatches,
    FeatureId::DefectTypeProbability,
    FeatureId::MatchingIssueTypeFraction,
    FeatureId::TopTwoScoreGap,
    FeatureId::HitCount,
];
