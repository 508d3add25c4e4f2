//! Thin wrapper around a trained gradient-boosted-tree ranking model
//! (§4.8). Real inference lives behind the `provider-onnx` feature; without
//! it, [`StubRanker`] returns a deterministic fallback so the rest of the
//! pipeline stays exercisable without a model artifact on disk.

#[cfg(feature = "provider-onnx")]
mod onnx;

#[cfg(feature = "provider-onnx")]
pub use onnx::OnnxRanker;

use crate::featurizer::FeatureId;

/// `labels[i]` / `probabilities[i]` correspond to `feature_matrix[i]`.
/// `probabilities[i].1` is the positive-class score (§4.8).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub labels: Vec<i32>,
    pub probabilities: Vec<(f64, f64)>,
}

/// A loaded ranking model.
pub trait Ranker: Send + Sync {
    /// The feature ids this model expects, in matrix-column order.
    fn feature_ids(&self) -> &[FeatureId];

    /// Scores `feature_matrix` row by row.
    fn predict(&self, feature_matrix: &[Vec<f64>]) -> Predictions;

    /// Tag strings identifying the loaded artifact (version, training date,
    /// hash — whatever the artifact metadata carries).
    fn model_info(&self) -> Vec<String>;
}

/// Deterministic placeholder used when `provider-onnx` is disabled or a
/// model fails to load (§7: model-load errors fall back rather than fail
/// the request). Classifies every row positive with a score derived from
/// its first feature, clamped to `[0, 1]`, so pipeline wiring and tests
/// exercise realistic-shaped output without a real artifact.
pub struct StubRanker {
    feature_ids: Vec<FeatureId>,
}

impl StubRanker {
    pub fn new(feature_ids: Vec<FeatureId>) -> Self {
        Self { feature_ids }
    }
}

impl Ranker for StubRanker {
    fn feature_ids(&self) -> &[FeatureId] {
        &self.feature_ids
    }

    fn predict(&self, feature_matrix: &[Vec<f64>]) -> Predictions {
        tracing::warn!("provider-onnx disabled or model unavailable, using StubRanker fallback");
        let mut labels = Vec::with_capacity(feature_matrix.len());
        let mut probabilities = Vec::with_capacity(feature_matrix.len());
        for row in feature_matrix {
            let raw = row.first().copied().unwrap_or(0.0).clamp(0.0, 1.0);
            labels.push(if raw >= 0.5 { 1 } else { 0 });
            probabilities.push((1.0 - raw, raw));
        }
        Predictions { labels, probabilities }
    }

    fn model_info(&self) -> Vec<String> {
        vec!["stub-ranker".to_string()]
    }
}
