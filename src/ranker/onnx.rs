//! `provider-onnx`-gated GBDT inference. A trained scikit-learn-style
//! classifier, exported to ONNX, takes a `[N, F]` float tensor named
//! `float_input` and returns `output_label` (int64) and
//! `output_probability` (a list-of-maps or `[N, 2]` tensor depending on the
//! exporter); we only rely on the `[N, 2]` tensor shape here.

use crate::error::{Error, Result};
use crate::featurizer::FeatureId;

use super::{Predictions, Ranker};

#[cfg(feature = "provider-onnx-real")]
mod real {
    use super::*;
    use ndarray::Array2;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;
    use std::sync::Mutex;

    pub struct RealRanker {
        session: Mutex<Session>,
        feature_ids: Vec<FeatureId>,
        model_info: Vec<String>,
    }

    impl RealRanker {
        pub fn load(path: &Path, feature_ids: Vec<FeatureId>, model_info: Vec<String>) -> Result<Self> {
            let session = Session::builder()
                .map_err(|e| Error::ModelLoad { path: path.display().to_string(), reason: e.to_string() })?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| Error::ModelLoad { path: path.display().to_string(), reason: e.to_string() })?
                .commit_from_file(path)
                .map_err(|e| Error::ModelLoad { path: path.display().to_string(), reason: e.to_string() })?;
            Ok(Self { session: Mutex::new(session), feature_ids, model_info })
        }

        pub fn predict(&self, feature_matrix: &[Vec<f64>]) -> Predictions {
            if feature_matrix.is_empty() {
                return Predictions::default();
            }
            let rows = feature_matrix.len();
            let cols = feature_matrix[0].len();
            let flat: Vec<f32> = feature_matrix.iter().flatten().map(|&v| v as f32).collect();

            let array = match Array2::from_shape_vec((rows, cols), flat) {
                Ok(a) => a,
                Err(err) => {
                    tracing::warn!(error = %err, "feature matrix shape mismatch, falling back to zero scores");
                    return Predictions { labels: vec![0; rows], probabilities: vec![(1.0, 0.0); rows] };
                }
            };

            let tensor = match Tensor::from_array(array) {
                Ok(t) => t,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to build input tensor");
                    return Predictions { labels: vec![0; rows], probabilities: vec![(1.0, 0.0); rows] };
                }
            };

            let mut session = match self.session.lock() {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!(error = %err, "ranker session lock poisoned");
                    return Predictions { labels: vec![0; rows], probabilities: vec![(1.0, 0.0); rows] };
                }
            };

            let outputs = match session.run(ort::inputs!["float_input" => tensor]) {
                Ok(o) => o,
                Err(err) => {
                    tracing::warn!(error = %err, "ranker inference call failed");
                    return Predictions { labels: vec![0; rows], probabilities: vec![(1.0, 0.0); rows] };
                }
            };

            let labels: Vec<i32> = outputs
                .get("output_label")
                .and_then(|v| v.try_extract_tensor::<i64>().ok())
                .map(|(_, data)| data.iter().map(|&l| l as i32).collect())
                .unwrap_or_else(|| vec![0; rows]);

            let probabilities: Vec<(f64, f64)> = outputs
                .get("output_probability")
                .and_then(|v| v.try_extract_tensor::<f32>().ok())
                .map(|(_, data)| {
                    data.chunks(2)
                        .map(|pair| (pair.first().copied().unwrap_or(0.0) as f64, pair.get(1).copied().unwrap_or(0.0) as f64))
                        .collect()
                })
                .unwrap_or_else(|| vec![(1.0, 0.0); rows]);

            Predictions { labels, probabilities }
        }
    }
}

/// Loads a trained GBDT model from an ONNX artifact. Without
/// `provider-onnx-real`, construction still succeeds but inference degrades
/// to the same deterministic fallback as [`super::StubRanker`] (§7).
pub struct OnnxRanker {
    feature_ids: Vec<FeatureId>,
    model_info: Vec<String>,
    #[cfg(feature = "provider-onnx-real")]
    inner: real::RealRanker,
}

impl OnnxRanker {
    #[cfg(feature = "provider-onnx-real")]
    pub fn load(path: impl AsRef<std::path::Path>, feature_ids: Vec<FeatureId>, model_info: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        let inner = real::RealRanker::load(path, feature_ids.clone(), model_info.clone())?;
        Ok(Self { feature_ids, model_info, inner })
    }

    #[cfg(not(feature = "provider-onnx-real"))]
    pub fn load(path: impl AsRef<std::path::Path>, feature_ids: Vec<FeatureId>, model_info: Vec<String>) -> Result<Self> {
        tracing::warn!(
            path = %path.as_ref().display(),
            "OnnxRanker requested but provider-onnx-real not enabled; predictions will use the stub fallback"
        );
        Ok(Self { feature_ids, model_info })
    }
}

impl Ranker for OnnxRanker {
    fn feature_ids(&self) -> &[FeatureId] {
        &self.feature_ids
    }

    fn predict(&self, feature_matrix: &[Vec<f64>]) -> Predictions {
        #[cfg(feature = "provider-onnx-real")]
        {
            self.inner.predict(feature_matrix)
        }
        #[cfg(not(feature = "provider-onnx-real"))]
        {
            let _ = feature_matrix;
            tracing::warn!("provider-onnx-real not enabled, returning zero-confidence predictions");
            Predictions {
                labels: vec![0; feature_matrix.len()],
                probabilities: vec![(1.0, 0.0); feature_matrix.len()],
            }
        }
    }

    fn model_info(&self) -> Vec<String> {
        self.model_info.clone()
    }
}
