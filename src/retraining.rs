//! Per-project retraining trigger (§9 design note: "dynamic dispatch on
//! model type" resolved as a tagged enum keyed into a registry, rather than
//! a class hierarchy).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::message_bus::{self, MessageBus, TrainModelsMessage};

/// The kinds of model a retraining counter can track. Only `DefectType` is
/// produced by the current indexing path; the enum leaves room for more
/// without widening every call site (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    DefectType,
}

impl ModelType {
    fn as_str(self) -> &'static str {
        match self {
            ModelType::DefectType => "defect_type",
        }
    }
}

struct Counter {
    count: u64,
    threshold: u64,
}

/// Per-project, per-model-type counters. Each indexed batch adds
/// `num_logs_with_defect_types`; crossing `threshold` emits a
/// `train_models` message and resets to zero.
pub struct RetrainingTrigger {
    counters: Mutex<HashMap<(i64, ModelType), Counter>>,
    default_threshold: u64,
}

impl RetrainingTrigger {
    pub fn new(default_threshold: u64) -> Self {
        Self { counters: Mutex::new(HashMap::new()), default_threshold }
    }

    /// Adds `num_logs` to the counter for `(project_id, model_type)`; if the
    /// threshold is crossed, publishes `train_models` and resets to zero.
    pub async fn record_indexed_batch<B: MessageBus + ?Sized>(
        &self,
        bus: &B,
        project_id: i64,
        model_type: ModelType,
        num_logs: u64,
    ) {
        let crossed = {
            let mut counters = self.counters.lock();
            let counter = counters
                .entry((project_id, model_type))
                .or_insert_with(|| Counter { count: 0, threshold: self.default_threshold });
            counter.count += num_logs;
            if counter.count >= counter.threshold {
                let total = counter.count;
                counter.count = 0;
                Some(total)
            } else {
                None
            }
        };

        if let Some(total) = crossed {
            let message = TrainModelsMessage {
                model_type: model_type.as_str().to_string(),
                project_id,
                num_logs_with_defect_types: total,
            };
            if let Err(err) = message_bus::publish(bus, "train_models", &message).await {
                tracing::warn!(project_id, error = %err, "failed to publish train_models message");
            }
        }
    }

    /// Clears every counter for `project_id` (§3: index deletion clears
    /// retraining counters).
    pub fn clear_project(&self, project_id: i64) {
        self.counters.lock().retain(|(pid, _), _| *pid != project_id);
    }
}
