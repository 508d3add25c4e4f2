//! Narrow contract to an external message bus (§4.13, §6). The concrete
//! AMQP producer/consumer wiring is out of scope for this crate — callers
//! inject whatever [`MessageBus`] implementation talks to their broker.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Published when a project's indexed-log counter crosses its retraining
/// threshold (§4.10 state machine).
#[derive(Debug, Clone, Serialize)]
pub struct TrainModelsMessage {
    pub model_type: String,
    pub project_id: i64,
    pub num_logs_with_defect_types: u64,
}

/// Published after every suggest request (§4.10 step 8).
#[derive(Debug, Clone, Serialize)]
pub struct StatsInfoMessage {
    pub project_id: i64,
    pub launch_id: i64,
    pub number_of_items: usize,
    pub gap_between_predict: f64,
}

/// A destination for the two routing keys the core publishes on:
/// `train_models` and `stats_info` (§6). Errors here are logged and
/// swallowed by callers — a message-bus failure never fails an analysis
/// request (§7).
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, routing_key: &str, payload: Value) -> crate::error::Result<()>;
}

/// Serializes and publishes `message` on `routing_key`.
pub async fn publish<B: MessageBus + ?Sized, T: Serialize>(bus: &B, routing_key: &str, message: &T) -> crate::error::Result<()> {
    let payload = serde_json::to_value(message)?;
    bus.publish(routing_key, payload).await
}

/// No-op bus used in tests and whenever message-bus wiring hasn't been
/// configured; publishing is a logged no-op rather than an error (§7).
pub struct NullMessageBus;

#[async_trait]
impl MessageBus for NullMessageBus {
    async fn publish(&self, routing_key: &str, payload: Value) -> crate::error::Result<()> {
        tracing::debug!(routing_key, %payload, "NullMessageBus dropping publish");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_bus_accepts_any_payload() {
        let bus = NullMessageBus;
        let message = TrainModelsMessage { model_type: "defect_type".to_string(), project_id: 1, num_logs_with_defect_types: 10 };
        publish(&bus, "train_models", &message).await.unwrap();
    }
}
