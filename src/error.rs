use thiserror::Error;

/// Crate-wide error type.
///
/// Pipelines (see [`crate::pipeline`]) never let this type escape to their
/// caller: per the error-handling design, input and transient index-store
/// errors are absorbed into well-formed empty/partial results. `Error`
/// exists for the layers underneath the pipelines, and for genuine
/// programmer errors (bad config, missing model) that should fail loudly.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("index store returned an error: status={status}, body={body}")]
    IndexStore { status: u16, body: String },

    #[error("index store request timed out after {0} retries")]
    IndexStoreTimeout(u32),

    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("message bus publish failed: {0}")]
    MessageBus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
