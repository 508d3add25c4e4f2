//! Log-analysis core of a test-automation platform.
//!
//! Given the failing logs of a test item, this crate either
//! auto-classifies its defect type against historically similar failures
//! ([`pipeline::AnalyzerPipeline`]) or suggests a ranked list of candidates
//! for a human to pick from ([`pipeline::SuggestPipeline`]). It also
//! maintains the searchable corpus: normalizing and merging per-test-item
//! logs, and keeping an inverted-index store in sync.
//!
//! Out of scope: the HTTP surface, the AMQP wiring, process bootstrap, and
//! the inverted-index store itself (talked to over its REST API by
//! [`index_gateway::IndexGateway`]).

pub mod config;
pub mod constants;
pub mod error;
pub mod featurizer;
pub mod index_gateway;
pub mod log_merger;
pub mod log_preparation;
pub mod message_bus;
pub mod model;
pub mod namespace_tracker;
pub mod pipeline;
pub mod query_builder;
pub mod ranker;
pub mod retraining;
pub mod similarity;
pub mod text;

pub use config::AppConfig;
pub use error::{Error, Result};
