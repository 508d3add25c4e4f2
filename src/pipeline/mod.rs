//! Single-request orchestration: [`AnalyzerPipeline`] for auto-classification,
//! [`SuggestPipeline`] for ranked suggestions (§4.9, §4.10), and
//! [`SearchLogsPipeline`] for plain similar-log lookup (§4.5 search-logs
//! query family).

mod analyzer;
mod search;
mod suggest;

pub use analyzer::{AnalysisResult, AnalyzerPipeline};
pub use search::{SearchLogResult, SearchLogsPipeline, SearchLogsRequest};
pub use suggest::{SuggestAnalysisResult, SuggestPipeline};
