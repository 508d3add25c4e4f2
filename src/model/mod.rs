//! Input data model (§3) and the retrieval-unit [`LogDocument`] it compiles
//! down to.

mod log_document;
mod stored_log;

pub use log_document::LogDocument;
pub use stored_log::{extract_real_id, StoredLog};

use serde::{Deserialize, Serialize};

/// A single log line belonging to a test item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub log_id: i64,
    pub message: String,
    pub log_level: i32,
}

/// An atomic test case within a launch, carrying zero or more logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestItem {
    pub test_item_id: i64,
    pub unique_id: String,
    pub is_auto_analyzed: bool,
    pub issue_type: String,
    pub logs: Vec<Log>,
}

/// How an [`AnalyzerConfig`] scopes the search for historical matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyzerMode {
    All,
    LaunchName,
    CurrentLaunch,
}

/// Per-request analysis tuning, supplied by the caller alongside the launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub analyzer_mode: AnalyzerMode,
    /// Percent string, e.g. `"80%"`.
    pub min_should_match: String,
    pub min_doc_freq: u32,
    pub min_term_freq: u32,
    /// `-1` means "use the whole message", not the first N lines.
    pub number_of_log_lines: i32,
}

impl AnalyzerConfig {
    pub fn wants_full_message(&self) -> bool {
        self.number_of_log_lines == -1
    }
}

/// A single execution of a suite, containing test items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub launch_id: i64,
    pub launch_name: String,
    pub project: i64,
    pub analyzer_config: AnalyzerConfig,
    pub test_items: Vec<TestItem>,
}
