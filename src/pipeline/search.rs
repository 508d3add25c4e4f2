//! Orchestrates a `search_logs` request: find test items whose historical
//! logs closely resemble a set of raw input messages, independent of both
//! auto-classification and suggestion (§4.5 search-logs query family).

use crate::config::SearchTuningConfig;
use crate::constants::ERROR_LEVEL;
use crate::index_gateway::IndexGateway;
use crate::log_preparation::{self, SuggestLogContext};
use crate::model::{extract_real_id, AnalyzerConfig, AnalyzerMode, Log};
use crate::query_builder;
use crate::similarity;

/// One input line to search similar historical logs for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLogsRequest {
    pub launch_id: i64,
    pub launch_name: String,
    pub item_id: i64,
    pub project_id: i64,
    pub filtered_launch_ids: Vec<i64>,
    pub log_messages: Vec<String>,
    pub log_lines: i32,
}

/// A historical log judged similar enough to one of the request's messages.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLogResult {
    pub log_id: i64,
    pub test_item_id: i64,
}

pub struct SearchLogsPipeline<'a> {
    pub index_gateway: &'a IndexGateway,
    pub tuning: &'a SearchTuningConfig,
}

impl<'a> SearchLogsPipeline<'a> {
    pub fn new(index_gateway: &'a IndexGateway, tuning: &'a SearchTuningConfig) -> Self {
        Self { index_gateway, tuning }
    }

    /// For each non-empty message in `request.log_messages`, searches
    /// `request.project_id`'s index for similar historical logs (excluding
    /// `request.item_id` itself) and keeps hits whose message-field cosine
    /// similarity is `>= search_logs_min_similarity`.
    #[tracing::instrument(skip(self, request))]
    pub async fn search_logs(&self, request: &SearchLogsRequest) -> Vec<SearchLogResult> {
        let index = request.project_id.to_string();
        let analyzer_config = AnalyzerConfig {
            analyzer_mode: AnalyzerMode::All,
            min_should_match: self.tuning.search_logs_min_should_match.clone(),
            min_doc_freq: 1,
            min_term_freq: 1,
            number_of_log_lines: request.log_lines,
        };
        let ctx = SuggestLogContext {
            launch_id: request.launch_id,
            launch_name: request.launch_name.clone(),
            test_item: request.item_id,
            unique_id: String::new(),
            is_auto_analyzed: false,
        };

        let mut results = Vec::new();
        for (position, message) in request.log_messages.iter().enumerate() {
            // Step: empty message skips search entirely for that line.
            if message.trim().is_empty() {
                continue;
            }
            let log = Log { log_id: position as i64, message: message.clone(), log_level: ERROR_LEVEL };
            let doc = log_preparation::prepare_log_document_for_suggest(&ctx, &log, &analyzer_config);
            let query = query_builder::build_search_logs_query(&doc, request.item_id, &request.filtered_launch_ids, self.tuning);

            let hits = match self.index_gateway.search(&index, query).await {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!(item_id = request.item_id, error = %err, "search_logs failed for one message, skipping");
                    continue;
                }
            };

            for hit in &hits {
                let hit_message = hit.source.get("message").and_then(|v| v.as_str()).unwrap_or("");
                let similarity_score = similarity::cosine_similarity(
                    &doc.message,
                    hit_message,
                    self.tuning.min_word_length,
                    self.tuning.max_query_terms as usize,
                    None,
                );
                if similarity_score < self.tuning.search_logs_min_similarity {
                    continue;
                }
                let Some(test_item_id) = hit.source.get("test_item").and_then(|v| v.as_i64()) else { continue };
                let Ok(log_id) = extract_real_id(&hit.id).parse::<i64>() else { continue };
                results.push(SearchLogResult { log_id, test_item_id });
            }
        }
        results
    }
}
