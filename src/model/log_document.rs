use serde::{Deserialize, Serialize};

/// The retrieval unit stored in and searched against the index store.
///
/// Field names are the wire names the index store's mapping expects
/// (snake_case, matching `index_mapping_settings.json`); this struct is
/// the typed side of that otherwise-opaque mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub launch_id: i64,
    pub launch_name: String,
    pub test_item: i64,
    pub unique_id: String,
    pub is_auto_analyzed: bool,
    pub issue_type: String,
    pub log_level: i32,
    pub start_time: String,

    pub message: String,
    pub message_extended: String,
    pub message_without_params_extended: String,
    pub message_without_params_and_brackets: String,

    pub detected_message: String,
    pub detected_message_extended: String,
    pub detected_message_without_params_extended: String,
    pub detected_message_without_params_and_brackets: String,
    pub detected_message_with_numbers: String,

    pub stacktrace: String,
    pub stacktrace_extended: String,

    pub merged_small_logs: String,
    pub only_numbers: String,
    pub message_params: String,
    pub urls: String,
    pub paths: String,
    pub found_exceptions_extended: String,
    pub potential_status_codes: String,

    pub is_merged: bool,
    pub original_message: String,
}

impl LogDocument {
    /// `true` if this document is synthesized, i.e. its id carries a
    /// `_m`/`_big` suffix rather than being a bare `logId`.
    pub fn is_synthetic(&self) -> bool {
        self.is_merged
    }

    /// Looks up a text field by its wire name. Used by the suggest query
    /// builder, which assembles the same clause shape against three
    /// different field triples (§4.5).
    pub fn field(&self, name: &str) -> &str {
        match name {
            "message" => &self.message,
            "message_extended" => &self.message_extended,
            "message_without_params_extended" => &self.message_without_params_extended,
            "message_without_params_and_brackets" => &self.message_without_params_and_brackets,
            "detected_message" => &self.detected_message,
            "detected_message_extended" => &self.detected_message_extended,
            "detected_message_without_params_extended" => {
                &self.detected_message_without_params_extended
            }
            "detected_message_without_params_and_brackets" => {
                &self.detected_message_without_params_and_brackets
            }
            "detected_message_with_numbers" => &self.detected_message_with_numbers,
            "stacktrace" => &self.stacktrace,
            "stacktrace_extended" => &self.stacktrace_extended,
            "merged_small_logs" => &self.merged_small_logs,
            "only_numbers" => &self.only_numbers,
            "message_params" => &self.message_params,
            "urls" => &self.urls,
            "paths" => &self.paths,
            "found_exceptions_extended" => &self.found_exceptions_extended,
            "potential_status_codes" => &self.potential_status_codes,
            "original_message" => &self.original_message,
            _ => "",
        }
    }
}
