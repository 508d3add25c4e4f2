//! Builds canonical [`LogDocument`]s from input logs (§4.2).

use chrono::Utc;

use crate::model::{AnalyzerConfig, Launch, Log, LogDocument, TestItem};
use crate::text;

/// Context for preparing a query log document in the suggest path, where
/// there is no surrounding [`Launch`] (the issue type is exactly what the
/// request is trying to discover, so it is left blank).
#[derive(Debug, Clone)]
pub struct SuggestLogContext {
    pub launch_id: i64,
    pub launch_name: String,
    pub test_item: i64,
    pub unique_id: String,
    pub is_auto_analyzed: bool,
}

/// Picks the single line most likely to be the actual error message: the
/// first line matching a known exception pattern, falling back to the
/// first non-empty line.
fn detect_message_line(text: &str) -> &str {
    for line in text.lines() {
        if !crate::text::extract_exceptions(line).is_empty() {
            return line.trim();
        }
    }
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

/// Splits `text` into `(detected_line, remainder)`, where `remainder` is
/// every other line, in original order, joined by `\n`.
fn split_detected_and_stacktrace(text: &str) -> (&str, String) {
    let detected = detect_message_line(text);
    let remainder: Vec<&str> = text
        .lines()
        .filter(|line| line.trim() != detected || detected.is_empty())
        .collect();
    (detected, remainder.join("\n"))
}

struct PreparedFields {
    message: String,
    message_extended: String,
    message_without_params_extended: String,
    message_without_params_and_brackets: String,
    detected_message: String,
    detected_message_extended: String,
    detected_message_without_params_extended: String,
    detected_message_without_params_and_brackets: String,
    detected_message_with_numbers: String,
    stacktrace: String,
    stacktrace_extended: String,
    only_numbers: String,
    message_params: String,
    urls: String,
    paths: String,
    found_exceptions_extended: String,
    potential_status_codes: String,
}

fn prepare_fields(original_message: &str, number_of_log_lines: i32) -> PreparedFields {
    let truncated = text::first_lines(original_message, number_of_log_lines);

    let message_extended = truncated.trim().to_string();
    let message = text::sanitize_text(&message_extended);
    let message_without_params_extended = text::strip_params(&message_extended);
    let message_without_params_and_brackets = text::strip_brackets(&message_without_params_extended);

    let wants_full_message = number_of_log_lines == -1;
    let (detected_message_extended, stacktrace_extended) = if wants_full_message {
        (original_message.trim().to_string(), String::new())
    } else {
        let (detected, remainder) = split_detected_and_stacktrace(original_message);
        (detected.to_string(), remainder)
    };
    let (_, stacktrace_from_truncated) = split_detected_and_stacktrace(&truncated);
    let stacktrace = text::sanitize_text(&stacktrace_from_truncated);

    let detected_message = text::sanitize_text(&detected_message_extended);
    let detected_message_without_params_extended = text::strip_params(&detected_message_extended);
    let detected_message_without_params_and_brackets =
        text::strip_brackets(&detected_message_without_params_extended);
    let detected_message_with_numbers =
        detected_message_extended.split_whitespace().collect::<Vec<_>>().join(" ");

    let only_numbers = text::split_words(original_message, 1)
        .into_iter()
        .filter(|tok| tok.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ");

    PreparedFields {
        message,
        message_extended,
        message_without_params_extended,
        message_without_params_and_brackets,
        detected_message,
        detected_message_extended,
        detected_message_without_params_extended,
        detected_message_without_params_and_brackets,
        detected_message_with_numbers,
        stacktrace,
        stacktrace_extended,
        only_numbers,
        message_params: text::extract_message_params(original_message).join(" "),
        urls: text::extract_urls(original_message).join(" "),
        paths: text::extract_paths(original_message).join(" "),
        found_exceptions_extended: text::extract_exceptions(original_message).join(" "),
        potential_status_codes: text::extract_status_codes(original_message).join(" "),
    }
}

/// Builds a [`LogDocument`] for `log`, belonging to `test_item` within
/// `launch`. `is_merged` is always `false` on creation — merging is a
/// separate, later step (§4.3).
pub fn prepare_log_document(launch: &Launch, test_item: &TestItem, log: &Log) -> LogDocument {
    let fields = prepare_fields(&log.message, launch.analyzer_config.number_of_log_lines);
    let start_time = Utc::now().to_rfc3339();

    LogDocument {
        launch_id: launch.launch_id,
        launch_name: launch.launch_name.clone(),
        test_item: test_item.test_item_id,
        unique_id: test_item.unique_id.clone(),
        is_auto_analyzed: test_item.is_auto_analyzed,
        issue_type: test_item.issue_type.clone(),
        log_level: log.log_level,
        start_time,
        message: fields.message,
        message_extended: fields.message_extended,
        message_without_params_extended: fields.message_without_params_extended,
        message_without_params_and_brackets: fields.message_without_params_and_brackets,
        detected_message: fields.detected_message,
        detected_message_extended: fields.detected_message_extended,
        detected_message_without_params_extended: fields.detected_message_without_params_extended,
        detected_message_without_params_and_brackets: fields
            .detected_message_without_params_and_brackets,
        detected_message_with_numbers: fields.detected_message_with_numbers,
        stacktrace: fields.stacktrace,
        stacktrace_extended: fields.stacktrace_extended,
        merged_small_logs: String::new(),
        only_numbers: fields.only_numbers,
        message_params: fields.message_params,
        urls: fields.urls,
        paths: fields.paths,
        found_exceptions_extended: fields.found_exceptions_extended,
        potential_status_codes: fields.potential_status_codes,
        is_merged: false,
        original_message: log.message.clone(),
    }
}

/// Builds a query [`LogDocument`] for the suggest path, where there is no
/// surrounding launch and no known issue type.
pub fn prepare_log_document_for_suggest(
    ctx: &SuggestLogContext,
    log: &Log,
    analyzer_config: &AnalyzerConfig,
) -> LogDocument {
    let fields = prepare_fields(&log.message, analyzer_config.number_of_log_lines);
    let start_time = Utc::now().to_rfc3339();

    LogDocument {
        launch_id: ctx.launch_id,
        launch_name: ctx.launch_name.clone(),
        test_item: ctx.test_item,
        unique_id: ctx.unique_id.clone(),
        is_auto_analyzed: ctx.is_auto_analyzed,
        issue_type: String::new(),
        log_level: log.log_level,
        start_time,
        message: fields.message,
        message_extended: fields.message_extended,
        message_without_params_extended: fields.message_without_params_extended,
        message_without_params_and_brackets: fields.message_without_params_and_brackets,
        detected_message: fields.detected_message,
        detected_message_extended: fields.detected_message_extended,
        detected_message_without_params_extended: fields.detected_message_without_params_extended,
        detected_message_without_params_and_brackets: fields
            .detected_message_without_params_and_brackets,
        detected_message_with_numbers: fields.detected_message_with_numbers,
        stacktrace: fields.stacktrace,
        stacktrace_extended: fields.stacktrace_extended,
        merged_small_logs: String::new(),
        only_numbers: fields.only_numbers,
        message_params: fields.message_params,
        urls: fields.urls,
        paths: fields.paths,
        found_exceptions_extended: fields.found_exceptions_extended,
        potential_status_codes: fields.potential_status_codes,
        is_merged: false,
        original_message: log.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyzerMode, Log as ModelLog};

    fn sample_launch() -> Launch {
        Launch {
            launch_id: 1,
            launch_name: "nightly".to_string(),
            project: 42,
            analyzer_config: AnalyzerConfig {
                analyzer_mode: AnalyzerMode::All,
                min_should_match: "80%".to_string(),
                min_doc_freq: 1,
                min_term_freq: 1,
                number_of_log_lines: -1,
            },
            test_items: vec![],
        }
    }

    fn sample_test_item() -> TestItem {
        TestItem {
            test_item_id: 7,
            unique_id: "auto:7".to_string(),
            is_auto_analyzed: false,
            issue_type: "PB001".to_string(),
            logs: vec![],
        }
    }

    #[test]
    fn is_merged_is_always_false_on_creation() {
        let launch = sample_launch();
        let test_item = sample_test_item();
        let log = ModelLog {
            log_id: 100,
            message: "java.lang.NullPointerException: boom\n\tat com.acme.Foo.bar".to_string(),
            log_level: 40000,
        };
        let doc = prepare_log_document(&launch, &test_item, &log);
        assert!(!doc.is_merged);
        assert_eq!(doc.original_message, log.message);
        assert!(doc.message.contains("nullpointerexception"));
    }

    #[test]
    fn message_is_always_sanitized_truncated_form_of_original() {
        let mut launch = sample_launch();
        launch.analyzer_config.number_of_log_lines = 1;
        let test_item = sample_test_item();
        let log = ModelLog {
            log_id: 1,
            message: "First Line\nSecond Line\nThird Line".to_string(),
            log_level: 40000,
        };
        let doc = prepare_log_document(&launch, &test_item, &log);
        assert_eq!(doc.message, "first line");
        assert!(!doc.original_message.is_empty());
    }

    #[test]
    fn full_message_mode_uses_whole_text_for_detected_family() {
        let launch = sample_launch();
        let test_item = sample_test_item();
        let log = ModelLog {
            log_id: 2,
            message: "line one\nline two\nline three".to_string(),
            log_level: 40000,
        };
        let doc = prepare_log_document(&launch, &test_item, &log);
        assert_eq!(doc.detected_message_extended, log.message);
    }

    #[test]
    fn suggest_preparation_leaves_issue_type_blank() {
        let ctx = SuggestLogContext {
            launch_id: 0,
            launch_name: String::new(),
            test_item: 9,
            unique_id: "auto:9".to_string(),
            is_auto_analyzed: false,
        };
        let analyzer_config = AnalyzerConfig {
            analyzer_mode: AnalyzerMode::All,
            min_should_match: "80%".to_string(),
            min_doc_freq: 1,
            min_term_freq: 1,
            number_of_log_lines: -1,
        };
        let log = ModelLog {
            log_id: 3,
            message: "oops".to_string(),
            log_level: 40000,
        };
        let doc = prepare_log_document_for_suggest(&ctx, &log, &analyzer_config);
        assert!(doc.issue_type.is_empty());
        assert_eq!(doc.test_item, 9);
    }
}
