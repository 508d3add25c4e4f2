//! Collapses many small logs of one test item into per-log-level merged
//! documents, and splits large logs into their own retrievable units
//! (§4.3).

use std::collections::{HashMap, HashSet};

use crate::model::StoredLog;
use crate::text;

/// A partial update touching only `merged_small_logs` on an existing,
/// non-merged document. Emitted only when the value actually changes
/// (§9: the conservative resolution of the `_merge_logs` open question).
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    pub id: String,
    pub merged_small_logs: String,
}

/// The result of merging one test item's raw logs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    /// New `_big`/`_m` synthetic documents to bulk-insert. Any
    /// pre-existing merged documents for this test item must be deleted
    /// by the caller before inserting these (§4.3).
    pub new_documents: Vec<StoredLog>,
    /// Partial updates to existing non-merged documents.
    pub partial_updates: Vec<PartialUpdate>,
}

const SMALL_LOG_MAX_LINES: usize = 2;

fn is_small(raw: &StoredLog) -> bool {
    text::calculate_line_number(&raw.document.original_message) <= SMALL_LOG_MAX_LINES
}

fn normalize(message: &str) -> String {
    text::sanitize_text(message)
}

/// Groups small logs by level and concatenates their deduplicated,
/// normalized messages in input order with `\r\n` separators.
fn build_merged_text_by_level(small_logs: &[&StoredLog]) -> HashMap<i32, String> {
    let mut by_level: HashMap<i32, Vec<&StoredLog>> = HashMap::new();
    for log in small_logs {
        by_level.entry(log.document.log_level).or_default().push(log);
    }

    let mut merged_text = HashMap::new();
    for (level, logs) in by_level {
        let mut seen: HashSet<String> = HashSet::new();
        let mut parts: Vec<&str> = Vec::new();
        for log in &logs {
            let key = normalize(&log.document.original_message);
            if seen.insert(key) {
                parts.push(log.document.original_message.as_str());
            }
        }
        merged_text.insert(level, parts.join("\r\n"));
    }
    merged_text
}

/// Merges one test item's raw logs per §4.3. `raw_logs` must all belong to
/// the same `test_item`.
pub fn merge_logs(raw_logs: &[StoredLog]) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    if raw_logs.is_empty() {
        return outcome;
    }

    let (big_logs, small_logs): (Vec<&StoredLog>, Vec<&StoredLog>) =
        raw_logs.iter().partition(|log| !is_small(log));

    let merged_text_by_level = build_merged_text_by_level(&small_logs);

    let mut levels_with_big: HashSet<i32> = HashSet::new();
    for big in &big_logs {
        let level = big.document.log_level;
        levels_with_big.insert(level);

        let merged_text = merged_text_by_level.get(&level).cloned().unwrap_or_default();

        let mut big_copy = big.document.clone();
        big_copy.is_merged = true;
        outcome.new_documents.push(StoredLog {
            id: format!("{}_big", big.id),
            document: big_copy,
        });

        if !merged_text.is_empty() {
            let mut merged_copy = big.document.clone();
            merged_copy.is_merged = true;
            merged_copy.message = format!("{}\r\n{}", big.document.message, merged_text);
            merged_copy.merged_small_logs = merged_text;
            outcome.new_documents.push(StoredLog {
                id: format!("{}_m", big.id),
                document: merged_copy,
            });
        }
    }

    let mut representative_by_level: HashMap<i32, &StoredLog> = HashMap::new();
    for log in &small_logs {
        representative_by_level.entry(log.document.log_level).or_insert(*log);
    }

    for (level, merged_text) in &merged_text_by_level {
        if levels_with_big.contains(level) {
            continue;
        }
        let Some(representative) = representative_by_level.get(level) else {
            continue;
        };
        let mut merged_copy = representative.document.clone();
        merged_copy.is_merged = true;
        merged_copy.message = merged_text.clone();
        merged_copy.merged_small_logs = merged_text.clone();
        outcome.new_documents.push(StoredLog {
            id: format!("{}_m", representative.id),
            document: merged_copy,
        });
    }

    for log in &small_logs {
        let level = log.document.log_level;
        let merged_text = merged_text_by_level.get(&level).cloned().unwrap_or_default();
        if log.document.merged_small_logs != merged_text {
            outcome.partial_updates.push(PartialUpdate {
                id: log.id.clone(),
                merged_small_logs: merged_text,
            });
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogDocument;

    fn doc(log_level: i32, original_message: &str) -> LogDocument {
        LogDocument {
            launch_id: 1,
            launch_name: "l".to_string(),
            test_item: 1,
            unique_id: "u".to_string(),
            is_auto_analyzed: false,
            issue_type: "AB001".to_string(),
            log_level,
            start_time: "2026-01-01T00:00:00Z".to_string(),
            message: original_message.to_string(),
            message_extended: original_message.to_string(),
            message_without_params_extended: original_message.to_string(),
            message_without_params_and_brackets: original_message.to_string(),
            detected_message: original_message.to_string(),
            detected_message_extended: original_message.to_string(),
            detected_message_without_params_extended: original_message.to_string(),
            detected_message_without_params_and_brackets: original_message.to_string(),
            detected_message_with_numbers: original_message.to_string(),
            stacktrace: String::new(),
            stacktrace_extended: String::new(),
            merged_small_logs: String::new(),
            only_numbers: String::new(),
            message_params: String::new(),
            urls: String::new(),
            paths: String::new(),
            found_exceptions_extended: String::new(),
            potential_status_codes: String::new(),
            is_merged: false,
            original_message: original_message.to_string(),
        }
    }

    #[test]
    fn level_with_only_small_logs_gets_one_merged_document() {
        let logs = vec![
            StoredLog { id: "1".to_string(), document: doc(40000, "boom") },
            StoredLog { id: "2".to_string(), document: doc(40000, "boom") },
            StoredLog { id: "3".to_string(), document: doc(40000, "other error") },
        ];
        let outcome = merge_logs(&logs);
        let merged: Vec<_> = outcome.new_documents.iter().filter(|d| d.document.is_merged).collect();
        assert_eq!(merged.len(), 1, "at most one merged document per (test_item, log_level)");
        assert_eq!(merged[0].id, "1_m");
        assert_eq!(merged[0].document.message, "boom\r\nother error");
    }

    #[test]
    fn big_log_gets_big_and_merged_copies() {
        let big_message = "line1\nline2\nline3\nline4";
        let logs = vec![
            StoredLog { id: "10".to_string(), document: doc(40000, big_message) },
            StoredLog { id: "11".to_string(), document: doc(40000, "small one") },
        ];
        let outcome = merge_logs(&logs);
        let ids: HashSet<_> = outcome.new_documents.iter().map(|d| d.id.clone()).collect();
        assert!(ids.contains("10_big"));
        assert!(ids.contains("10_m"));
        let merged = outcome.new_documents.iter().find(|d| d.id == "10_m").unwrap();
        assert!(merged.document.message.contains("small one"));
        assert!(merged.document.is_merged);
        let big = outcome.new_documents.iter().find(|d| d.id == "10_big").unwrap();
        assert_eq!(big.document.message, big_message);
    }

    #[test]
    fn big_log_with_no_co_located_small_logs_yields_only_big_copy() {
        let big_message = "line1\nline2\nline3\nline4";
        let logs = vec![StoredLog { id: "10".to_string(), document: doc(40000, big_message) }];
        let outcome = merge_logs(&logs);
        let ids: HashSet<_> = outcome.new_documents.iter().map(|d| d.id.clone()).collect();
        assert!(ids.contains("10_big"));
        assert!(!ids.contains("10_m"), "no small logs at this level means no merged counterpart");
        assert_eq!(outcome.new_documents.len(), 1);
    }

    #[test]
    fn partial_updates_only_emitted_when_value_changes() {
        let mut already_merged = doc(40000, "boom");
        already_merged.merged_small_logs = "boom".to_string();
        let logs = vec![
            StoredLog { id: "1".to_string(), document: already_merged },
        ];
        let outcome = merge_logs(&logs);
        assert!(outcome.partial_updates.is_empty(), "unchanged value should not be re-emitted");
    }

    #[test]
    fn partial_update_emitted_when_value_differs() {
        let logs = vec![
            StoredLog { id: "1".to_string(), document: doc(40000, "boom") },
            StoredLog { id: "2".to_string(), document: doc(40000, "boom again") },
        ];
        let outcome = merge_logs(&logs);
        assert_eq!(outcome.partial_updates.len(), 2);
        assert!(outcome.partial_updates.iter().all(|u| u.merged_small_logs == "boom\r\nboom again"));
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let outcome = merge_logs(&[]);
        assert!(outcome.new_documents.is_empty());
        assert!(outcome.partial_updates.is_empty());
    }
}
