//! Pure, stateless transforms over raw log messages.
//!
//! Everything here is deterministic and allocation-only — no I/O, no
//! shared state — so [`LogPreparation`](crate::log_preparation) and
//! [`LogMerger`](crate::log_merger) can call these freely from both the
//! analyze and suggest code paths.

use std::sync::OnceLock;

use regex::Regex;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s'\]\)>]+").unwrap())
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:[A-Za-z]:)?(?:[/\\][\w.\-]+){2,}").unwrap())
}

fn status_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[1-5][0-9]{2}\b").unwrap())
}

fn exception_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z_][A-Za-z0-9_.]*(?:Exception|Error)\b").unwrap()
    })
}

fn message_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""([^"]+)"|'([^']+)'|\(([^()]+)\)|<([^<>]+)>"#).unwrap()
    })
}

fn control_char_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\[\]]*\]|\{[^{}]*\}").unwrap())
}

fn non_alnum_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").unwrap())
}

/// Returns the first `n` non-empty lines of `text`. `n = -1` returns the
/// whole text unchanged.
pub fn first_lines(text: &str, n: i32) -> String {
    if n == -1 {
        return text.to_string();
    }
    let n = n.max(0) as usize;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(n)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes control characters, collapses runs of whitespace to a single
/// space, trims, and lowercases.
pub fn sanitize_text(text: &str) -> String {
    let no_control = control_char_regex().replace_all(text, "");
    let collapsed = whitespace_regex().replace_all(&no_control, " ");
    collapsed.trim().to_lowercase()
}

/// Tokenizes on runs of non-alphanumeric characters and drops tokens
/// shorter than `min_len`. Tokens are lowercased.
pub fn split_words(text: &str, min_len: usize) -> Vec<String> {
    non_alnum_regex()
        .split(text)
        .filter(|tok| tok.len() >= min_len)
        .map(|tok| tok.to_lowercase())
        .collect()
}

/// Extracts `http(s)://` URLs in appearance order.
pub fn extract_urls(text: &str) -> Vec<String> {
    url_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts filesystem-looking paths (two or more path separators).
pub fn extract_paths(text: &str) -> Vec<String> {
    path_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts bare 3-digit numbers in the HTTP status code range (100-599).
pub fn extract_status_codes(text: &str) -> Vec<String> {
    status_code_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts identifier-shaped tokens ending in `Exception` or `Error`.
pub fn extract_exceptions(text: &str) -> Vec<String> {
    exception_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts the inner text of quoted (`"..."`, `'...'`), parenthesized, and
/// angle-bracketed spans — the substitutable "parameters" of a message.
pub fn extract_message_params(text: &str) -> Vec<String> {
    message_param_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            caps.iter()
                .skip(1)
                .find_map(|g| g.map(|m| m.as_str().to_string()))
        })
        .collect()
}

/// Removes quoted, parenthesized, and angle-bracketed spans from `text`,
/// leaving the surrounding structure intact.
pub fn strip_params(text: &str) -> String {
    let stripped = message_param_regex().replace_all(text, "");
    whitespace_regex().replace_all(&stripped, " ").trim().to_string()
}

/// Removes `[...]` and `{...}` spans from `text`.
pub fn strip_brackets(text: &str) -> String {
    let stripped = bracket_regex().replace_all(text, "");
    whitespace_regex().replace_all(&stripped, " ").trim().to_string()
}

/// Counts the newline-terminated lines in `text`; used to decide
/// small-vs-big when merging (§4.3).
pub fn calculate_line_number(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.lines().count()
}
