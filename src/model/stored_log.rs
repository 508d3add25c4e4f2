use super::LogDocument;

/// A [`LogDocument`] paired with the id it is (or will be) stored under.
/// The document body itself carries no id — ids are assigned by the
/// caller (`logId` stringified) or synthesized by [`crate::log_merger`]
/// (`_m`/`_big` suffixes).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLog {
    pub id: String,
    pub document: LogDocument,
}

/// Strips a synthetic `_m`/`_big` suffix, recovering the original
/// caller-supplied `logId`. Bare ids are returned unchanged.
pub fn extract_real_id(id: &str) -> &str {
    id.strip_suffix("_m")
        .or_else(|| id.strip_suffix("_big"))
        .unwrap_or(id)
}
