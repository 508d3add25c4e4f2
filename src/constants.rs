//! Constants fixed by the external interface contract (§6). These are not
//! tuning knobs — changing them changes the wire protocol or the
//! documented thresholds, so they are not exposed through [`crate::config`].

/// Minimum `log_level` considered by any analysis query.
pub const ERROR_LEVEL: i32 = 40000;

/// Minimum ranker probability for a suggest-pipeline result to be emitted.
pub const SUGGEST_THRESHOLD: f64 = 0.40;

/// Minimum per-field similarity (on all three dedup fields) for two
/// suggest results to be considered duplicates.
pub const SIMILARITY_DEDUP_THRESHOLD: f64 = 0.98;

/// Maximum number of bulk operations sent to the index store per request.
pub const BULK_CHUNK_SIZE: usize = 1000;

/// Upper bound on hits requested from a single search.
pub const MAX_HITS_PER_SEARCH: usize = 10_000;

/// Per-call timeout for every index-store request.
pub const INDEX_STORE_TIMEOUT_SECS: u64 = 30;

/// Maximum retry attempts for a single index-store request.
pub const INDEX_STORE_MAX_RETRIES: u32 = 5;

/// Name of the secondary index holding per-request statistics documents.
pub const STATS_INDEX_NAME: &str = "rp_aa_stats";
