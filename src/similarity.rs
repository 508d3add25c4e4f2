//! Bag-of-words cosine similarity between a query document and a hit,
//! computed per field (§4.6). This is the cheap, explainable companion to
//! the learned [`Ranker`](crate::ranker) — its output feeds the
//! [`Featurizer`](crate::featurizer) as well as the suggest pipeline's own
//! dedup pass.

use std::collections::HashMap;

use crate::text;

/// Per-field learned term weights, e.g. from a trained word2vec-ish model.
/// Absent weights fall back to a flat weight of `1.0`.
#[derive(Debug, Clone, Default)]
pub struct WordWeights {
    weights: HashMap<String, f64>,
}

impl WordWeights {
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self { weights }
    }

    fn weight(&self, word: &str) -> f64 {
        self.weights.get(word).copied().unwrap_or(1.0)
    }
}

/// Builds a bag-of-words for `text`, capped to the `max_terms` *most
/// weighted* distinct tokens (§4.6) rather than the first `max_terms`
/// encountered in source order.
fn bag_of_words(
    text: &str,
    min_word_length: usize,
    max_terms: usize,
    weights: Option<&WordWeights>,
) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text::split_words(text, min_word_length) {
        *counts.entry(word).or_insert(0) += 1;
    }
    if counts.len() <= max_terms {
        return counts;
    }

    let weight_of = |word: &str| weights.map(|w| w.weight(word)).unwrap_or(1.0);
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a, _), (b, _)| weight_of(b).partial_cmp(&weight_of(a)).unwrap());
    ranked.truncate(max_terms);
    ranked.into_iter().collect()
}

/// Cosine similarity between two pieces of text over their weighted
/// bag-of-words vectors. Two empty texts are defined as identical (`1.0`);
/// one empty and one non-empty are defined as maximally dissimilar (`0.0`)
/// (§4.6 edge case).
pub fn cosine_similarity(
    left: &str,
    right: &str,
    min_word_length: usize,
    max_terms: usize,
    weights: Option<&WordWeights>,
) -> f64 {
    let left_bag = bag_of_words(left, min_word_length, max_terms, weights);
    let right_bag = bag_of_words(right, min_word_length, max_terms, weights);

    if left_bag.is_empty() && right_bag.is_empty() {
        return 1.0;
    }
    if left_bag.is_empty() || right_bag.is_empty() {
        return 0.0;
    }

    let weight_of = |word: &str| weights.map(|w| w.weight(word)).unwrap_or(1.0);

    let mut dot = 0.0;
    let mut left_norm = 0.0;
    let mut right_norm = 0.0;

    for (word, &count) in &left_bag {
        let w = weight_of(word);
        let v = count as f64 * w;
        left_norm += v * v;
        if let Some(&other_count) = right_bag.get(word) {
            dot += v * (other_count as f64 * w);
        }
    }
    for (word, &count) in &right_bag {
        let w = weight_of(word);
        let v = count as f64 * w;
        right_norm += v * v;
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}

/// Identifies one (hit, query) pairing in a [`SimilarityTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimilarityKey {
    pub hit_id: String,
    pub query_id: String,
}

/// `similarity_dict[field][(hit_id, query_id)]` (§4.6): per-field cosine
/// similarity plus the `min_should_match`-style post-filter flag.
#[derive(Debug, Clone, Default)]
pub struct SimilarityTable {
    by_field: HashMap<String, HashMap<SimilarityKey, SimilarityEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEntry {
    pub similarity: f64,
    /// `false` when the similarity falls below the field's configured
    /// `min_should_match` threshold — callers should treat the pairing as
    /// a non-match even though a numeric similarity was computed.
    pub should_match: bool,
}

impl SimilarityTable {
    pub fn insert(&mut self, field: &str, hit_id: &str, query_id: &str, entry: SimilarityEntry) {
        self.by_field
            .entry(field.to_string())
            .or_default()
            .insert(SimilarityKey { hit_id: hit_id.to_string(), query_id: query_id.to_string() }, entry);
    }

    pub fn get(&self, field: &str, hit_id: &str, query_id: &str) -> Option<SimilarityEntry> {
        self.by_field
            .get(field)
            .and_then(|table| table.get(&SimilarityKey { hit_id: hit_id.to_string(), query_id: query_id.to_string() }))
            .copied()
    }
}

/// Computes and records the similarity between `query_text` and `hit_text`
/// for `field` into `table`, applying `min_should_match_fraction` as the
/// post-filter threshold.
pub fn record_field_similarity(
    table: &mut SimilarityTable,
    field: &str,
    hit_id: &str,
    query_id: &str,
    hit_text: &str,
    query_text: &str,
    min_word_length: usize,
    max_terms: usize,
    min_should_match_fraction: f64,
    weights: Option<&WordWeights>,
) {
    let similarity = cosine_similarity(hit_text, query_text, min_word_length, max_terms, weights);
    table.insert(
        field,
        hit_id,
        query_id,
        SimilarityEntry { similarity, should_match: similarity >= min_should_match_fraction },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_similarity_one() {
        let sim = cosine_similarity("connection refused error", "connection refused error", 2, 50, None);
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn both_empty_texts_are_defined_as_identical() {
        assert_eq!(cosine_similarity("", "", 2, 50, None), 1.0);
    }

    #[test]
    fn one_empty_one_non_empty_is_maximally_dissimilar() {
        assert_eq!(cosine_similarity("", "boom", 2, 50, None), 0.0);
    }

    #[test]
    fn disjoint_vocabularies_have_zero_similarity() {
        let sim = cosine_similarity("alpha beta", "gamma delta", 2, 50, None);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn learned_weights_change_similarity_ranking() {
        let mut weights = HashMap::new();
        weights.insert("rare".to_string(), 10.0);
        let ww = WordWeights::new(weights);

        let with_rare = cosine_similarity("rare common", "rare other", 2, 50, Some(&ww));
        let without_rare = cosine_similarity("common only", "other only", 2, 50, Some(&ww));
        assert!(with_rare > without_rare);
    }

    #[test]
    fn truncation_keeps_most_weighted_tokens_not_first_encountered() {
        let mut weights = HashMap::new();
        weights.insert("rare".to_string(), 100.0);
        let ww = WordWeights::new(weights);

        // "rare" appears last in source order but must survive a cap of 1
        // because it is the most heavily weighted token, not "aa"/"bb".
        let bag = bag_of_words("aa bb rare", 2, 1, Some(&ww));
        assert_eq!(bag.len(), 1);
        assert!(bag.contains_key("rare"), "expected the most-weighted token to survive truncation, got {bag:?}");
    }

    #[test]
    fn record_field_similarity_applies_min_should_match_threshold() {
        let mut table = SimilarityTable::default();
        record_field_similarity(&mut table, "message", "hit-1", "query-1", "boom", "boom", 2, 50, 0.99, None);
        let entry = table.get("message", "hit-1", "query-1").unwrap();
        assert!(entry.should_match);

        record_field_similarity(&mut table, "message", "hit-2", "query-1", "boom", "different words entirely", 2, 50, 0.5, None);
        let entry = table.get("message", "hit-2", "query-1").unwrap();
        assert!(!entry.should_match);
    }
}
