//! Edit-distance name similarity.
//!
//! Used by the legacy "similar names" view to propose edges between students
//! whose names are close. Distances are computed over Unicode scalar values
//! (`char`s), so a precomposed Hangul syllable counts as one unit while a
//! decomposed jamo sequence counts as several.

#[cfg(test)]
#[path = "similarity_test.rs"]
mod similarity_test;

use serde::Serialize;

use crate::geometry::EntityId;

/// Levenshtein distance with unit insert/delete/substitute costs.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row of the DP table.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, a_char) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

/// `(max_len - distance) / max_len`, in `[0, 1]`. Two empty strings are
/// identical.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = (max_len - levenshtein(a, b)) as f64 / max_len as f64;
    score
}

/// A pair of entities whose names scored at or above a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    pub a: EntityId,
    pub b: EntityId,
    pub score: f64,
}

/// Every unordered pair in `names` with `similarity >= threshold`, in input order.
#[must_use]
pub fn similar_pairs(names: &[(EntityId, &str)], threshold: f64) -> Vec<SimilarPair> {
    let mut pairs = Vec::new();
    for (i, (id_a, name_a)) in names.iter().enumerate() {
        for (id_b, name_b) in &names[i + 1..] {
            let score = similarity(name_a, name_b);
            if score >= threshold {
                pairs.push(SimilarPair { a: *id_a, b: *id_b, score });
            }
        }
    }
    pairs
}
