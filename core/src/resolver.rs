//! Substitution of query terms that are missing from the vocabulary.
//!
//! Order of attempts: synonym source, then the closest vocabulary term by
//! Ratcliff/Obershelp similarity above a floor. A term that survives neither
//! stays unresolved and matches no documents.

use crate::error::Notice;
use crate::index::InvertedIndex;
use crate::synonyms::{NoSynonyms, SynonymSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionSource {
    Synonym,
    Approximate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// The normalized term is in the vocabulary.
    Exact { term: String },
    /// `original` (the word as typed) was replaced by vocabulary term `replacement`.
    Substituted { original: String, replacement: String, source: SubstitutionSource },
    Unresolved { term: String },
}

impl Resolution {
    /// The vocabulary term to look up, if any.
    pub fn term(&self) -> Option<&str> {
        match self {
            Resolution::Exact { term } => Some(term),
            Resolution::Substituted { replacement, .. } => Some(replacement),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn is_substitution(&self) -> bool {
        matches!(self, Resolution::Substituted { .. })
    }
}

#[derive(Clone)]
pub struct TermResolver {
    synonyms: Arc<dyn SynonymSource>,
    similarity_floor: f64,
}

impl Default for TermResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoSynonyms), DEFAULT_SIMILARITY_FLOOR)
    }
}

impl TermResolver {
    pub fn new(synonyms: Arc<dyn SynonymSource>, similarity_floor: f64) -> Self {
        Self { synonyms, similarity_floor }
    }

    pub fn similarity_floor(&self) -> f64 {
        self.similarity_floor
    }

    /// Resolve `term` (the normalized form of `word`) against the index vocabulary.
    /// Synonym service failures are pushed to `notices` and do not stop resolution.
    pub fn resolve(&self, index: &InvertedIndex, word: &str, term: &str, notices: &mut Vec<Notice>) -> Resolution {
        if index.contains(term) {
            return Resolution::Exact { term: term.to_string() };
        }

        match self.synonyms.synonyms(word) {
            Ok(candidates) => {
                if let Some(replacement) = first_known_synonym(index, term, &candidates) {
                    tracing::debug!(word, %replacement, "resolved by synonym");
                    return Resolution::Substituted {
                        original: word.to_string(),
                        replacement,
                        source: SubstitutionSource::Synonym,
                    };
                }
            }
            Err(err) => {
                tracing::warn!(word, error = %err, "synonym lookup failed, using approximate match");
                notices.push(Notice::CollaboratorUnavailable { term: word.to_string(), reason: err.to_string() });
            }
        }

        if let Some(replacement) = self.closest_term(index, term) {
            tracing::debug!(word, %replacement, "resolved by approximate match");
            return Resolution::Substituted {
                original: word.to_string(),
                replacement,
                source: SubstitutionSource::Approximate,
            };
        }

        tracing::debug!(word, "term unresolved");
        Resolution::Unresolved { term: word.to_string() }
    }

    /// Most similar vocabulary term at or above the floor; ties go to the
    /// lexicographically largest term.
    pub fn closest_term(&self, index: &InvertedIndex, term: &str) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in index.vocabulary() {
            let score = similarity(term, candidate);
            if score < self.similarity_floor {
                continue;
            }
            match best {
                // Vocabulary iterates ascending; replacing on equal scores keeps the largest term.
                Some((_, best_score)) if score < best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(t, _)| t.to_string())
    }
}

// Synonyms are normalized with the index pipeline; multi-word candidates are skipped.
fn first_known_synonym(index: &InvertedIndex, term: &str, candidates: &[String]) -> Option<String> {
    let normalizer = index.normalizer();
    candidates.iter().find_map(|candidate| {
        let mut terms = normalizer.terms(candidate).into_iter();
        match (terms.next(), terms.next()) {
            (Some(t), None) if t != term && index.contains(&t) => Some(t),
            _ => None,
        }
    })
}

/// Ratcliff/Obershelp similarity: `2 * matches / (len(a) + len(b))`, where
/// matches are counted by recursively taking the longest common block.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

// (start in a, start in b, length); earliest block wins among equal lengths.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}
