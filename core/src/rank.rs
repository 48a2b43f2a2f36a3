use crate::index::{DocId, InvertedIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Positive ranking values per document, e.g. review counts. Documents without
/// an entry rank as 1.
pub type Popularity = HashMap<DocId, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Ranked hits: descending score, ties by ascending doc id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    hits: Vec<ScoredDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub offset: usize,
    pub total: usize,
    pub hits: &'a [ScoredDoc],
    pub has_more: bool,
}

impl QueryResult {
    pub fn hits(&self) -> &[ScoredDoc] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|h| h.doc_id).collect()
    }

    pub fn score(&self, doc_id: DocId) -> Option<f64> {
        self.hits.iter().find(|h| h.doc_id == doc_id).map(|h| h.score)
    }

    /// A slice of the ranking. Past the end this is an empty page, which is
    /// not the same thing as a query that matched nothing.
    pub fn page(&self, offset: usize, limit: usize) -> Page<'_> {
        let start = offset.min(self.hits.len());
        let end = start.saturating_add(limit).min(self.hits.len());
        Page { offset, total: self.hits.len(), hits: &self.hits[start..end], has_more: end < self.hits.len() }
    }

    pub fn into_hits(self) -> Vec<ScoredDoc> {
        self.hits
    }
}

/// `ln(1 + popularity)`; missing or non-positive values count as 1.
pub fn popularity_multiplier(popularity: Option<&Popularity>, doc_id: DocId) -> f64 {
    let rank = popularity
        .and_then(|p| p.get(&doc_id))
        .copied()
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0);
    (1.0 + rank).ln()
}

/// Score each candidate as the sum of its TF-IDF weights for `terms`, scaled
/// by the popularity multiplier. Repeated terms count once.
pub fn rank(
    index: &InvertedIndex,
    candidates: &BTreeSet<DocId>,
    terms: &[&str],
    popularity: Option<&Popularity>,
) -> QueryResult {
    let terms: BTreeSet<&str> = terms.iter().copied().collect();
    let mut hits: Vec<ScoredDoc> = candidates
        .iter()
        .map(|&doc_id| {
            let base = terms.iter().fold(0.0, |acc, t| acc + index.weight(t, doc_id));
            ScoredDoc { doc_id, score: base * popularity_multiplier(popularity, doc_id) }
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    QueryResult { hits }
}
