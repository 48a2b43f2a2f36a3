use crate::tokenizer::{Normalizer, NormalizerConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type DocId = u32;

/// Presentation metadata kept beside an index by the tools that own the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub url: Option<String>,
    /// Positive ranking signal (e.g. review count) used as the ranker's popularity multiplier.
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64, // tf * idf
    pub group: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub idf: f64,
    pub postings: Vec<Posting>, // sorted by doc_id
}

impl TermEntry {
    pub fn document_frequency(&self) -> usize {
        self.postings.len()
    }

    pub fn weight(&self, doc_id: DocId) -> Option<f64> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| self.postings[i].weight)
    }

    pub fn doc_ids(&self) -> BTreeSet<DocId> {
        self.postings.iter().map(|p| p.doc_id).collect()
    }
}

/// How inverse document frequency is derived from corpus size `N` and document frequency `df`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// `ln(N / (1 + df))`. Zero or negative for terms in most documents.
    #[default]
    Standard,
    /// `ln(1 + N / (1 + df))`. Always positive.
    Smoothed,
}

impl IdfMode {
    pub fn idf(self, num_docs: u32, df: u32) -> f64 {
        let ratio = num_docs as f64 / (1.0 + df as f64);
        match self {
            IdfMode::Standard => ratio.ln(),
            IdfMode::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Term-level inverted index for one corpus snapshot. Built by
/// [`IndexBuilder`](crate::builder::IndexBuilder) or loaded from disk; never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    pub(crate) terms: BTreeMap<String, TermEntry>,
    pub(crate) num_docs: u32,
    pub(crate) normalizer: NormalizerConfig,
    pub(crate) idf_mode: IdfMode,
}

impl InvertedIndex {
    pub fn empty(normalizer: NormalizerConfig, idf_mode: IdfMode) -> Self {
        Self { terms: BTreeMap::new(), num_docs: 0, normalizer, idf_mode }
    }

    pub(crate) fn from_parts(
        terms: BTreeMap<String, TermEntry>,
        num_docs: u32,
        normalizer: NormalizerConfig,
        idf_mode: IdfMode,
    ) -> Self {
        Self { terms, num_docs, normalizer, idf_mode }
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_docs == 0
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        self.normalizer
    }

    /// The pipeline every query against this index must go through.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.normalizer)
    }

    pub fn idf_mode(&self) -> IdfMode {
        self.idf_mode
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn entry(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.terms.get(term).map(|e| e.idf)
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map(|e| e.postings.as_slice()).unwrap_or(&[])
    }

    /// Documents containing `term`; empty for terms outside the vocabulary.
    pub fn doc_ids(&self, term: &str) -> BTreeSet<DocId> {
        self.terms.get(term).map(TermEntry::doc_ids).unwrap_or_default()
    }

    /// TF-IDF weight of `term` in `doc_id`, 0 when the document does not contain it.
    pub fn weight(&self, term: &str, doc_id: DocId) -> f64 {
        self.terms.get(term).and_then(|e| e.weight(doc_id)).unwrap_or(0.0)
    }

    /// Vocabulary in lexicographic order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn num_postings(&self) -> usize {
        self.terms.values().map(|e| e.postings.len()).sum()
    }
}
