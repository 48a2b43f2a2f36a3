//! Batch construction of an [`InvertedIndex`] from a full corpus.
//!
//! Per-document term counting runs in parallel. Document frequencies and IDF
//! values are computed after every document has been counted.

use crate::error::{Error, Notice, Result};
use crate::index::{DocId, IdfMode, InvertedIndex, Posting, TermEntry};
use crate::tokenizer::Normalizer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A document as supplied by the corpus owner. Only used during construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub group: Option<u32>,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), group: None }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub num_docs: u32,
    pub num_terms: usize,
    pub num_postings: usize,
    pub notices: Vec<Notice>,
}

struct DocTerms {
    id: DocId,
    group: Option<u32>,
    length: usize,
    counts: HashMap<String, u32>,
}

pub struct IndexBuilder {
    normalizer: Normalizer,
    idf_mode: IdfMode,
    documents: Vec<Document>,
    seen: HashSet<DocId>,
}

impl IndexBuilder {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer, idf_mode: IdfMode::default(), documents: Vec::new(), seen: HashSet::new() }
    }

    pub fn idf_mode(mut self, mode: IdfMode) -> Self {
        self.idf_mode = mode;
        self
    }

    pub fn add(&mut self, doc: Document) -> Result<()> {
        if doc.id == 0 {
            return Err(Error::InvalidDocumentId);
        }
        if !self.seen.insert(doc.id) {
            return Err(Error::DuplicateDocument(doc.id));
        }
        self.documents.push(doc);
        Ok(())
    }

    pub fn extend<I: IntoIterator<Item = Document>>(&mut self, docs: I) -> Result<()> {
        for doc in docs {
            self.add(doc)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn build(mut self) -> (InvertedIndex, BuildReport) {
        let config = self.normalizer.config();
        if self.documents.is_empty() {
            tracing::warn!("building index from an empty corpus");
            let report = BuildReport { notices: vec![Notice::CorpusEmpty], ..Default::default() };
            return (InvertedIndex::empty(config, self.idf_mode), report);
        }

        self.documents.sort_by_key(|d| d.id);
        let normalizer = self.normalizer;
        let per_doc: Vec<DocTerms> = self
            .documents
            .par_iter()
            .map(|doc| {
                let terms = normalizer.terms(&doc.text);
                let mut counts: HashMap<String, u32> = HashMap::new();
                for term in &terms {
                    *counts.entry(term.clone()).or_insert(0) += 1;
                }
                DocTerms { id: doc.id, group: doc.group, length: terms.len(), counts }
            })
            .collect();

        // Every document is counted before any IDF is computed.
        let num_docs = per_doc.len() as u32;
        let mut df: HashMap<&str, u32> = HashMap::new();
        for doc in &per_doc {
            for term in doc.counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut terms: BTreeMap<String, TermEntry> = df
            .iter()
            .map(|(term, df_t)| {
                let entry = TermEntry { idf: self.idf_mode.idf(num_docs, *df_t), postings: Vec::new() };
                (term.to_string(), entry)
            })
            .collect();

        // per_doc is in doc id order, so postings come out sorted.
        for doc in &per_doc {
            for (term, count) in &doc.counts {
                if let Some(entry) = terms.get_mut(term.as_str()) {
                    let tf = *count as f64 / doc.length as f64;
                    entry.postings.push(Posting { doc_id: doc.id, weight: tf * entry.idf, group: doc.group });
                }
            }
        }

        let index = InvertedIndex::from_parts(terms, num_docs, config, self.idf_mode);
        let report = BuildReport {
            num_docs,
            num_terms: index.num_terms(),
            num_postings: index.num_postings(),
            notices: Vec::new(),
        };
        tracing::info!(num_docs, num_terms = report.num_terms, num_postings = report.num_postings, "index built");
        (index, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(1, "city builder strategy"),
            Document::new(2, "city survival horror"),
            Document::new(3, "puzzle strategy"),
        ]
    }

    fn build(docs: Vec<Document>) -> (InvertedIndex, BuildReport) {
        let mut b = IndexBuilder::new(Normalizer::default());
        b.extend(docs).unwrap();
        b.build()
    }

    #[test]
    fn computes_idf_from_document_frequency() {
        let (index, report) = build(corpus());
        assert_eq!(report.num_docs, 3);
        // "city" -> "citi" appears in 2 of 3 docs: ln(3 / 3) = 0
        assert_eq!(index.idf("citi"), Some(0.0));
        let puzzle = index.idf("puzzl").unwrap();
        assert!((puzzle - (3.0f64 / 2.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn weight_is_normalized_tf_times_idf() {
        let (index, _) = build(vec![
            Document::new(1, "robot robot puzzle"),
            Document::new(2, "horror"),
            Document::new(3, "space"),
            Document::new(4, "city"),
        ]);
        let idf = index.idf("robot").unwrap();
        assert!((idf - (4.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!((index.weight("robot", 1) - (2.0 / 3.0) * idf).abs() < 1e-12);
    }

    #[test]
    fn postings_reference_only_containing_documents() {
        let (index, _) = build(corpus());
        let ids: Vec<DocId> = index.postings("strategi").iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn empty_corpus_degrades_to_empty_index() {
        let (index, report) = IndexBuilder::new(Normalizer::default()).build();
        assert!(index.is_empty());
        assert_eq!(index.num_terms(), 0);
        assert_eq!(report.notices, vec![Notice::CorpusEmpty]);
    }

    #[test]
    fn rejects_zero_and_duplicate_ids() {
        let mut b = IndexBuilder::new(Normalizer::default());
        assert!(matches!(b.add(Document::new(0, "x")), Err(Error::InvalidDocumentId)));
        b.add(Document::new(5, "x")).unwrap();
        assert!(matches!(b.add(Document::new(5, "y")), Err(Error::DuplicateDocument(5))));
    }

    #[test]
    fn stopword_only_documents_still_count_toward_corpus_size() {
        let (index, _) = build(vec![Document::new(1, "the and of"), Document::new(2, "horror")]);
        assert_eq!(index.num_docs(), 2);
        assert!((index.idf("horror").unwrap() - 1f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn group_tags_are_copied_to_postings() {
        let (index, _) = build(vec![Document::new(1, "horror").with_group(4), Document::new(2, "horror")]);
        let groups: Vec<Option<u32>> = index.postings("horror").iter().map(|p| p.group).collect();
        assert_eq!(groups, vec![Some(4), None]);
    }

    #[test]
    fn build_order_does_not_matter() {
        let mut reversed = corpus();
        reversed.reverse();
        assert_eq!(build(corpus()).0, build(reversed).0);
    }
}
