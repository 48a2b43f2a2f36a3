//! Synonym lookup used by the term resolver before falling back to approximate matching.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynonymError {
    #[error("synonym request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("synonym service returned status {0}")]
    Status(u16),
}

/// Source of replacement words for a query word that is missing from the vocabulary.
/// Candidates are returned in preference order; an empty list means "no synonyms".
pub trait SynonymSource: Send + Sync {
    fn synonyms(&self, word: &str) -> Result<Vec<String>, SynonymError>;
}

/// Never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSynonyms;

impl SynonymSource for NoSynonyms {
    fn synonyms(&self, _word: &str) -> Result<Vec<String>, SynonymError> {
        Ok(Vec::new())
    }
}

/// Fixed in-memory synonym table, keyed by lowercase word.
#[derive(Debug, Clone, Default)]
pub struct StaticSynonyms {
    table: HashMap<String, Vec<String>>,
}

impl StaticSynonyms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, word: &str, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table
            .insert(word.to_lowercase(), candidates.into_iter().map(Into::into).collect());
    }
}

impl SynonymSource for StaticSynonyms {
    fn synonyms(&self, word: &str) -> Result<Vec<String>, SynonymError> {
        Ok(self.table.get(&word.to_lowercase()).cloned().unwrap_or_default())
    }
}

#[derive(Deserialize)]
struct DatamuseWord {
    word: String,
}

/// Client for the Datamuse `rel_syn` endpoint. Every request carries a timeout.
pub struct DatamuseClient {
    client: reqwest::blocking::Client,
    base_url: String,
    max: usize,
}

impl DatamuseClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.datamuse.com";

    pub fn new(timeout: Duration, max: usize) -> Result<Self, SynonymError> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, timeout, max)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration, max: usize) -> Result<Self, SynonymError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, base_url: base_url.into(), max })
    }
}

impl SynonymSource for DatamuseClient {
    fn synonyms(&self, word: &str) -> Result<Vec<String>, SynonymError> {
        let url = format!("{}/words", self.base_url.trim_end_matches('/'));
        let max = self.max.to_string();
        let resp = self
            .client
            .get(url)
            .query(&[("rel_syn", word), ("max", max.as_str())])
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SynonymError::Status(status.as_u16()));
        }
        let words: Vec<DatamuseWord> = resp.json()?;
        tracing::debug!(word, count = words.len(), "synonyms fetched");
        Ok(words.into_iter().map(|w| w.word).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_table_is_case_insensitive() {
        let mut s = StaticSynonyms::new();
        s.insert("Metropolis", ["city", "town"]);
        assert_eq!(s.synonyms("METROPOLIS").unwrap(), vec!["city", "town"]);
        assert!(s.synonyms("village").unwrap().is_empty());
    }

    #[test]
    fn unreachable_service_is_an_error() {
        let client = DatamuseClient::with_base_url("http://127.0.0.1:9", Duration::from_millis(500), 10).unwrap();
        assert!(client.synonyms("city").is_err());
    }
}
