//! Query serving over one index snapshot.

use crate::error::{Error, Notice, Result};
use crate::eval::{evaluate, EvaluatedTerm};
use crate::index::{DocId, InvertedIndex};
use crate::query::{to_boolean_string, translate};
use crate::rank::{rank, Popularity, QueryResult};
use crate::resolver::{TermResolver, DEFAULT_SIMILARITY_FLOOR};
use crate::synonyms::SynonymSource;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity for an approximate term substitution, in `(0, 1]`.
    pub similarity_floor: f64,
    pub synonym_timeout_ms: u64,
    pub max_synonyms: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { similarity_floor: DEFAULT_SIMILARITY_FLOOR, synonym_timeout_ms: 2000, max_synonyms: 10 }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.similarity_floor > 0.0 && self.similarity_floor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "similarity_floor must be in (0, 1], got {}",
                self.similarity_floor
            )));
        }
        if self.synonym_timeout_ms == 0 {
            return Err(Error::InvalidConfig("synonym_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn synonym_timeout(&self) -> Duration {
        Duration::from_millis(self.synonym_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// Nothing searchable after translation and normalization.
    MalformedQuery,
    /// Searchable terms, but no document satisfied the query.
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum SearchOutcome {
    Hits(QueryResult),
    Empty(EmptyReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub boolean_query: String,
    pub outcome: SearchOutcome,
    pub terms: Vec<EvaluatedTerm>,
    pub notices: Vec<Notice>,
}

impl SearchReport {
    pub fn hits(&self) -> Option<&QueryResult> {
        match &self.outcome {
            SearchOutcome::Hits(result) => Some(result),
            SearchOutcome::Empty(_) => None,
        }
    }

    /// Matched doc ids in rank order; empty for either empty outcome.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits().map(QueryResult::doc_ids).unwrap_or_default()
    }

    pub fn substitutions(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|n| matches!(n, Notice::TermSubstituted { .. }))
    }
}

/// An index plus everything needed to answer queries against it.
pub struct Engine {
    index: InvertedIndex,
    resolver: TermResolver,
    popularity: Option<Popularity>,
}

impl Engine {
    pub fn new(index: InvertedIndex) -> Self {
        Self { index, resolver: TermResolver::default(), popularity: None }
    }

    pub fn with_config(index: InvertedIndex, config: &SearchConfig, synonyms: Arc<dyn SynonymSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self { index, resolver: TermResolver::new(synonyms, config.similarity_floor), popularity: None })
    }

    pub fn with_popularity(mut self, popularity: Popularity) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn search(&self, query: &str) -> SearchReport {
        let tokens = translate(query);
        let boolean_query = to_boolean_string(&tokens);
        let evaluation = evaluate(&self.index, &self.resolver, &tokens);
        let mut notices = evaluation.notices.clone();

        let outcome = if !evaluation.seeded {
            notices.push(Notice::MalformedQuery);
            SearchOutcome::Empty(EmptyReason::MalformedQuery)
        } else if evaluation.docs.is_empty() {
            SearchOutcome::Empty(EmptyReason::NoMatches)
        } else {
            let terms = evaluation.scoring_terms();
            SearchOutcome::Hits(rank(&self.index, &evaluation.docs, &terms, self.popularity.as_ref()))
        };

        tracing::debug!(query, %boolean_query, notices = notices.len(), "query evaluated");
        SearchReport { query: query.to_string(), boolean_query, outcome, terms: evaluation.terms, notices }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("num_docs", &self.index.num_docs())
            .field("num_terms", &self.index.num_terms())
            .field("similarity_floor", &self.resolver.similarity_floor())
            .finish()
    }
}

/// Shared handle for serving while the index is rebuilt elsewhere. Readers take
/// a snapshot and keep using it; a swap never exposes a partially built index.
pub struct IndexHandle {
    current: RwLock<Arc<Engine>>,
}

impl IndexHandle {
    pub fn new(engine: Engine) -> Self {
        Self { current: RwLock::new(Arc::new(engine)) }
    }

    pub fn snapshot(&self) -> Arc<Engine> {
        self.current.read().clone()
    }

    /// Install a freshly built engine and return the one it replaced.
    pub fn swap(&self, engine: Engine) -> Arc<Engine> {
        let next = Arc::new(engine);
        let prev = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(num_docs = prev.index().num_docs(), "index snapshot replaced");
        prev
    }

    pub fn search(&self, query: &str) -> SearchReport {
        self.snapshot().search(query)
    }
}

impl Default for IndexHandle {
    fn default() -> Self {
        Self::new(Engine::new(InvertedIndex::default()))
    }
}

impl From<Engine> for IndexHandle {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}
