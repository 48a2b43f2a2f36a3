//! Boolean TF-IDF search over an in-memory inverted index.
//!
//! Text goes through one [`Normalizer`] at build and query time. Queries are
//! rewritten to explicit AND/OR/NOT streams, evaluated left to right, and
//! ranked by TF-IDF with an optional popularity multiplier.

pub mod builder;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod query;
pub mod rank;
pub mod resolver;
pub mod search;
pub mod synonyms;
pub mod tokenizer;

pub use builder::{BuildReport, Document, IndexBuilder};
pub use error::{Error, Notice, Result};
pub use index::{DocId, DocMeta, IdfMode, InvertedIndex, Posting, TermEntry};
pub use rank::{Popularity, QueryResult, ScoredDoc};
pub use resolver::{Resolution, SubstitutionSource, TermResolver};
pub use search::{EmptyReason, Engine, IndexHandle, SearchConfig, SearchOutcome, SearchReport};
pub use tokenizer::{Normalizer, NormalizerConfig};
