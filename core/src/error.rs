use crate::index::DocId;
use crate::resolver::SubstitutionSource;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Hard failures: corrupt or incompatible index files, bad input, bad configuration.
/// Query evaluation never produces one of these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document id must be a positive integer")]
    InvalidDocumentId,

    #[error("duplicate document id {0}")]
    DuplicateDocument(DocId),

    #[error("incompatible index: {0}")]
    IncompatibleIndex(String),

    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

/// Recoverable conditions absorbed during a build or a search and reported
/// alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The corpus had no documents; the index is empty.
    CorpusEmpty,
    /// No index entry and no fallback for this word; it matched nothing.
    TermUnresolved { term: String },
    /// The word was replaced by a vocabulary term.
    TermSubstituted { original: String, replacement: String, source: SubstitutionSource },
    /// The word normalized to nothing (stopword or punctuation) and was skipped.
    TermIgnored { word: String },
    /// The query had no searchable terms.
    MalformedQuery,
    /// The synonym service failed; approximate matching was used instead.
    CollaboratorUnavailable { term: String, reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::CorpusEmpty => write!(f, "corpus is empty"),
            Notice::TermUnresolved { term } => write!(f, "no match for '{term}'"),
            Notice::TermSubstituted { original, replacement, .. } => {
                write!(f, "searched for '{replacement}' instead of '{original}'")
            }
            Notice::TermIgnored { word } => write!(f, "ignored '{word}'"),
            Notice::MalformedQuery => write!(f, "query has no searchable terms"),
            Notice::CollaboratorUnavailable { term, reason } => {
                write!(f, "synonym lookup for '{term}' failed: {reason}")
            }
        }
    }
}
