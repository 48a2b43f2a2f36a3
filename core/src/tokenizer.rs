use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Version of the normalization pipeline. Bump whenever a change here would
/// produce different terms for the same input, so old indexes are rejected
/// instead of silently mismatching queries.
pub const NORMALIZER_VERSION: u32 = 1;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    // Stored stripped so contractions match after punctuation removal ("don't" -> "dont").
    static ref STOPWORDS: HashSet<String> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().map(|w| strip_punctuation(w)).collect()
    };
}

/// Settings of the normalization pipeline. Recorded next to every persisted
/// index; queries are always normalized with the config the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub version: u32,
    pub stopwords: bool,
    pub stemming: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { version: NORMALIZER_VERSION, stopwords: true, stemming: true }
    }
}

/// The single text pipeline shared by index construction and query evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    /// Tokenize text into (term, position) using NFKC normalization, lowercase,
    /// punctuation stripping, optional stopword removal and optional stemming.
    /// Positions count raw word tokens, so dropped stopwords leave gaps.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let normalized = fold(text);
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            if let Some(term) = self.normalize_token(mat.as_str()) {
                tokens.push((term, pos));
            }
        }
        tokens
    }

    /// Terms only, in document order.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text).into_iter().map(|(term, _)| term).collect()
    }

    /// Normalize one word the same way `tokenize` normalizes each token.
    /// Returns `None` when the word is a stopword or has no alphanumeric content.
    pub fn normalize_word(&self, word: &str) -> Option<String> {
        self.normalize_token(&fold(word))
    }

    fn normalize_token(&self, token: &str) -> Option<String> {
        let stripped = strip_punctuation(token);
        if stripped.is_empty() {
            return None;
        }
        if self.config.stopwords && is_stopword(&stripped) {
            return None;
        }
        if self.config.stemming {
            Some(STEMMER.stem(&stripped).into_owned())
        } else {
            Some(stripped)
        }
    }
}

/// Split text into case-folded raw words using the same word-boundary rule as
/// `tokenize`, without stripping, stopword removal or stemming.
pub fn segment(text: &str) -> Vec<String> {
    let normalized = fold(text);
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

/// Tokenize with the default pipeline (stopwords removed, stemming on).
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Normalizer::default().tokenize(text)
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert!(t.iter().any(|(w, _)| w == "run"));
    }

    #[test]
    fn positions_skip_stopwords() {
        let t = tokenize("the city of lights");
        let positions: Vec<usize> = t.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn contractions_are_stripped_not_split() {
        let n = Normalizer::new(NormalizerConfig { stopwords: false, stemming: false, ..Default::default() });
        assert_eq!(n.terms("Rock'n'roll isn't dead"), vec!["rocknroll", "isnt", "dead"]);
    }

    #[test]
    fn stopwords_match_after_stripping() {
        let n = Normalizer::default();
        assert_eq!(n.normalize_word("Don't"), None);
        assert_eq!(n.normalize_word("THE"), None);
    }

    #[test]
    fn disabled_stopwords_keep_common_words() {
        let n = Normalizer::new(NormalizerConfig { stopwords: false, ..Default::default() });
        assert_eq!(n.normalize_word("the"), Some("the".to_string()));
    }

    #[test]
    fn disabled_stemming_keeps_surface_form() {
        let n = Normalizer::new(NormalizerConfig { stemming: false, ..Default::default() });
        assert_eq!(n.terms("Strategies"), vec!["strategies"]);
    }

    #[test]
    fn word_and_text_pipelines_agree() {
        let n = Normalizer::default();
        for word in ["Strategy", "survival", "CITIES", "horror's", "puzzles"] {
            assert_eq!(n.normalize_word(word), n.terms(word).into_iter().next());
        }
    }

    #[test]
    fn segment_splits_on_punctuation() {
        assert_eq!(segment("T-Series, OR movies!"), vec!["t", "series", "or", "movies"]);
    }
}
