//! Lexical rewrite of free-form queries into explicit boolean token streams.
//!
//! `a b or c` becomes `a AND b OR c`. There is no grouping and no precedence;
//! the evaluator applies operators strictly left to right.

use crate::tokenizer::segment;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    /// Case-insensitive keyword match.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "and" => Some(Operator::And),
            "or" => Some(Operator::Or),
            "not" => Some(Operator::Not),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryToken {
    Operator(Operator),
    Word(String),
}

impl QueryToken {
    pub fn is_word(&self) -> bool {
        matches!(self, QueryToken::Word(_))
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryToken::Operator(op) => f.write_str(op.as_str()),
            QueryToken::Word(w) => f.write_str(w),
        }
    }
}

/// Split `query` into words and operators, inserting `AND` between adjacent words.
pub fn translate(query: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    for word in segment(query) {
        if let Some(op) = Operator::parse(&word) {
            tokens.push(QueryToken::Operator(op));
            continue;
        }
        if matches!(tokens.last(), Some(QueryToken::Word(_))) {
            tokens.push(QueryToken::Operator(Operator::And));
        }
        tokens.push(QueryToken::Word(word));
    }
    tokens
}

pub fn to_boolean_string(tokens: &[QueryToken]) -> String {
    tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
