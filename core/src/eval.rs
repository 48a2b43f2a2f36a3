use crate::error::Notice;
use crate::index::{DocId, InvertedIndex};
use crate::query::{Operator, QueryToken};
use crate::resolver::{Resolution, TermResolver};
use serde::Serialize;
use std::collections::BTreeSet;

/// One word of the query after normalization and resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedTerm {
    pub word: String,
    /// Operator in effect when the term was combined. Ignored for the seed term.
    pub operator: Operator,
    pub seed: bool,
    pub resolution: Resolution,
}

impl EvaluatedTerm {
    /// Whether the term adds documents to the result (seed, AND, OR) rather than removing them.
    pub fn is_positive(&self) -> bool {
        self.seed || self.operator != Operator::Not
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub docs: BTreeSet<DocId>,
    pub terms: Vec<EvaluatedTerm>,
    pub notices: Vec<Notice>,
    /// False when no word survived normalization.
    pub seeded: bool,
}

impl Evaluation {
    /// Resolved vocabulary terms that contribute to ranking.
    pub fn scoring_terms(&self) -> Vec<&str> {
        self.terms
            .iter()
            .filter(|t| t.is_positive())
            .filter_map(|t| t.resolution.term())
            .collect()
    }
}

enum State {
    AwaitingFirstTerm,
    Accumulating(BTreeSet<DocId>),
}

/// Evaluate a translated token stream left to right with no precedence.
///
/// Operators only change the pending operation. The first term seeds the
/// result; each later term is intersected (AND), merged (OR) or subtracted
/// (NOT). Unresolved terms contribute an empty set, so they empty the result
/// under AND and leave it unchanged under OR and NOT.
pub fn evaluate(index: &InvertedIndex, resolver: &TermResolver, tokens: &[QueryToken]) -> Evaluation {
    let normalizer = index.normalizer();
    let mut state = State::AwaitingFirstTerm;
    let mut current = Operator::And;
    let mut terms = Vec::new();
    let mut notices = Vec::new();

    for token in tokens {
        let word = match token {
            QueryToken::Operator(op) => {
                current = *op;
                continue;
            }
            QueryToken::Word(word) => word,
        };
        let Some(term) = normalizer.normalize_word(word) else {
            notices.push(Notice::TermIgnored { word: word.clone() });
            continue;
        };

        let resolution = resolver.resolve(index, word, &term, &mut notices);
        match &resolution {
            Resolution::Substituted { original, replacement, source } => notices.push(Notice::TermSubstituted {
                original: original.clone(),
                replacement: replacement.clone(),
                source: *source,
            }),
            Resolution::Unresolved { term } => notices.push(Notice::TermUnresolved { term: term.clone() }),
            Resolution::Exact { .. } => {}
        }
        let matched = resolution.term().map(|t| index.doc_ids(t)).unwrap_or_default();

        let seed = matches!(state, State::AwaitingFirstTerm);
        state = match state {
            State::AwaitingFirstTerm => State::Accumulating(matched),
            State::Accumulating(result) => State::Accumulating(combine(result, current, &matched)),
        };
        terms.push(EvaluatedTerm { word: word.clone(), operator: current, seed, resolution });
    }

    let (docs, seeded) = match state {
        State::Accumulating(result) => (result, true),
        State::AwaitingFirstTerm => (BTreeSet::new(), false),
    };
    Evaluation { docs, terms, notices, seeded }
}

fn combine(mut result: BTreeSet<DocId>, op: Operator, matched: &BTreeSet<DocId>) -> BTreeSet<DocId> {
    match op {
        Operator::And => result.retain(|d| matched.contains(d)),
        Operator::Or => result.extend(matched.iter().copied()),
        Operator::Not => result.retain(|d| !matched.contains(d)),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Document, IndexBuilder};
    use crate::query::translate;
    use crate::tokenizer::Normalizer;

    fn index() -> InvertedIndex {
        let mut b = IndexBuilder::new(Normalizer::default());
        b.extend(vec![
            Document::new(1, "city builder strategy"),
            Document::new(2, "city survival horror"),
            Document::new(3, "puzzle strategy"),
        ])
        .unwrap();
        b.build().0
    }

    fn run(q: &str) -> Vec<DocId> {
        evaluate(&index(), &TermResolver::default(), &translate(q)).docs.into_iter().collect()
    }

    #[test]
    fn boolean_operators() {
        assert_eq!(run("city AND strategy"), vec![1]);
        assert_eq!(run("city OR puzzle"), vec![1, 2, 3]);
        assert_eq!(run("strategy NOT survival"), vec![1, 3]);
    }

    #[test]
    fn left_to_right_without_precedence() {
        // (city OR puzzle) AND strategy, not city OR (puzzle AND strategy)
        assert_eq!(run("city OR puzzle AND strategy"), vec![1, 3]);
        // (horror OR puzzle) NOT strategy
        assert_eq!(run("horror OR puzzle NOT strategy"), vec![2]);
    }

    #[test]
    fn first_term_ignores_leading_operator() {
        assert_eq!(run("NOT city"), vec![1, 2]);
        assert_eq!(run("OR puzzle"), vec![3]);
    }

    #[test]
    fn unresolved_terms() {
        assert!(run("strategy zzzznotaword").is_empty());
        assert_eq!(run("strategy OR zzzznotaword"), vec![1, 3]);
        assert_eq!(run("strategy NOT zzzznotaword"), vec![1, 3]);
        assert!(run("zzzznotaword OR strategy").len() == 2);
    }

    #[test]
    fn operators_only_yield_nothing() {
        let e = evaluate(&index(), &TermResolver::default(), &translate("and or not"));
        assert!(e.docs.is_empty());
        assert!(!e.seeded);
    }

    #[test]
    fn stopwords_are_skipped_not_collapsing() {
        let e = evaluate(&index(), &TermResolver::default(), &translate("the city"));
        assert_eq!(e.docs.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(e.notices, vec![Notice::TermIgnored { word: "the".into() }]);
    }

    #[test]
    fn substitutions_are_reported() {
        let e = evaluate(&index(), &TermResolver::default(), &translate("horrro"));
        assert_eq!(e.docs.into_iter().collect::<Vec<_>>(), vec![2]);
        assert!(e.terms[0].resolution.is_substitution());
        assert!(matches!(e.notices.as_slice(), [Notice::TermSubstituted { .. }]));
    }

    #[test]
    fn not_terms_do_not_score() {
        let e = evaluate(&index(), &TermResolver::default(), &translate("strategy NOT survival"));
        assert_eq!(e.scoring_terms(), vec!["strategi"]);
    }

    #[test]
    fn not_term_stays_out_of_scoring_when_or_readmits_its_docs() {
        let e = evaluate(&index(), &TermResolver::default(), &translate("strategy NOT builder OR city"));
        assert_eq!(e.docs.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(e.scoring_terms(), vec!["strategi", "citi"]);
    }
}
