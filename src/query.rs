//! Expert queries.
//!
//! A query asks: "if a learner fails every item in `antecedent`, will they
//! certainly also fail `question`?" Identity is the `(antecedent, question)`
//! pair alone. The answer is a separate payload so that collections keyed by
//! the query never depend on a field that changes after insertion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ItemSet, format_set};

/// Immutable identity of a query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    pub antecedent: ItemSet,
    pub question: ItemId,
}

impl QueryKey {
    pub fn new(antecedent: impl IntoIterator<Item = ItemId>, question: ItemId) -> Self {
        Self {
            antecedent: antecedent.into_iter().collect(),
            question,
        }
    }

    pub fn antecedent_size(&self) -> usize {
        self.antecedent.len()
    }

    /// Whether the question is one of the antecedent items. Such a query
    /// holds trivially and says nothing about the relation.
    pub fn is_vacuous(&self) -> bool {
        self.antecedent.contains(&self.question)
    }

    /// `antecedent ∪ {question}`.
    pub fn extended_antecedent(&self) -> ItemSet {
        let mut set = self.antecedent.clone();
        set.insert(self.question.clone());
        set
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", format_set(&self.antecedent), self.question)
    }
}

/// Expert answer to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// The learner would certainly fail the question too.
    Yes,
    /// The learner might still pass the question.
    No,
    #[default]
    Unanswered,
}

impl Answer {
    /// Numeric code used by the answer log: `1` for yes, `0` for no.
    pub fn code(self) -> Option<u8> {
        match self {
            Answer::Yes => Some(1),
            Answer::No => Some(0),
            Answer::Unanswered => None,
        }
    }

    /// Inverse of [`Answer::code`]. Unknown codes read as unanswered.
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            Some(1) => Answer::Yes,
            Some(0) => Answer::No,
            _ => Answer::Unanswered,
        }
    }

    pub fn is_definite(self) -> bool {
        !matches!(self, Answer::Unanswered)
    }
}

/// A query together with its (possibly absent) answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub key: QueryKey,
    pub answer: Answer,
}

impl Query {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            answer: Answer::Unanswered,
        }
    }

    pub fn answered(key: QueryKey, answer: Answer) -> Self {
        Self { key, answer }
    }
}

impl From<QueryKey> for Query {
    fn from(key: QueryKey) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::item::item_set;

    #[test]
    fn key_identity_ignores_antecedent_order() {
        let k1 = QueryKey::new(item_set(["a", "b"]), "q".into());
        let k2 = QueryKey::new(item_set(["b", "a"]), "q".into());
        assert_eq!(k1, k2);

        let mut set = HashSet::new();
        set.insert(k1);
        assert!(set.contains(&k2));
    }

    #[test]
    fn answer_is_not_part_of_identity() {
        let key = QueryKey::new(item_set(["a"]), "b".into());
        let yes = Query::answered(key.clone(), Answer::Yes);
        let no = Query::answered(key.clone(), Answer::No);
        assert_eq!(yes.key, no.key);
    }

    #[test]
    fn answer_codes() {
        assert_eq!(Answer::Yes.code(), Some(1));
        assert_eq!(Answer::No.code(), Some(0));
        assert_eq!(Answer::Unanswered.code(), None);
        assert_eq!(Answer::from_code(Some(1)), Answer::Yes);
        assert_eq!(Answer::from_code(Some(0)), Answer::No);
        assert_eq!(Answer::from_code(None), Answer::Unanswered);
        assert_eq!(Answer::from_code(Some(7)), Answer::Unanswered);
    }

    #[test]
    fn extended_antecedent_adds_question() {
        let key = QueryKey::new(item_set(["a"]), "p".into());
        assert_eq!(key.extended_antecedent(), item_set(["a", "p"]));
        assert_eq!(key.antecedent_size(), 1);
    }

    #[test]
    fn display_renders_implication() {
        let key = QueryKey::new(item_set(["y", "x"]), "a".into());
        assert_eq!(key.to_string(), "{x, y} → a");
    }
}
