//! Clauses and the surmise function.
//!
//! A surmise function maps every item to a disjunction of clauses. Each clause
//! is one minimal sufficient prerequisite set for its item and always contains
//! the item itself. An item without clauses is unconstrained.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ItemSet, format_set};

// ---------------------------------------------------------------------------
// Clause
// ---------------------------------------------------------------------------

/// One minimal sufficient prerequisite set for `conclusion`.
///
/// Invariant: `conclusion ∈ prerequisites`. The constructor enforces it by
/// union, so every `Clause` value satisfies it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Clause {
    prerequisites: ItemSet,
    conclusion: ItemId,
}

impl Clause {
    pub fn new(prerequisites: impl IntoIterator<Item = ItemId>, conclusion: ItemId) -> Self {
        let mut prerequisites: ItemSet = prerequisites.into_iter().collect();
        prerequisites.insert(conclusion.clone());
        Self {
            prerequisites,
            conclusion,
        }
    }

    pub fn prerequisites(&self) -> &ItemSet {
        &self.prerequisites
    }

    pub fn conclusion(&self) -> &ItemId {
        &self.conclusion
    }

    /// A clause is satisfied by a state that contains all its prerequisites.
    pub fn is_satisfied_by(&self, state: &ItemSet) -> bool {
        self.prerequisites.is_subset(state)
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ⊢ {}", format_set(&self.prerequisites), self.conclusion)
    }
}

// ---------------------------------------------------------------------------
// Surmise function
// ---------------------------------------------------------------------------

/// Mapping from item to its set of clauses.
///
/// Only grows: clauses are added, never removed. Adding a value-equal clause
/// twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurmiseFunction {
    surmise: BTreeMap<ItemId, BTreeSet<Clause>>,
}

impl SurmiseFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `Clause(prerequisites ∪ {item}, item)`.
    ///
    /// Returns `true` if the clause was new.
    pub fn add_clause(
        &mut self,
        item: &ItemId,
        prerequisites: impl IntoIterator<Item = ItemId>,
    ) -> bool {
        let clause = Clause::new(prerequisites, item.clone());
        self.surmise.entry(item.clone()).or_default().insert(clause)
    }

    /// Clauses of `item`; empty when the item is unconstrained.
    pub fn get_clauses<'a>(&'a self, item: &str) -> impl Iterator<Item = &'a Clause> + use<'a> {
        self.surmise.get(item).into_iter().flatten()
    }

    /// Number of clauses stored for `item`.
    pub fn clause_count(&self, item: &str) -> usize {
        self.surmise.get(item).map_or(0, BTreeSet::len)
    }

    /// Whether `item` may belong to `state`: unconstrained, or at least one of
    /// its clauses is satisfied.
    pub fn permits(&self, item: &str, state: &ItemSet) -> bool {
        match self.surmise.get(item) {
            None => true,
            Some(clauses) => clauses.iter().any(|c| c.is_satisfied_by(state)),
        }
    }

    /// Iterate `(item, clauses)` pairs in item order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &BTreeSet<Clause>)> {
        self.surmise.iter()
    }

    /// Items that carry at least one clause.
    pub fn constrained_items(&self) -> impl Iterator<Item = &ItemId> {
        self.surmise.keys()
    }

    /// Every item mentioned anywhere: clause keys and all prerequisites.
    pub fn domain(&self) -> ItemSet {
        let mut items: ItemSet = self.surmise.keys().cloned().collect();
        for clauses in self.surmise.values() {
            for clause in clauses {
                items.extend(clause.prerequisites.iter().cloned());
            }
        }
        items
    }

    /// Total number of clauses across all items.
    pub fn len(&self) -> usize {
        self.surmise.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.surmise.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_set;

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn clause_includes_its_conclusion() {
        let clause = Clause::new(item_set(["a", "b"]), id("c"));
        assert!(clause.prerequisites().contains("c"));
        assert_eq!(clause.conclusion().as_str(), "c");
        assert_eq!(clause.prerequisites(), &item_set(["a", "b", "c"]));
    }

    #[test]
    fn clause_equality_ignores_input_order() {
        let c1 = Clause::new(item_set(["a", "b"]), id("c"));
        let c2 = Clause::new(item_set(["b", "a"]), id("c"));
        assert_eq!(c1, c2);
    }

    #[test]
    fn clause_satisfaction_is_subset() {
        let clause = Clause::new(item_set(["x", "y"]), id("a"));
        assert!(clause.is_satisfied_by(&item_set(["a", "x", "y", "b"])));
        assert!(!clause.is_satisfied_by(&item_set(["a", "x"])));
    }

    #[test]
    fn adding_same_clause_twice_is_noop() {
        let mut sf = SurmiseFunction::new();
        assert!(sf.add_clause(&id("q"), item_set(["a", "b"])));
        assert!(!sf.add_clause(&id("q"), item_set(["a", "b"])));
        assert_eq!(sf.clause_count("q"), 1);
    }

    #[test]
    fn prerequisite_containing_item_is_same_clause() {
        let mut sf = SurmiseFunction::new();
        sf.add_clause(&id("q"), item_set(["a"]));
        sf.add_clause(&id("q"), item_set(["a", "q"]));
        assert_eq!(sf.clause_count("q"), 1);
    }

    #[test]
    fn multiple_clauses_per_item() {
        let mut sf = SurmiseFunction::new();
        sf.add_clause(&id("d"), item_set(["a"]));
        sf.add_clause(&id("d"), item_set(["b", "c"]));

        let clauses: Vec<&Clause> = sf.get_clauses("d").collect();
        assert_eq!(clauses.len(), 2);
        assert!(clauses.contains(&&Clause::new(item_set(["a"]), id("d"))));
        assert!(clauses.contains(&&Clause::new(item_set(["b", "c"]), id("d"))));
    }

    #[test]
    fn unknown_item_has_no_clauses_and_is_permitted() {
        let sf = SurmiseFunction::new();
        assert_eq!(sf.get_clauses("nonexistent").count(), 0);
        assert!(sf.permits("nonexistent", &ItemSet::new()));
    }

    #[test]
    fn stored_clauses_conclude_their_key() {
        let mut sf = SurmiseFunction::new();
        sf.add_clause(&id("a"), item_set(["x"]));
        sf.add_clause(&id("b"), item_set(["a", "y"]));
        for (item, clauses) in sf.iter() {
            assert!(clauses.iter().all(|c| c.conclusion() == item));
        }
    }

    #[test]
    fn domain_collects_keys_and_prerequisites() {
        let mut sf = SurmiseFunction::new();
        sf.add_clause(&id("a"), item_set(["x", "y"]));
        assert_eq!(sf.domain(), item_set(["a", "x", "y"]));
        assert_eq!(sf.len(), 1);
    }
}
