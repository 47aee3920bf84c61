//! Feasible knowledge states of a surmise function.
//!
//! A state `K` is feasible when every item in it is permitted: either the
//! item has no clauses, or one of its clauses lies inside `K`. The empty set
//! is always feasible.
//!
//! Both strategies are exponential in the worst case. They are practical for
//! item counts in the low tens; there is no automatic cutoff.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, ItemSet};
use crate::surmise::SurmiseFunction;

/// Largest item count the exhaustive strategy can index with a `usize` mask.
pub const MAX_EXHAUSTIVE_ITEMS: usize = usize::BITS as usize - 1;

/// A knowledge state: the set of items a learner has mastered.
pub type KnowledgeState = ItemSet;

/// How to search the state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Breadth-first from `∅`, adding one item at a time.
    #[default]
    Breadth,
    /// Test every subset of the item set.
    Exhaustive,
}

/// Whether every item of `state` is permitted by `surmise`.
pub fn is_feasible(surmise: &SurmiseFunction, state: &KnowledgeState) -> bool {
    state.iter().all(|item| surmise.permits(item.as_str(), state))
}

/// All feasible states over `items`, ordered by `(|K|, sorted(K))`.
pub fn knowledge_states(
    surmise: &SurmiseFunction,
    items: &ItemSet,
    strategy: SearchStrategy,
) -> Vec<KnowledgeState> {
    let mut states = match strategy {
        SearchStrategy::Exhaustive if items.len() > MAX_EXHAUSTIVE_ITEMS => {
            tracing::warn!(
                items = items.len(),
                max = MAX_EXHAUSTIVE_ITEMS,
                "too many items for exhaustive search, searching breadth-first"
            );
            breadth_first(surmise, items)
        }
        SearchStrategy::Breadth => breadth_first(surmise, items),
        SearchStrategy::Exhaustive => exhaustive(surmise, items),
    };
    sort_states(&mut states);
    tracing::debug!(?strategy, items = items.len(), states = states.len(), "enumerated states");
    states
}

/// Order states by size, then lexicographically by their sorted items.
pub fn sort_states(states: &mut [KnowledgeState]) {
    states.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
}

fn breadth_first(surmise: &SurmiseFunction, items: &ItemSet) -> Vec<KnowledgeState> {
    let empty = KnowledgeState::new();
    let mut seen: HashSet<KnowledgeState> = HashSet::from([empty.clone()]);
    let mut queue: VecDeque<KnowledgeState> = VecDeque::from([empty]);

    while let Some(state) = queue.pop_front() {
        for item in items.iter().filter(|i| !state.contains(*i)) {
            let mut next = state.clone();
            next.insert(item.clone());
            if seen.contains(&next) {
                continue;
            }
            // Clause satisfaction is monotone in the state, so the items
            // already in a feasible state stay permitted; only the new item
            // needs checking.
            if surmise.permits(item.as_str(), &next) {
                seen.insert(next.clone());
                queue.push_back(next);
            }
        }
    }

    seen.into_iter().collect()
}

fn exhaustive(surmise: &SurmiseFunction, items: &ItemSet) -> Vec<KnowledgeState> {
    let universe: Vec<&ItemId> = items.iter().collect();
    (0..1usize << universe.len())
        .map(|mask| {
            universe
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, item)| (*item).clone())
                .collect::<KnowledgeState>()
        })
        .filter(|state| is_feasible(surmise, state))
        .collect()
}
