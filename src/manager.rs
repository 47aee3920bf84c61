//! Query lifecycle: which hypothesis to ask next.
//!
//! The manager owns the candidate pool and partitions it into `active`,
//! `answered` and `deactivated`. Before every dequeue it drops active
//! candidates the learning space already settles, since each accepted answer
//! may have made queued candidates redundant. A query leaves `active` exactly
//! once.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::query::{Answer, Query, QueryKey};
use crate::space::{Acceptance, LearningSpace};

/// How the next active query is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// First remaining active query.
    #[default]
    Fifo,
    /// Uniformly random active query.
    Random,
}

/// Owns the candidate pool and drives answer → apply → re-filter.
#[derive(Debug, Clone)]
pub struct QueryManager {
    all_queries: Vec<QueryKey>,
    active: Vec<QueryKey>,
    answered: Vec<Query>,
    deactivated: Vec<QueryKey>,
    /// Membership indexes for `all_queries` and `deactivated`.
    known: HashSet<QueryKey>,
    retired: HashSet<QueryKey>,
    selection: Selection,
    rng: StdRng,
}

impl QueryManager {
    pub fn new(queries: Vec<QueryKey>) -> Self {
        Self {
            active: queries.clone(),
            known: queries.iter().cloned().collect(),
            all_queries: queries,
            answered: Vec::new(),
            deactivated: Vec::new(),
            retired: HashSet::new(),
            selection: Selection::Fifo,
            rng: StdRng::from_entropy(),
        }
    }

    /// Choose the selection order; `rng` drives [`Selection::Random`].
    pub fn with_selection(mut self, selection: Selection, rng: StdRng) -> Self {
        self.selection = selection;
        self.rng = rng;
        self
    }

    /// Next query to ask, or `None` when the pool is exhausted.
    pub fn get_next_query(&mut self, space: &LearningSpace) -> Option<Query> {
        self.filter_queries(space);
        if self.active.is_empty() {
            return None;
        }

        let index = match self.selection {
            Selection::Fifo => 0,
            Selection::Random => self.rng.gen_range(0..self.active.len()),
        };
        Some(Query::new(self.active[index].clone()))
    }

    /// Deactivate every active query that is already settled by `space` or
    /// whose question is not one of its items. Returns how many were removed.
    pub fn filter_queries(&mut self, space: &LearningSpace) -> usize {
        let before = self.active.len();
        let mut removed = Vec::new();

        self.active.retain(|key| {
            let known = space.is_known(key);
            let foreign = !space.items().contains(&key.question);
            if foreign {
                tracing::warn!(query = %key, "skipping query whose question is not a known item");
            }
            if known || foreign {
                removed.push(key.clone());
                false
            } else {
                true
            }
        });

        self.retired.extend(removed.iter().cloned());
        self.deactivated.extend(removed);
        let count = before - self.active.len();
        if count > 0 {
            tracing::debug!(count, remaining = self.active.len(), "deactivated settled queries");
        }
        count
    }

    /// Record the expert's answer and apply it to `space`.
    pub fn record_answer(
        &mut self,
        space: &mut LearningSpace,
        key: QueryKey,
        answer: Answer,
    ) -> Acceptance {
        let query = Query::answered(key, answer);
        self.deactivate(&query.key);
        let acceptance = space.apply_query(&query);
        self.answered.push(query);
        tracing::debug!(active = self.active.len(), "recorded answer");
        acceptance
    }

    /// Replace the active pool, e.g. when resuming a saved session.
    ///
    /// Keys already answered or deactivated are left out.
    pub fn restore_active(&mut self, keys: Vec<QueryKey>) {
        let mut seen = HashSet::with_capacity(keys.len());
        self.active = keys
            .into_iter()
            .filter(|k| !self.retired.contains(k) && seen.insert(k.clone()))
            .collect();
        for key in &self.active {
            if self.known.insert(key.clone()) {
                self.all_queries.push(key.clone());
            }
        }
    }

    fn deactivate(&mut self, key: &QueryKey) {
        if self.retired.contains(key) || !self.known.contains(key) {
            return;
        }
        if let Some(pos) = self.active.iter().position(|k| k == key) {
            let key = self.active.remove(pos);
            self.retired.insert(key.clone());
            self.deactivated.push(key);
        }
    }

    pub fn all_queries(&self) -> &[QueryKey] {
        &self.all_queries
    }

    pub fn active(&self) -> &[QueryKey] {
        &self.active
    }

    pub fn answered(&self) -> &[Query] {
        &self.answered
    }

    pub fn deactivated(&self) -> &[QueryKey] {
        &self.deactivated
    }

    pub fn n_active(&self) -> usize {
        self.active.len()
    }

    pub fn n_deactivated(&self) -> usize {
        self.deactivated.len()
    }
}
