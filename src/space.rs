//! The learning space: surmise function plus accepted and pending queries.
//!
//! Acceptance runs in two stages. During questioning, a negative answer is
//! always accepted, and a positive answer is accepted only if it passes the
//! hanging-safe test; otherwise it is parked in the pending table. After the
//! candidate pool is exhausted, [`LearningSpace::run_second_stage`] retries the
//! pending table against the grown surmise function until nothing changes.

use std::collections::BTreeSet;
use std::fmt;

use crate::infer::{ClosureReport, close, hs_test};
use crate::item::{ItemSet, format_set};
use crate::query::{Answer, Query, QueryKey};
use crate::states::{KnowledgeState, SearchStrategy, knowledge_states};
use crate::surmise::SurmiseFunction;

/// What [`LearningSpace::apply_query`] did with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Positive answer passed the HS-test; clause added.
    Positive,
    /// Negative answer, always accepted.
    Negative,
    /// Positive answer failed the HS-test; moved to the pending table.
    Deferred,
    /// No definite answer; nothing changed.
    Ignored,
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceStats {
    /// Queries passed to `apply_query` with a definite answer.
    pub answered_by_oracle: usize,
    /// Queries added to `P_yes`/`P_no` by the inference rules.
    pub derived_by_inference: usize,
    /// Positive answers that went to the pending table at least once.
    pub deferred: usize,
    /// Pending queries later accepted by the second stage.
    pub recovered: usize,
    /// Total closure rounds evaluated.
    pub closure_rounds: usize,
}

/// Outcome of [`LearningSpace::run_second_stage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondStageReport {
    pub rounds: usize,
    pub accepted: usize,
    pub remaining: usize,
}

/// Owns one surmise function and the three query partitions.
///
/// `closed_yes`/`closed_no` hold the full closure, vacuous keys (question
/// inside the antecedent) included, and feed the inference rules. `p_yes` and
/// `p_no` are the same sets without vacuous keys.
#[derive(Debug, Clone, Default)]
pub struct LearningSpace {
    items: ItemSet,
    surmise: SurmiseFunction,
    p_yes: BTreeSet<QueryKey>,
    p_no: BTreeSet<QueryKey>,
    closed_yes: BTreeSet<QueryKey>,
    closed_no: BTreeSet<QueryKey>,
    pending: Vec<QueryKey>,
    stats: SpaceStats,
}

impl LearningSpace {
    /// An empty space over `items`.
    pub fn new(items: ItemSet) -> Self {
        Self::with_surmise(items, SurmiseFunction::new())
    }

    /// A space over `items` starting from an existing surmise function.
    pub fn with_surmise(items: ItemSet, surmise: SurmiseFunction) -> Self {
        Self {
            items,
            surmise,
            ..Default::default()
        }
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn surmise(&self) -> &SurmiseFunction {
        &self.surmise
    }

    /// Mutable access for seeding clauses before questioning starts.
    pub fn surmise_mut(&mut self) -> &mut SurmiseFunction {
        &mut self.surmise
    }

    pub fn p_yes(&self) -> &BTreeSet<QueryKey> {
        &self.p_yes
    }

    pub fn p_no(&self) -> &BTreeSet<QueryKey> {
        &self.p_no
    }

    pub fn pending(&self) -> &[QueryKey] {
        &self.pending
    }

    pub fn stats(&self) -> SpaceStats {
        self.stats
    }

    /// Whether the query is already settled, positively or negatively.
    pub fn is_known(&self, key: &QueryKey) -> bool {
        self.p_yes.contains(key) || self.p_no.contains(key)
    }

    /// Apply an answered query.
    pub fn apply_query(&mut self, query: &Query) -> Acceptance {
        let key = &query.key;
        let acceptance = match query.answer {
            Answer::No => {
                self.record(key, Polarity::Negative);
                self.draw_inference();
                Acceptance::Negative
            }
            Answer::Yes if hs_test(key, &self.surmise) => {
                self.accept_positive(key);
                Acceptance::Positive
            }
            Answer::Yes => {
                if !self.pending.contains(key) {
                    self.pending.push(key.clone());
                }
                self.stats.deferred += 1;
                Acceptance::Deferred
            }
            Answer::Unanswered => return Acceptance::Ignored,
        };

        self.stats.answered_by_oracle += 1;
        tracing::debug!(query = %key, ?acceptance, "applied answer");
        acceptance
    }

    /// Close `P_yes`/`P_no` under the inference rules.
    ///
    /// The report counts every committed key; vacuous ones never reach
    /// `P_yes`/`P_no` or the inference counter.
    pub fn draw_inference(&mut self) -> ClosureReport {
        let report = close(&mut self.closed_yes, &mut self.closed_no);
        let before = self.p_yes.len() + self.p_no.len();
        publish(&self.closed_yes, &mut self.p_yes);
        publish(&self.closed_no, &mut self.p_no);
        self.stats.derived_by_inference += self.p_yes.len() + self.p_no.len() - before;
        self.stats.closure_rounds += report.rounds;
        if report.derived() > 0 {
            tracing::debug!(
                derived_yes = report.derived_yes,
                derived_no = report.derived_no,
                rounds = report.rounds,
                "closure derived new queries"
            );
        }
        report
    }

    /// Retry the pending table until it empties or stops shrinking.
    ///
    /// Each round re-tests every pending query against the current surmise
    /// function. A round that adds no clause ends the stage, which bounds the
    /// number of rounds by the initial pending count.
    pub fn run_second_stage(&mut self) -> SecondStageReport {
        let mut report = SecondStageReport::default();

        while !self.pending.is_empty() {
            report.rounds += 1;
            let working = std::mem::take(&mut self.pending);
            let mut grew = false;

            for key in working {
                if hs_test(&key, &self.surmise) {
                    grew |= self.accept_positive(&key);
                    report.accepted += 1;
                    self.stats.recovered += 1;
                } else {
                    self.pending.push(key);
                }
            }

            tracing::debug!(
                round = report.rounds,
                accepted = report.accepted,
                pending = self.pending.len(),
                "second stage round"
            );

            if !grew {
                break;
            }
        }

        report.remaining = self.pending.len();
        report
    }

    /// Feasible knowledge states over this space's items.
    pub fn knowledge_states(&self, strategy: SearchStrategy) -> Vec<KnowledgeState> {
        knowledge_states(&self.surmise, &self.items, strategy)
    }

    /// Add the clause, record the key as positive and close. Returns whether
    /// the surmise function changed.
    fn accept_positive(&mut self, key: &QueryKey) -> bool {
        let added = self
            .surmise
            .add_clause(&key.question, key.antecedent.iter().cloned());
        self.record(key, Polarity::Positive);
        self.draw_inference();
        added
    }

    fn record(&mut self, key: &QueryKey, polarity: Polarity) {
        let (closed, exposed) = match polarity {
            Polarity::Positive => (&mut self.closed_yes, &mut self.p_yes),
            Polarity::Negative => (&mut self.closed_no, &mut self.p_no),
        };
        closed.insert(key.clone());
        if !key.is_vacuous() {
            exposed.insert(key.clone());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Polarity {
    Positive,
    Negative,
}

/// Copy the non-vacuous keys of `closed` missing from `exposed`.
fn publish(closed: &BTreeSet<QueryKey>, exposed: &mut BTreeSet<QueryKey>) {
    for key in closed {
        if !key.is_vacuous() && !exposed.contains(key) {
            exposed.insert(key.clone());
        }
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a QueryKey>) -> Vec<&'a QueryKey> {
    let mut keys: Vec<&QueryKey> = keys.collect();
    keys.sort_by(|a, b| {
        a.antecedent
            .len()
            .cmp(&b.antecedent.len())
            .then_with(|| a.cmp(b))
    });
    keys
}

impl fmt::Display for LearningSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LearningSpace with {} items:", self.items.len())?;
        let items: Vec<&str> = self.items.iter().map(|i| i.as_str()).collect();
        writeln!(f, "{}", items.join(", "))?;
        writeln!(f)?;

        writeln!(f, "Surmise function (clauses):")?;
        for (item, clauses) in self.surmise.iter() {
            let rendered: Vec<String> = clauses
                .iter()
                .map(|c| format_set(c.prerequisites()))
                .collect();
            writeln!(f, "  {item}: {}", rendered.join("  ∨  "))?;
        }
        writeln!(f)?;

        writeln!(f, "P_yes ({}):", self.p_yes.len())?;
        for key in sorted_keys(self.p_yes.iter()) {
            writeln!(f, "  {} → {}", format_set(&key.antecedent), key.question)?;
        }
        writeln!(f)?;

        writeln!(f, "P_no ({}):", self.p_no.len())?;
        for key in sorted_keys(self.p_no.iter()) {
            writeln!(f, "  {} –/→ {}", format_set(&key.antecedent), key.question)?;
        }
        writeln!(f)?;

        write!(f, "Pending ({}):", self.pending.len())?;
        for key in &self.pending {
            write!(f, "\n  {} → {}", format_set(&key.antecedent), key.question)?;
        }
        Ok(())
    }
}
