//! Fixpoint closure of accepted queries under IR1–IR4.
//!
//! Each round freezes the current positive and negative sets, evaluates every
//! rule over the frozen view (in parallel across the first premise), and only
//! then commits the derived keys. Nothing derived in a round is visible to
//! rule evaluation until the next round. Rounds repeat until one derives
//! nothing new.
//!
//! Writing `(A, p)` for a query with antecedent `A` and question `p`:
//!
//! | rule | premises                          | condition       | derives            |
//! |------|-----------------------------------|-----------------|--------------------|
//! | IR1  | `(A,p)` yes, `(B,q)` yes          | `p ∈ B`         | yes `(A ∪ {p}, q)` |
//! | IR2  | `(A,p)` yes, `(B,q)` yes          | `p ∈ B`         | yes `(A, q)`       |
//! | IR3  | `(A,p)` yes, `(B,q)` no           | `B ∪ {q} = A`   | no `(B, p)`        |
//! | IR4  | `(A,p)` yes, `(B,q)` no           | `A ∪ {p} = B`   | no `(A ∪ {p}, q)`  |
//!
//! IR4's conclusion is its own second premise, so it never adds a new fact.
//! Vacuous conclusions (question inside the antecedent) are committed like any
//! other: they take part as premises in later rounds. Callers that expose the
//! sets decide whether to show them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rayon::prelude::*;

use crate::item::ItemSet;
use crate::query::QueryKey;

/// The four inference rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InferenceRule {
    Ir1,
    Ir2,
    Ir3,
    Ir4,
}

impl fmt::Display for InferenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceRule::Ir1 => "IR1",
            InferenceRule::Ir2 => "IR2",
            InferenceRule::Ir3 => "IR3",
            InferenceRule::Ir4 => "IR4",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

/// Outcome of one call to [`close`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureReport {
    /// Rounds evaluated, including the final round that derived nothing.
    pub rounds: usize,
    /// New members committed to the positive set.
    pub derived_yes: usize,
    /// New members committed to the negative set.
    pub derived_no: usize,
    /// New facts attributed to the first rule that produced them.
    pub rule_stats: BTreeMap<InferenceRule, usize>,
}

impl ClosureReport {
    pub fn derived(&self) -> usize {
        self.derived_yes + self.derived_no
    }
}

/// Close `p_yes` and `p_no` under IR1–IR4.
///
/// Idempotent: calling it again immediately derives nothing.
pub fn close(p_yes: &mut BTreeSet<QueryKey>, p_no: &mut BTreeSet<QueryKey>) -> ClosureReport {
    let mut report = ClosureReport::default();

    loop {
        report.rounds += 1;

        let derivations = evaluate_round(p_yes, p_no);

        let mut new_yes = 0;
        let mut new_no = 0;
        for (rule, polarity, key) in derivations {
            let inserted = match polarity {
                Polarity::Positive => p_yes.insert(key),
                Polarity::Negative => p_no.insert(key),
            };
            if inserted {
                *report.rule_stats.entry(rule).or_insert(0) += 1;
                match polarity {
                    Polarity::Positive => new_yes += 1,
                    Polarity::Negative => new_no += 1,
                }
            }
        }

        tracing::trace!(round = report.rounds, new_yes, new_no, "closure round");

        report.derived_yes += new_yes;
        report.derived_no += new_no;

        if new_yes == 0 && new_no == 0 {
            break;
        }
    }

    report
}

/// Evaluate every rule over a frozen view of both sets.
///
/// Returns candidates that are absent from the frozen view, in a stable
/// order. Duplicates across pairs are resolved at commit time.
fn evaluate_round(
    p_yes: &BTreeSet<QueryKey>,
    p_no: &BTreeSet<QueryKey>,
) -> Vec<(InferenceRule, Polarity, QueryKey)> {
    let yes: Vec<&QueryKey> = p_yes.iter().collect();
    let no: Vec<&QueryKey> = p_no.iter().collect();
    let no_extended: Vec<ItemSet> = no.iter().map(|k| k.extended_antecedent()).collect();

    yes.par_iter()
        .flat_map_iter(|q1| {
            let mut out = Vec::new();
            let q1_extended = q1.extended_antecedent();

            // IR1 and IR2: positive × positive.
            for q2 in &yes {
                if !q2.antecedent.contains(&q1.question) {
                    continue;
                }
                let ir1 = QueryKey {
                    antecedent: q1_extended.clone(),
                    question: q2.question.clone(),
                };
                if !p_yes.contains(&ir1) {
                    out.push((InferenceRule::Ir1, Polarity::Positive, ir1));
                }
                let ir2 = QueryKey {
                    antecedent: q1.antecedent.clone(),
                    question: q2.question.clone(),
                };
                if !p_yes.contains(&ir2) {
                    out.push((InferenceRule::Ir2, Polarity::Positive, ir2));
                }
            }

            // IR3 and IR4: positive × negative.
            for (q2, q2_extended) in no.iter().zip(&no_extended) {
                if *q2_extended == q1.antecedent {
                    let ir3 = QueryKey {
                        antecedent: q2.antecedent.clone(),
                        question: q1.question.clone(),
                    };
                    if !p_no.contains(&ir3) {
                        out.push((InferenceRule::Ir3, Polarity::Negative, ir3));
                    }
                }
                if q1_extended == q2.antecedent {
                    let ir4 = QueryKey {
                        antecedent: q1_extended.clone(),
                        question: q2.question.clone(),
                    };
                    if !p_no.contains(&ir4) {
                        out.push((InferenceRule::Ir4, Polarity::Negative, ir4));
                    }
                }
            }

            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_set;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn key(antecedent: &[&str], question: &str) -> QueryKey {
        QueryKey::new(item_set(antecedent.iter().copied()), question.into())
    }

    fn sets(yes: &[QueryKey], no: &[QueryKey]) -> (BTreeSet<QueryKey>, BTreeSet<QueryKey>) {
        (yes.iter().cloned().collect(), no.iter().cloned().collect())
    }

    #[test]
    fn ir1_extends_antecedent_with_premise_question() {
        let (mut yes, mut no) = sets(&[key(&["a"], "p"), key(&["p"], "q")], &[]);
        close(&mut yes, &mut no);
        assert!(yes.contains(&key(&["a", "p"], "q")));
    }

    #[test]
    fn ir2_chains_antecedent_to_second_question() {
        let (mut yes, mut no) = sets(&[key(&["a"], "p"), key(&["p", "x"], "q")], &[]);
        close(&mut yes, &mut no);
        assert!(yes.contains(&key(&["a"], "q")));
    }

    #[test]
    fn ir3_derives_negative_from_extended_antecedent() {
        let (mut yes, mut no) = sets(&[key(&["b", "q"], "p")], &[key(&["b"], "q")]);
        let report = close(&mut yes, &mut no);
        assert!(no.contains(&key(&["b"], "p")));
        assert_eq!(report.rule_stats.get(&InferenceRule::Ir3), Some(&1));
    }

    #[test]
    fn ir4_adds_nothing_new() {
        let (mut yes, mut no) = sets(&[key(&["a"], "p")], &[key(&["a", "p"], "q")]);
        let report = close(&mut yes, &mut no);
        assert!(no.contains(&key(&["a", "p"], "q")));
        assert_eq!(no.len(), 1);
        assert_eq!(report.derived(), 0);
        assert!(report.rule_stats.get(&InferenceRule::Ir4).is_none());
    }

    #[test]
    fn combined_positive_rules() {
        let (mut yes, mut no) = sets(&[key(&["a"], "p"), key(&["p"], "q")], &[]);
        let report = close(&mut yes, &mut no);
        assert!(yes.contains(&key(&["a", "p"], "q")));
        assert!(yes.contains(&key(&["a"], "q")));
        assert!(report.derived_yes >= 2);
        assert!(report.rounds >= 2);
    }

    #[test]
    fn closure_is_idempotent() {
        let (mut yes, mut no) = sets(
            &[key(&["a"], "b"), key(&["b"], "c"), key(&["c"], "d")],
            &[key(&["d"], "a")],
        );
        close(&mut yes, &mut no);
        let yes_after = yes.clone();
        let no_after = no.clone();

        let second = close(&mut yes, &mut no);
        assert_eq!(second.derived(), 0);
        assert_eq!(second.rounds, 1);
        assert_eq!(yes, yes_after);
        assert_eq!(no, no_after);
    }

    #[test]
    fn mutual_implication_keeps_vacuous_premises() {
        let (mut yes, mut no) = sets(&[key(&["a"], "b"), key(&["b"], "a")], &[]);
        close(&mut yes, &mut no);
        assert!(yes.contains(&key(&["a"], "a")));
        assert!(yes.contains(&key(&["a", "b"], "a")));
        assert!(yes.contains(&key(&["b"], "b")));
    }

    #[test]
    fn vacuous_intermediate_settles_real_query() {
        // ({b,c}, b) is vacuous, but IR1 needs it to reach ({a,c,d}, b).
        let (mut yes, mut no) = sets(
            &[
                key(&["a", "b"], "d"),
                key(&["a", "d"], "b"),
                key(&["b", "c"], "d"),
                key(&["b", "d"], "c"),
            ],
            &[],
        );
        close(&mut yes, &mut no);
        assert!(yes.contains(&key(&["b", "c"], "b")));
        assert!(yes.contains(&key(&["a", "d"], "c")));
        assert!(yes.contains(&key(&["a", "c", "d"], "b")));
    }

    /// Sequential fixpoint applying each rule as soon as it fires.
    fn reference_close(yes: &mut BTreeSet<QueryKey>, no: &mut BTreeSet<QueryKey>) {
        loop {
            let mut changed = false;
            let ys: Vec<QueryKey> = yes.iter().cloned().collect();
            let ns: Vec<QueryKey> = no.iter().cloned().collect();
            for q1 in &ys {
                let extended = q1.extended_antecedent();
                for q2 in &ys {
                    if q2.antecedent.contains(&q1.question) {
                        changed |= yes.insert(QueryKey::new(extended.clone(), q2.question.clone()));
                        changed |= yes.insert(QueryKey::new(q1.antecedent.clone(), q2.question.clone()));
                    }
                }
                for q2 in &ns {
                    if q2.extended_antecedent() == q1.antecedent {
                        changed |= no.insert(QueryKey::new(q2.antecedent.clone(), q1.question.clone()));
                    }
                    if extended == q2.antecedent {
                        changed |= no.insert(QueryKey::new(extended.clone(), q2.question.clone()));
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn random_key(rng: &mut StdRng, items: &[&str]) -> QueryKey {
        let question = items[rng.gen_range(0..items.len())];
        let antecedent: Vec<&str> = items
            .iter()
            .copied()
            .filter(|i| *i != question && rng.gen_range(0..2) == 1)
            .collect();
        key(&antecedent, question)
    }

    #[test]
    fn matches_sequential_fixpoint_on_random_inputs() {
        let items = ["a", "b", "c", "d"];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..300 {
            let yes: Vec<QueryKey> = (0..rng.gen_range(0..6))
                .map(|_| random_key(&mut rng, &items))
                .collect();
            let no: Vec<QueryKey> = (0..rng.gen_range(0..4))
                .map(|_| random_key(&mut rng, &items))
                .collect();

            let (mut yes_a, mut no_a) = sets(&yes, &no);
            let (mut yes_b, mut no_b) = sets(&yes, &no);
            close(&mut yes_a, &mut no_a);
            reference_close(&mut yes_b, &mut no_b);

            assert_eq!(yes_a, yes_b, "positive sets differ for yes={yes:?} no={no:?}");
            assert_eq!(no_a, no_b, "negative sets differ for yes={yes:?} no={no:?}");
        }
    }

    #[test]
    fn empty_sets_close_in_one_round() {
        let (mut yes, mut no) = sets(&[], &[]);
        let report = close(&mut yes, &mut no);
        assert_eq!(report.rounds, 1);
        assert_eq!(report.derived(), 0);
    }

    #[test]
    fn unrelated_queries_derive_nothing() {
        let (mut yes, mut no) = sets(&[key(&["a"], "b"), key(&["c"], "d")], &[key(&["x"], "y")]);
        let report = close(&mut yes, &mut no);
        assert_eq!(report.derived(), 0);
    }
}
