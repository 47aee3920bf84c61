//! Export types for serializing a finished learning space.
//!
//! These are plain, id-sorted representations suitable for JSON output and
//! for downstream lattice tooling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::lattice::Lattice;
use crate::states::KnowledgeState;
use crate::surmise::SurmiseFunction;

/// All clauses of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseExport {
    /// The constrained item.
    pub item: ItemId,
    /// Alternative prerequisite sets, each containing `item`.
    pub clauses: Vec<Vec<ItemId>>,
}

/// One feasible knowledge state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateExport {
    pub size: usize,
    pub items: Vec<ItemId>,
}

/// `prerequisite` appears in some clause of `item`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Implication {
    pub prerequisite: ItemId,
    pub item: ItemId,
}

/// States plus covering edges by state position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeExport {
    pub states: Vec<StateExport>,
    pub edges: Vec<(usize, usize)>,
}

pub fn export_clauses(surmise: &SurmiseFunction) -> Vec<ClauseExport> {
    surmise
        .iter()
        .map(|(item, clauses)| ClauseExport {
            item: item.clone(),
            clauses: clauses
                .iter()
                .map(|c| c.prerequisites().iter().cloned().collect())
                .collect(),
        })
        .collect()
}

pub fn export_states(states: &[KnowledgeState]) -> Vec<StateExport> {
    states
        .iter()
        .map(|s| StateExport {
            size: s.len(),
            items: s.iter().cloned().collect(),
        })
        .collect()
}

/// Every `(prerequisite, item)` pair across all clauses, without
/// self-implications, sorted and deduplicated.
pub fn implications(surmise: &SurmiseFunction) -> Vec<Implication> {
    let pairs: BTreeSet<Implication> = surmise
        .iter()
        .flat_map(|(item, clauses)| {
            clauses.iter().flat_map(move |clause| {
                clause
                    .prerequisites()
                    .iter()
                    .filter(move |p| *p != item)
                    .map(move |p| Implication {
                        prerequisite: p.clone(),
                        item: item.clone(),
                    })
            })
        })
        .collect();
    pairs.into_iter().collect()
}

impl From<&Lattice> for LatticeExport {
    fn from(lattice: &Lattice) -> Self {
        let states: Vec<KnowledgeState> = lattice.states().cloned().collect();
        Self {
            states: export_states(&states),
            edges: lattice.covering_edges(),
        }
    }
}
