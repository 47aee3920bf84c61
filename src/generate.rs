//! Candidate query generation.
//!
//! Candidates are grouped into blocks by antecedent size. Block `k` holds one
//! query for every `k`-subset of the items and every item outside it, so it
//! has `C(n, k) · (n − k)` members before capping. Blocks are concatenated
//! smallest first; within a block the order is shuffled.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::item::{ItemId, ItemSet};
use crate::query::QueryKey;

/// Generate the candidate pool.
///
/// `caps` maps an antecedent size to the maximum number of candidates kept
/// for that block. A missing entry keeps the whole block; a cap of zero drops
/// the block entirely. Capping samples uniformly without replacement.
pub fn generate_queries_by_block<R: Rng + ?Sized>(
    items: &ItemSet,
    max_block_size: usize,
    caps: &BTreeMap<usize, usize>,
    rng: &mut R,
) -> Vec<QueryKey> {
    let universe: Vec<&ItemId> = items.iter().collect();
    let mut queries = Vec::new();

    for block_size in 1..=max_block_size.min(universe.len()) {
        let cap = caps.get(&block_size).copied();
        if cap == Some(0) {
            tracing::debug!(block_size, "block skipped by zero cap");
            continue;
        }

        let mut block = Vec::new();
        for_each_combination(universe.len(), block_size, |indices| {
            let antecedent: ItemSet = indices.iter().map(|&i| universe[i].clone()).collect();
            for question in universe.iter().filter(|q| !antecedent.contains(**q)) {
                block.push(QueryKey {
                    antecedent: antecedent.clone(),
                    question: (*question).clone(),
                });
            }
        });

        // Shuffle then truncate: a uniform sample in random order.
        block.shuffle(rng);
        if let Some(cap) = cap {
            block.truncate(cap);
        }

        tracing::debug!(block_size, candidates = block.len(), "generated block");
        queries.extend(block);
    }

    queries
}

/// Number of candidates an uncapped block of size `k` over `n` items holds.
pub fn block_len(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    binomial(n, k).saturating_mul(n - k)
}

fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

/// Call `f` with every `k`-combination of `0..n` in lexicographic order.
fn for_each_combination(n: usize, k: usize, mut f: impl FnMut(&[usize])) {
    if k == 0 || k > n {
        return;
    }
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        f(&indices);

        // Rightmost index that can still advance.
        let Some(pos) = (0..k).rev().find(|&i| indices[i] != i + n - k) else {
            return;
        };
        indices[pos] += 1;
        for j in pos + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
