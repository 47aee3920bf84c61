//! Benchmarks for closure and state enumeration.

use std::collections::BTreeMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use surmise::generate::generate_queries_by_block;
use surmise::item::{ItemId, ItemSet};
use surmise::oracle::StatesOracle;
use surmise::query::{Answer, Query};
use surmise::space::LearningSpace;
use surmise::states::{SearchStrategy, knowledge_states};
use surmise::surmise::SurmiseFunction;

fn items(n: usize) -> ItemSet {
    (0..n).map(|i| ItemId::new(format!("i{i:02}"))).collect()
}

/// A chain i00 < i01 < ... with every third item unconstrained.
fn chain(items: &ItemSet) -> SurmiseFunction {
    let ids: Vec<&ItemId> = items.iter().collect();
    let mut sf = SurmiseFunction::new();
    for pair in ids.windows(2).step_by(3) {
        sf.add_clause(pair[1], [pair[0].clone()]);
    }
    sf
}

fn bench_apply_answers(c: &mut Criterion) {
    let items = items(8);
    let truth = chain(&items);
    let oracle = StatesOracle::from_surmise(&truth, &items, SearchStrategy::Breadth);
    let queries = generate_queries_by_block(
        &items,
        2,
        &BTreeMap::new(),
        &mut StdRng::seed_from_u64(0),
    );
    let answered: Vec<Query> = queries
        .into_iter()
        .map(|key| {
            let answer: Answer = oracle.judge(&key.antecedent, &key.question).into();
            Query::answered(key, answer)
        })
        .collect();

    c.bench_function("apply_8_items_block2", |bench| {
        bench.iter(|| {
            let mut space = LearningSpace::new(items.clone());
            for query in &answered {
                if !space.is_known(&query.key) {
                    space.apply_query(query);
                }
            }
            black_box(space.p_yes().len())
        })
    });
}

fn bench_states(c: &mut Criterion) {
    let items = items(12);
    let sf = chain(&items);

    c.bench_function("states_breadth_12", |bench| {
        bench.iter(|| black_box(knowledge_states(&sf, &items, SearchStrategy::Breadth)))
    });
    c.bench_function("states_exhaustive_12", |bench| {
        bench.iter(|| black_box(knowledge_states(&sf, &items, SearchStrategy::Exhaustive)))
    });
}

criterion_group!(benches, bench_apply_answers, bench_states);
criterion_main!(benches);
