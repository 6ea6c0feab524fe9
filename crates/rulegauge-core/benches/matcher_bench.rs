use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_core::{candidate_pairs, Atom, Binding, JoinPlanner, Matcher, Pattern, TripleStore, TripleStoreBuilder};
use rulegauge_common::VarId;

fn chain_store(width: u32) -> TripleStore {
    let mut builder = TripleStoreBuilder::new();
    for i in 0..width {
        builder.add_triple(i, "follows", 10_000 + (i * 7) % width);
        builder.add_triple(i, "knows", 10_000 + (i * 3) % width);
        builder.add_triple(10_000 + i, "likes", (i * 5) % width);
    }
    builder.build()
}

fn triangle_pattern() -> Pattern {
    Pattern::new(vec![
        Atom::new(0, "follows", VarId::new(0), VarId::new(1)),
        Atom::new(1, "knows", VarId::new(0), VarId::new(2)),
        Atom::new(2, "likes", VarId::new(2), VarId::new(1)),
    ])
}

fn bench_planner(c: &mut Criterion) {
    let store = chain_store(1_000);
    let pattern = triangle_pattern();

    c.bench_function("planner/order_for", |b| {
        b.iter(|| {
            let planner = JoinPlanner::new(black_box(&store), black_box(&pattern));
            black_box(planner.order_for(&FxHashSet::default()))
        });
    });

    c.bench_function("planner/refine_selectivities", |b| {
        b.iter(|| {
            let mut planner = JoinPlanner::new(black_box(&store), black_box(&pattern));
            planner.refine_selectivities().unwrap();
            black_box(planner.order_for(&FxHashSet::default()))
        });
    });
}

fn bench_matching(c: &mut Criterion) {
    let store = chain_store(1_000);
    let pattern = triangle_pattern();
    let planner = JoinPlanner::new(&store, &pattern);
    let order = planner.order_for(&FxHashSet::default());
    let head = &pattern.atoms()[0];

    c.bench_function("matcher/full_enumeration", |b| {
        b.iter(|| {
            let mut matcher = Matcher::new(&store, &pattern, head);
            let mut count = 0u64;
            let mut partial = Binding::default();
            matcher.matching(
                &order,
                &mut partial,
                &mut |_| count += 1,
                &mut |atom, pm| candidate_pairs(&store, atom, pm),
                &mut |_| false,
            );
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_planner, bench_matching);
criterion_main!(benches);
