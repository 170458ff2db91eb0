//! # Filter Benchmarks
//!
//! Performance benchmarks for tag filtering and reconciliation.
//!
//! Run with: `cargo bench -p tagscope-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tagscope_core::{
    Clause, EngineConfig, EntityId, EntityKind, Fact, FactBody, FilterEngine, MemStore,
    ReconcileEngine, Tag, TagPredicate, Term, filter_facts,
};

const TAGS: usize = 8;

fn tag(i: usize) -> Tag {
    Tag::new(format!("http://example.org/aspects#t{}", i))
}

/// Declaration `i` tagged with two of the `TAGS` aspects.
fn tagged_declaration(i: usize) -> Fact {
    Fact::new(FactBody::declaration(
        EntityKind::NamedIndividual,
        EntityId::new(format!("http://example.org/e{}", i)),
    ))
    .with_tag(tag(i % TAGS))
    .with_tag(tag((i / TAGS) % TAGS))
}

fn create_store(size: usize) -> MemStore {
    MemStore::from_facts((0..size).map(tagged_declaration))
}

/// Chain of subclass axioms `c0 < c1 < ... < cN`, each tagged with `t0`.
fn create_chain_store(size: usize) -> MemStore {
    MemStore::from_facts((0..size).map(|i| {
        Fact::new(FactBody::axiom(
            "SubClassOf",
            vec![
                Term::entity(format!("http://example.org/c{}", i)),
                Term::entity(format!("http://example.org/c{}", i + 1)),
            ],
        ))
        .with_tag(tag(0))
    }))
}

fn disjunction() -> TagPredicate {
    TagPredicate::from_clauses([
        Clause::new([tag(0), tag(1)]),
        Clause::new([tag(2)]),
        Clause::new([tag(3), tag(4)]),
    ])
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_filter_conjunction(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_conjunction");
    let predicate = TagPredicate::from_single_clause([tag(0)]);

    for size in [100, 1000, 10000].iter() {
        let store = create_store(*size);
        let facts: Vec<Fact> = store.facts().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &facts, |b, facts| {
            b.iter(|| black_box(filter_facts(facts, &predicate)));
        });
    }

    group.finish();
}

fn bench_filter_disjunction(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_disjunction");
    let predicate = disjunction();

    for size in [100, 1000, 10000].iter() {
        let store = create_store(*size);
        let facts: Vec<Fact> = store.facts().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &facts, |b, facts| {
            b.iter(|| black_box(filter_facts(facts, &predicate)));
        });
    }

    group.finish();
}

fn bench_module_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("module_expansion");
    let engine = FilterEngine::new(EngineConfig::new(true));
    let predicate = TagPredicate::from_single_clause([tag(0)]);

    for size in [10, 50, 200].iter() {
        let store = create_chain_store(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| black_box(engine.filter_store(store, false, &predicate)));
        });
    }

    group.finish();
}

fn bench_reconcile_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_add");
    let predicate = TagPredicate::from_single_clause([tag(5), tag(6)]);

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = create_store(size);
                let mut engine = ReconcileEngine::new(&mut store);
                for i in 0..size {
                    black_box(engine.add(&tagged_declaration(i), &predicate));
                }
                black_box(store)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_conjunction,
    bench_filter_disjunction,
    bench_module_expansion,
    bench_reconcile_add,
);
criterion_main!(benches);
