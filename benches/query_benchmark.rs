use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use propgraph::{Comparator, Direction, ElementClass, GraphBuilder, Indexed, PropertyGraph, Session};

fn populated(size: i64, indexed: bool) -> Session {
    let graph = GraphBuilder::new().build().unwrap();
    let mut s = graph.open_session().unwrap();
    for i in 0..size {
        let v = s.add_vertex(None).unwrap();
        s.set_property(&v, "name", format!("Person{}", i)).unwrap();
        s.set_property(&v, "age", i % 100).unwrap();
    }
    if indexed {
        s.create_key_index("age", ElementClass::Vertex).unwrap();
    }
    s
}

/// Benchmark vertex insertion with and without a key index
fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_insertion");

    for size in [100i64, 1000].iter() {
        for indexed in [false, true] {
            let id = format!("{}/{}", size, if indexed { "indexed" } else { "plain" });
            group.bench_with_input(BenchmarkId::from_parameter(id), size, |b, &size| {
                b.iter(|| {
                    let s = populated(size, indexed);
                    criterion::black_box(s.last_generation());
                });
            });
        }
    }
    group.finish();
}

/// Benchmark equality lookups answered by a key index against full scans
fn bench_equality_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("equality_lookup");

    for size in [1000i64, 10_000].iter() {
        let mut scanned = populated(*size, false);
        group.bench_with_input(BenchmarkId::new("scan", size), size, |b, _| {
            b.iter(|| {
                let found = scanned.get_vertices("age", 42i64).unwrap();
                criterion::black_box(found.len());
            });
        });

        let mut indexed = populated(*size, true);
        group.bench_with_input(BenchmarkId::new("key_index", size), size, |b, _| {
            b.iter(|| {
                let found = indexed.get_vertices("age", 42i64).unwrap();
                criterion::black_box(found.len());
            });
        });
    }
    group.finish();
}

/// Benchmark range predicates with a limit
fn bench_range_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_query");

    for size in [1000i64, 10_000].iter() {
        let mut s = populated(*size, true);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let found = s
                    .query()
                    .interval("age", 20i64, 30i64)
                    .unwrap()
                    .has_cmp("name", Comparator::NotEqual, "Person25")
                    .unwrap()
                    .limit(50)
                    .unwrap()
                    .vertices()
                    .unwrap();
                criterion::black_box(found.len());
            });
        });
    }
    group.finish();
}

/// Benchmark vertex-centric edge queries on a star graph
fn bench_vertex_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_query");

    for degree in [100i64, 1000].iter() {
        let graph = GraphBuilder::new().build().unwrap();
        let mut s = graph.open_session().unwrap();
        let hub = s.add_vertex(None).unwrap();
        for i in 0..*degree {
            let leaf = s.add_vertex(None).unwrap();
            let label = if i % 2 == 0 { "knows" } else { "created" };
            let e = s.add_edge(None, &hub, &leaf, label).unwrap();
            s.set_property(&e, "weight", (i % 10) as f64 / 10.0).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(degree), degree, |b, _| {
            b.iter(|| {
                let count = s
                    .vertex_query(&hub)
                    .unwrap()
                    .direction(Direction::Out)
                    .labels(&["knows"])
                    .has_cmp("weight", Comparator::GreaterThan, 0.5)
                    .unwrap()
                    .count()
                    .unwrap();
                criterion::black_box(count);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insertion,
    bench_equality_lookup,
    bench_range_query,
    bench_vertex_query
);
criterion_main!(benches);
