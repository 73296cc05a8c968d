//! Performance benchmarks for trajscope.
//!
//! Run with: `cargo bench`
//!
//! Scenes come from the seeded synthetic generator, so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::Coord;
use trajscope::analysis::{
    in_monitored_area, with_limits, with_stopped, AnalysisOptions, Polyline, Rectangle, StopConfig,
};
use trajscope::synthetic::SceneConfig;
use trajscope::{build, MemoryStore, TrajectoryCollection, TrajectoryEngine, TrajectoryQuery};

fn scene_collection(object_count: usize) -> TrajectoryCollection {
    let scene = SceneConfig {
        object_count,
        ..SceneConfig::default()
    }
    .generate();
    build(scene.records).unwrap().collection
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for count in [100, 500, 2000].iter() {
        let records = SceneConfig {
            object_count: *count,
            ..SceneConfig::default()
        }
        .generate()
        .records;

        group.bench_with_input(BenchmarkId::new("objects", count), &records, |b, r| {
            b.iter(|| build(black_box(r.clone())))
        });
    }

    group.finish();
}

fn bench_analyses(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyses");
    let options = AnalysisOptions::default();
    let line = Polyline::new(
        "reference line",
        vec![Coord { x: 500.0, y: 0.0 }, Coord { x: 500.0, y: 1000.0 }],
    )
    .unwrap();
    let zone = Rectangle::new(300.0, 700.0, 100.0, 900.0).unwrap();
    let stops = StopConfig {
        min_duration: 10.0,
        ..StopConfig::default()
    };

    for count in [100, 500, 2000].iter() {
        let collection = scene_collection(*count);

        group.bench_with_input(BenchmarkId::new("with_limits", count), &collection, |b, c| {
            b.iter(|| with_limits(black_box(c), &line, &options))
        });
        group.bench_with_input(BenchmarkId::new("with_stopped", count), &collection, |b, c| {
            b.iter(|| with_stopped(black_box(c), &stops, &options))
        });
        group.bench_with_input(
            BenchmarkId::new("in_monitored_area", count),
            &collection,
            |b, c| b.iter(|| in_monitored_area(black_box(c), &zone, &options)),
        );
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    group.sample_size(20);

    let config = SceneConfig {
        object_count: 1000,
        ..SceneConfig::default()
    };
    let date = config.start.date();
    let engine = TrajectoryEngine::new(MemoryStore::new());
    engine.ingest(config.generate().records, "bench-cam").unwrap();

    let query = TrajectoryQuery::new(date, 8.0, 8.5).background("bench-cam");
    group.bench_function("reconstruct_1000", |b| {
        b.iter(|| engine.query(black_box(&query)))
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_analyses, bench_query);
criterion_main!(benches);
