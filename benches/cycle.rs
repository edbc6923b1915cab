//! Cycle evaluation benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use habitat::{evaluate, Band, CycleReadings, CycleSnapshot, Limits, Reading};

fn limits() -> Limits {
    Limits {
        avian_temperature: Band::new(20, 22, 28, 32),
        avian_humidity: Band::new(40, 50, 60, 70),
        reptilian_temperature: Band::new(24, 27, 33, 38),
        reptilian_humidity: Band::new(30, 35, 45, 55),
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let limits = limits();
    let cases = [
        ("ideal", CycleReadings::new(Reading::new(25.0, 55.0), Reading::new(30.0, 40.0))),
        ("warning", CycleReadings::new(Reading::new(21.0, 55.0), Reading::new(34.0, 40.0))),
        ("critical", CycleReadings::new(Reading::new(19.0, 75.0), Reading::new(40.0, 20.0))),
    ];

    let mut group = c.benchmark_group("evaluate");
    for (name, readings) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &readings, |b, readings| {
            b.iter(|| evaluate(black_box(&limits), black_box(readings)))
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let limits = limits();
    let readings = CycleReadings::new(Reading::new(19.0, 55.0), Reading::new(30.0, 40.0));

    c.bench_function("snapshot_serialize", |b| {
        let mut snapshot = CycleSnapshot::default();
        b.iter(|| {
            let evaluation = evaluate(&limits, &readings);
            snapshot.set_readings(readings.avian, readings.reptilian);
            snapshot.set_status(evaluation.status);
            let payload = snapshot.serialize();
            snapshot.reset();
            black_box(payload)
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_snapshot);
criterion_main!(benches);
