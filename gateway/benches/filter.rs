//! Filter hot-path benchmarks
//!
//! Measures `evaluate` per message: JSON parse, path lookup, and (for hot
//! readings) building the enriched alert.

use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use edgefilter_gateway::{Message, evaluate};

fn make_reading(temperature: f64, padding: usize) -> Message {
    let filler = "x".repeat(padding);
    Message::from_bytes(Bytes::from(format!(
        r#"{{"machine":{{"temperature":{temperature},"pressure":1.2}},"ambient":{{"temperature":21.5,"humidity":40}},"timeCreated":"2024-01-01T00:00:00Z","pad":"{filler}"}}"#
    )))
    .with_property("source", "sensor-7")
    .with_property("trace_id", "abc123def456")
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.throughput(Throughput::Elements(1000));

    let cool = make_reading(20.0, 0);
    let hot = make_reading(30.0, 0);

    group.bench_function("dropped_below_threshold", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let _ = black_box(evaluate(black_box(&cool), 25));
            }
        })
    });

    group.bench_function("forwarded_alert", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let _ = black_box(evaluate(black_box(&hot), 25));
            }
        })
    });

    group.finish();
}

fn bench_payload_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_sizes");

    for size in [100, 1000, 10000, 100000] {
        group.throughput(Throughput::Bytes(size as u64 * 100)); // 100 messages

        let msg = make_reading(30.0, size);

        group.bench_function(format!("evaluate_{}b_payload", size), |b| {
            b.iter(|| {
                for _ in 0..100 {
                    let _ = black_box(evaluate(&msg, 25));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_payload_sizes);
criterion_main!(benches);
