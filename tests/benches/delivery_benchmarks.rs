//! # Delivery Benchmarks
//!
//! | Path | Measures |
//! |------|----------|
//! | `filter::matches` | Field lookup and text comparison per entry |
//! | `TopicSubscription::deliver` | Fan-out across N entries, half matching |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use relay_gateway::delivery::{matches, OutboundMessage};
use relay_gateway::{ClientHandle, ConnectionId, DeliveryEntry, TopicSubscription};
use serde_json::json;
use shared_bus::Payload;
use std::time::Duration;
use tokio::sync::mpsc;

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("delivery-filter");

    let text = Payload::new(json!({"level": "high", "msg": "disk usage above threshold"}));
    let number = Payload::new(json!({"code": 503, "retry": true}));
    let nested = Payload::new(json!({"meta": {"region": "eu", "zone": 3}}));

    group.bench_function("string_match", |b| {
        b.iter(|| black_box(matches(&text, "level", "high")))
    });
    group.bench_function("number_match", |b| {
        b.iter(|| black_box(matches(&number, "code", "503")))
    });
    group.bench_function("missing_field", |b| {
        b.iter(|| black_box(matches(&text, "severity", "high")))
    });
    group.bench_function("object_match", |b| {
        b.iter(|| black_box(matches(&nested, "meta", r#"{"region":"eu","zone":3}"#)))
    });

    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("delivery-fan-out");
    group.measurement_time(Duration::from_secs(5));

    for size in [10usize, 100, 1_000] {
        let subscription = TopicSubscription::new("alerts");
        let mut receivers: Vec<mpsc::Receiver<OutboundMessage>> = Vec::with_capacity(size);

        for i in 0..size {
            let (handle, rx) = ClientHandle::channel(ConnectionId::new(), 16);
            let value = if i % 2 == 0 { "high" } else { "low" };
            subscription.register(DeliveryEntry::new(handle, "level", value));
            receivers.push(rx);
        }

        let payload = Payload::new(json!({"level": "high", "msg": "m1"}));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("deliver", size), &size, |b, _| {
            b.iter(|| {
                let report = subscription.deliver(black_box(&payload));
                for rx in receivers.iter_mut() {
                    while rx.try_recv().is_ok() {}
                }
                black_box(report)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_fan_out);
criterion_main!(benches);
