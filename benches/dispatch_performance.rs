//! Performance benchmarks for change dispatch and namespace reads.
//!
//! - Dispatch latency as the number of subscriptions on a namespace grows
//! - Cost of interest filtering when most listeners are not interested
//! - Namespace set reads while refreshes are not running

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hotswap_namespaces::notify::{ChangeDispatcher, InterestFilter, SubscriptionRegistry};
use hotswap_namespaces::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn batch(keys: &[&str]) -> ChangeBatch {
    ChangeBatch::new(
        "application",
        keys.iter()
            .map(|key| ChangeRecord::modified("application", *key, "old", "new"))
            .collect(),
    )
    .unwrap()
}

/// Benchmark dispatch to catch-all listeners with varying subscription counts
fn benchmark_dispatch_fan_out(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch_fan_out");

    for subscriptions in [1usize, 10, 100, 1000] {
        group.throughput(Throughput::Elements(subscriptions as u64));

        let registry = SubscriptionRegistry::new();
        let counter = Arc::new(AtomicU64::new(0));
        runtime.block_on(async {
            for _ in 0..subscriptions {
                let counter = Arc::clone(&counter);
                registry
                    .register(
                        "application",
                        Arc::new(move |_: &ChangeBatch| {
                            counter.fetch_add(1, Ordering::Relaxed);
                        }),
                        InterestFilter::all(),
                    )
                    .await;
            }
        });
        let dispatcher = ChangeDispatcher::new(registry);
        let change = batch(&["timeout"]);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_subscriptions", subscriptions)),
            &subscriptions,
            |b, _| {
                b.iter(|| {
                    let report = runtime.block_on(dispatcher.dispatch(&change));
                    black_box(report.delivered);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark dispatch where only one listener in a hundred is interested
fn benchmark_filtered_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let registry = SubscriptionRegistry::new();

    runtime.block_on(async {
        for i in 0..100 {
            let filter = if i == 0 {
                InterestFilter::all().with_prefixes(["db."])
            } else {
                InterestFilter::all().with_keys([format!("unrelated.{}", i)])
            };
            registry
                .register("application", Arc::new(|_: &ChangeBatch| {}), filter)
                .await;
        }
    });
    let dispatcher = ChangeDispatcher::new(registry);
    let change = batch(&["db.url", "db.pool.size", "timeout"]);

    let mut group = c.benchmark_group("filtered_dispatch");
    group.bench_function("1_of_100_interested", |b| {
        b.iter(|| {
            let report = runtime.block_on(dispatcher.dispatch(&change));
            black_box(report.skipped);
        });
    });
    group.finish();
}

/// Benchmark reading the current namespace set
fn benchmark_namespace_reads(c: &mut Criterion) {
    let client = NamespaceClient::builder()
        .with_app_id("bench")
        .with_static_namespaces(["application", "FX.apollo", "redis", "mysql"])
        .build()
        .unwrap();

    let mut group = c.benchmark_group("namespace_reads");
    group.bench_function("namespaces", |b| {
        b.iter(|| {
            let namespaces = client.namespaces();
            black_box(namespaces.len());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_dispatch_fan_out,
    benchmark_filtered_dispatch,
    benchmark_namespace_reads
);
criterion_main!(benches);
