//! Table manager benchmark suite
//!
//! Run with: `cargo bench -p rowbatch-manager --bench manager`
//!
//! # What we measure
//!
//! - Appending single-row requests through the holder (lock + parse + signal)
//! - Flushing a full table to one and to several null sinks

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rowbatch_config::HolderConfig;
use rowbatch_manager::{Holder, ManagerContext, TableManager, TableManagerConfig};
use rowbatch_sinks::{NullSink, Sink};
use rowbatch_table::TableSignature;
use tokio::runtime::Runtime;

fn null_sinks(count: usize) -> Vec<Arc<dyn Sink>> {
    (0..count)
        .map(|i| Arc::new(NullSink::with_name(format!("null{i}"))) as Arc<dyn Sink>)
        .collect()
}

fn bench_holder_append(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("holder_append");
    group.throughput(Throughput::Elements(1));

    let holder = Holder::new(ManagerContext::new(null_sinks(1)), &HolderConfig::default());
    let signature = Arc::new(TableSignature::new("db.events", "id,name,value"));
    let config = TableManagerConfig::new(Duration::from_millis(100), 10_000);
    let payload = br#"[[1,"event",3.5]]"#;

    group.bench_function("single_row", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(holder.append(&signature, &config, false, payload).await).unwrap();
        });
    });

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("flush");
    let rows: Vec<[u64; 3]> = (0..1000).map(|i| [i, i * 2, i * 3]).collect();
    let payload = serde_json::to_vec(&rows).unwrap();

    for sinks in [1, 4] {
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sinks), &sinks, |b, &sinks| {
            let manager = TableManager::new(
                Arc::new(TableSignature::new("db.events", "a,b,c")),
                &TableManagerConfig::new(Duration::from_secs(60), usize::MAX),
                ManagerContext::new(null_sinks(sinks)),
            );
            b.to_async(&rt).iter(|| async {
                manager.append_rows(&payload).unwrap();
                black_box(manager.flush().await).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_holder_append, bench_flush);
criterion_main!(benches);
