use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use slate_cache::{CacheSettings, Expiration, Store, StoreExt, StoreFactory, StorePool};
use std::sync::Arc;
use tokio::runtime::Runtime;

mod common;
use common::{BenchConfig, BenchSession, KeyGenerator, stores_tree};

const NUM_KEYS: usize = 10_000;

fn setup_pool(config: &BenchConfig) -> StorePool {
    let settings = CacheSettings {
        stores_config_path: "bench.stores".to_string(),
        ..CacheSettings::default()
    };
    StorePool::builder()
        .config(stores_tree(&config.redis_url))
        .factory(Arc::new(StoreFactory::with_default_strategies(&settings)))
        .settings(settings)
        .build()
        .expect("pool setup failed")
}

fn backends(config: &BenchConfig) -> Vec<&'static str> {
    let mut names = vec!["memory", "moka"];
    if config.with_redis {
        names.push("redis");
    }
    names
}

async fn populate(store: &Arc<dyn Store>, keys: &[String]) {
    for (i, key) in keys.iter().enumerate() {
        store
            .set(key, BenchSession::new(i as u64), Expiration::Default)
            .await
            .expect("populate failed");
    }
}

/// Benchmark 1: Pool lookup of an already created store
fn bench_pool_fast_path(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("pool_get");
    group.sample_size(config.sample_size);

    let pool = setup_pool(config);
    rt.block_on(async {
        pool.get("memory").await.expect("store creation failed");
    });

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("cached", |b| {
        b.to_async(&rt).iter(|| async {
            for _ in 0..1_000 {
                let _ = black_box(pool.get("memory").await);
            }
        });
    });

    group.finish();
}

/// Benchmark 2: Hot reads (all hits)
fn bench_hot_reads(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hot_reads");
    group.sample_size(config.sample_size);

    let pool = setup_pool(config);
    let keys = KeyGenerator::new(NUM_KEYS).sequential();

    for name in backends(config) {
        let store = rt.block_on(async {
            let store = pool.get(name).await.expect("store creation failed");
            populate(&store, &keys).await;
            store
        });

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(BenchmarkId::new("get", name), &store, |b, store| {
            b.to_async(&rt).iter(|| async {
                for key in &keys {
                    let _ = black_box(store.get::<BenchSession>(key).await);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark 3: Mixed workload (80% hits, counters on the side)
fn bench_mixed_workload(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("mixed_workload");
    group.sample_size(config.sample_size.min(50));

    let pool = setup_pool(config);
    let generator = KeyGenerator::new(NUM_KEYS);
    let populated = generator.sequential();
    let keys = generator.mixed(0.8);

    for name in backends(config) {
        let store = rt.block_on(async {
            let store = pool.get(name).await.expect("store creation failed");
            populate(&store, &populated).await;
            store.set("hits", 0u64, Expiration::Forever).await.expect("counter setup failed");
            store
        });

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(BenchmarkId::new("get_or_add", name), &store, |b, store| {
            b.to_async(&rt).iter(|| async {
                for (i, key) in keys.iter().enumerate() {
                    if store.get::<BenchSession>(key).await.is_err() {
                        let _ = store
                            .add(key, BenchSession::new(i as u64), Expiration::Default)
                            .await;
                    }
                    let _ = black_box(store.increment("hits", 1).await);
                }
            });
        });
    }

    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let config = BenchConfig::new();

    eprintln!("\n=== Running Benchmarks ===\n");

    bench_pool_fast_path(c, &config);
    bench_hot_reads(c, &config);
    bench_mixed_workload(c, &config);
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
