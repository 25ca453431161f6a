use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dyn_pool::pool::{Config as PoolConfig, ThreadPool};
use dyn_pool::TaskArg;
use std::hint::black_box;


// Benchmark 1: накладные расходы submit + дренаж
fn bench_submit_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_overhead");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("unbounded", size), &size, |b, &size| {
            b.iter(|| {
                let pool = ThreadPool::with_config(PoolConfig {
                    num_threads: num_cpus::get(),
                    ..Default::default()
                })
                .unwrap();
                for i in 0..size {
                    pool.submit("bench", |arg| {
                        black_box(arg.downcast_ref::<usize>());
                    }, TaskArg::new(i));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("bounded_64", size), &size, |b, &size| {
            b.iter(|| {
                let pool = ThreadPool::with_config(PoolConfig {
                    num_threads: num_cpus::get(),
                    max_queue_size: 64,
                    ..Default::default()
                })
                .unwrap();
                for i in 0..size {
                    pool.submit("bench", |arg| {
                        black_box(arg.downcast_ref::<usize>());
                    }, TaskArg::new(i));
                }
            });
        });
    }

    group.finish();
}

// Benchmark 2: стартовый размер против динамического роста
fn bench_config_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_comparison");
    let configs = [
        ("cpu_bound", PoolConfig::cpu_bound()),
        ("io_bound", PoolConfig::io_bound()),
        ("default", PoolConfig::default()),
    ];

    for (name, config) in configs {
        group.bench_function(name, |b| {
            b.iter(|| {
                let pool = ThreadPool::with_config(config.clone()).unwrap();
                for i in 0..2_000_u64 {
                    pool.submit("cfg", |arg| {
                        let x = arg.downcast_ref::<u64>().copied().unwrap_or_default();
                        black_box((0..64).fold(x, |acc, v| acc.wrapping_mul(31).wrapping_add(v)));
                    }, TaskArg::new(i));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit_overhead, bench_config_comparison);
criterion_main!(benches);
