//! Submit-to-completion throughput under varying strand/thread counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strand_core::ExecutorConfig;
use strand_exec::Executor;

fn run_batch(exec: &Executor, num_strands: usize, num_tasks: u64) {
    let completed = Arc::new(AtomicU64::new(0));
    for i in 0..num_tasks {
        let id = exec.executor_id(i % num_strands as u64);
        let completed = Arc::clone(&completed);
        exec.submit(id, move || {
            completed.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    }
    exec.sync();
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_to_completion");

    for &(num_strands, num_threads) in &[(1usize, 1usize), (8, 4), (64, 8), (256, 8)] {
        let params = ExecutorConfig::new()
            .num_strands(num_strands)
            .num_threads(num_threads)
            .max_pending(20_000)
            .build()
            .unwrap();
        let exec = Executor::new(params);

        group.bench_with_input(
            BenchmarkId::new("strands_threads", format!("{}x{}", num_strands, num_threads)),
            &num_strands,
            |b, &num_strands| {
                b.iter(|| run_batch(&exec, num_strands, 2_000));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
