//! Fairness demo - two strands flooded under a low `max_waiting`
//!
//! Submits a steady stream of tasks to two strands from separate producer
//! threads while a low `max_waiting` threshold is in effect, then reports
//! each strand's completion rate over rolling windows to show the scheduler
//! keeps both strands progressing instead of starving one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strand_core::ExecutorConfig;
use strand_exec::Executor;

fn main() {
    println!("=== Strand Executor Fairness Demo ===\n");

    let tasks_per_strand: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(20_000);

    let config = ExecutorConfig::new()
        .num_strands(2)
        .num_threads(2)
        .max_waiting(4)
        .max_pending(2000)
        .build()
        .expect("valid config");

    let exec = Arc::new(Executor::new(config));
    let strand_a = exec.executor_id(0);
    let strand_b = exec.executor_id(1);

    let completed_a = Arc::new(AtomicU64::new(0));
    let completed_b = Arc::new(AtomicU64::new(0));

    let start = Instant::now();

    let producer_a = spawn_flood(Arc::clone(&exec), strand_a, tasks_per_strand, Arc::clone(&completed_a));
    let producer_b = spawn_flood(Arc::clone(&exec), strand_b, tasks_per_strand, Arc::clone(&completed_b));

    let mut last_a = 0u64;
    let mut last_b = 0u64;
    while completed_a.load(Ordering::Relaxed) < tasks_per_strand
        || completed_b.load(Ordering::Relaxed) < tasks_per_strand
    {
        thread::sleep(Duration::from_millis(200));
        let now_a = completed_a.load(Ordering::Relaxed);
        let now_b = completed_b.load(Ordering::Relaxed);
        println!(
            "window: strand A +{:>5}  strand B +{:>5}  (ratio {:.2})",
            now_a - last_a,
            now_b - last_b,
            (now_a - last_a) as f64 / ((now_b - last_b).max(1)) as f64
        );
        last_a = now_a;
        last_b = now_b;
    }

    producer_a.join().unwrap();
    producer_b.join().unwrap();
    exec.sync();

    let elapsed = start.elapsed();
    println!("\n=== Results ===");
    println!("strand A completed: {}", completed_a.load(Ordering::Relaxed));
    println!("strand B completed: {}", completed_b.load(Ordering::Relaxed));
    println!("total time: {:?}", elapsed);
}

fn spawn_flood(
    exec: Arc<Executor>,
    id: strand_exec::ExecutorId,
    count: u64,
    completed: Arc<AtomicU64>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for _ in 0..count {
            let completed = Arc::clone(&completed);
            exec.submit(id, move || {
                completed.fetch_add(1, Ordering::Relaxed);
            })
            .expect("executor is open");
        }
    })
}
