//! Stress test - many tasks across many strands
//!
//! Submits a large number of tasks spread across a configurable strand
//! count and reports submission and completion throughput.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use strand_core::ExecutorConfig;
use strand_exec::Executor;

fn main() {
    println!("=== Strand Executor Stress Test ===\n");

    let num_tasks: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let num_strands: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);

    println!("Submitting {} tasks across {} strands...", num_tasks, num_strands);

    let config = ExecutorConfig::new()
        .num_strands(num_strands)
        .num_threads(8)
        .max_pending(num_tasks + 1000)
        .build()
        .expect("valid config");

    let exec = Executor::new(config);

    let completed = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    for i in 0..num_tasks {
        let id = exec.executor_id(i as u64);
        let completed = Arc::clone(&completed);
        exec.submit(id, move || {
            completed.fetch_add(1, Ordering::Relaxed);
        })
        .expect("executor is open");

        if (i + 1) % 10_000 == 0 {
            print!("\rSubmitted: {}/{}", i + 1, num_tasks);
        }
    }

    let submit_time = start.elapsed();
    println!("\n\nSubmit time: {:?}", submit_time);
    println!(
        "Submit rate: {:.0} tasks/sec",
        num_tasks as f64 / submit_time.as_secs_f64()
    );

    println!("\nWaiting for completion...");
    exec.sync();

    let total_time = start.elapsed();

    println!("\n=== Results ===");
    println!("Total tasks:  {}", num_tasks);
    println!("Completed:    {}", completed.load(Ordering::Relaxed));
    println!("Submit time:  {:?}", submit_time);
    println!("Total time:   {:?}", total_time);
    println!(
        "Throughput:   {:.0} tasks/sec",
        num_tasks as f64 / total_time.as_secs_f64()
    );

    let stats = exec.stats();
    println!(
        "accepted_tasks={} avg_queue_size={:.2} max_queue_size={}",
        stats.accepted_tasks,
        stats.queue_size.average(),
        stats.queue_size.max
    );

    println!("\n=== Stress Test Complete ===");
}
