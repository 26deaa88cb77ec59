//! Basic strand executor example
//!
//! Demonstrates submitting tasks against a handful of strands and observing
//! strict FIFO order within each one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strand_core::ExecutorConfig;
use strand_exec::Executor;

fn main() {
    println!("=== Strand Executor Basic Example ===\n");

    let config = ExecutorConfig::new()
        .num_strands(4)
        .num_threads(4)
        .debug_logging(true)
        .build()
        .expect("valid config");

    let exec = Executor::new(config);

    let completed = Arc::new(AtomicUsize::new(0));
    let total_tasks = 9;

    println!("Submitting tasks...\n");

    for strand_key in 0..3u64 {
        let id = exec.executor_id(strand_key);
        for i in 0..3 {
            let completed = Arc::clone(&completed);
            exec.submit(id, move || {
                println!("[strand {}] task {} running", strand_key, i);
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .expect("executor is open");
        }
        println!("Submitted 3 tasks to strand {}", id.id());
    }

    println!("\nWaiting for all tasks to complete...");
    exec.sync();

    println!(
        "\n{}/{} tasks completed!",
        completed.load(Ordering::SeqCst),
        total_tasks
    );

    let stats = exec.stats();
    println!(
        "accepted_tasks={} avg_queue_size={:.2}",
        stats.accepted_tasks,
        stats.queue_size.average()
    );

    println!("\n=== Example Complete ===");
}
