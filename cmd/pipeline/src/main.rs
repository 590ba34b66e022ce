//! Continuation pipeline example
//!
//! Builds a three-stage pipeline where each stage runs on a different
//! executor: parse on a worker thread, aggregate on the runner's loop
//! thread, report inline on the main thread.
//!
//! # Environment Variables
//!
//! - `EVL_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `EVL_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)

use evloop::{
    EventLoopRunner, Executor, InlineExecutor, RunnerConfig, SubmitExt, WorkerConfig,
    WorkerExecutor,
};
use std::sync::Arc;
use std::thread;
// EVL_LOG_LEVEL=debug EVL_FLUSH_EPRINT=1 cargo run -p evloop-pipeline
fn main() {
    println!("=== evloop Pipeline Example ===\n");

    let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
    let worker = Arc::new(WorkerExecutor::new(WorkerConfig {
        queue_capacity: 64,
        thread_name: "pipeline-worker".to_string(),
    }));
    let inline: Arc<dyn Executor> = Arc::new(InlineExecutor);

    let input = "12 7 3 99 41 8";
    println!("input: {:?}\n", input);

    let loop_exec: Arc<dyn Executor> = runner.clone();
    let report = worker
        .submit(move || {
            // Stage 1: parse on the worker thread.
            println!("[{}] parsing", thread_name());
            input
                .split_whitespace()
                .filter_map(|tok| tok.parse::<i64>().ok())
                .collect::<Vec<i64>>()
        })
        .via(loop_exec)
        .then(|nums| {
            // Stage 2: aggregate on the runner's loop thread.
            println!("[{}] aggregating {} numbers", thread_name(), nums.len());
            nums.iter().sum::<i64>()
        })
        .via(inline)
        .then(|sum| {
            // Stage 3: runs wherever stage 2 completed; inline binding
            // means no further queueing.
            format!("sum = {}", sum)
        });

    println!("\nresult: {}", report.wait());

    worker.shutdown();
    runner.stop();
    println!("\n=== Example Complete ===");
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("main").to_string()
}
