//! Cross-thread call example
//!
//! Registers a function on a runner's loop thread and calls it from a
//! burst of producer threads. Every caller blocks on its own future;
//! every invocation runs serialized on the loop thread.
//!
//! # Environment Variables
//!
//! - `EVL_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `EVL_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)

use evloop::{einfo, AsyncFn, EventLoopRunner, RunnerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
// EVL_LOG_LEVEL=debug EVL_FLUSH_EPRINT=1 cargo run -p evloop-call
fn main() {
    println!("=== evloop Cross-Thread Call Example ===\n");

    let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());

    // Count how many invocations actually ran on the loop thread.
    let served = Arc::new(AtomicUsize::new(0));

    let s2 = served.clone();
    let add_one: Arc<AsyncFn<i64, i64>> = runner.exec_sync(move |r| {
        Some(Arc::new(
            AsyncFn::new(r, move |promise, x: i64| {
                s2.fetch_add(1, Ordering::SeqCst);
                promise.set(x + 1);
            })
            .unwrap(),
        ))
    })
    .expect("runner stopped during setup");

    println!("Calling from 8 producer threads...\n");
    let mut joins = Vec::new();
    for t in 0..8i64 {
        let f = add_one.clone();
        joins.push(thread::spawn(move || {
            let mut sum = 0;
            for i in 0..1000 {
                sum += f.call(t * 1000 + i).wait();
            }
            sum
        }));
    }

    let mut total = 0i64;
    for j in joins {
        total += j.join().unwrap();
    }

    einfo!("served {} calls", served.load(Ordering::SeqCst));
    println!("8 threads x 1000 calls -> {} invocations", served.load(Ordering::SeqCst));
    println!("checksum: {}", total);

    runner.stop();
    println!("\n=== Example Complete ===");
}
