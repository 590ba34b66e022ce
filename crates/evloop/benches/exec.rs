//! Executor and runner micro-benchmarks.
//!
//! Key metrics:
//! - Inline submit: pure promise/future overhead, no thread crossing
//! - Worker submit: bounded-queue handoff plus parking latch
//! - Runner exec_sync: full round trip through the reactor wakeup path
//! - Raise coalescing: cost of a raise when one is already pending

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use evloop::{
    EventLoopRunner, InlineExecutor, Reactor, RunMode, RunnerConfig, SubmitExt, Wakeup,
    WorkerConfig, WorkerExecutor,
};
use std::sync::Arc;

fn bench_inline_submit(c: &mut Criterion) {
    let exec = Arc::new(InlineExecutor);
    c.bench_function("executor/inline_submit", |b| {
        b.iter(|| {
            let out = exec.submit(|| black_box(7) * 6).wait();
            black_box(out)
        })
    });
}

fn bench_worker_submit(c: &mut Criterion) {
    let worker = Arc::new(WorkerExecutor::new(WorkerConfig::default()));
    c.bench_function("executor/worker_submit", |b| {
        b.iter(|| {
            let out = worker.submit(|| black_box(7) * 6).wait();
            black_box(out)
        })
    });
    worker.shutdown();
}

fn bench_runner_exec_sync(c: &mut Criterion) {
    let runner = Arc::new(EventLoopRunner::new(RunnerConfig::default()).unwrap());
    c.bench_function("runner/exec_sync", |b| {
        b.iter(|| {
            let out = runner.exec_sync(|_| black_box(7) * 6);
            black_box(out)
        })
    });
    runner.stop();
}

fn bench_raise_pending(c: &mut Criterion) {
    // The loop never drains during the measurement, so after the first
    // raise every further one takes the coalesced (flag-only) path.
    let reactor = Reactor::create().unwrap();
    let wakeup = Wakeup::new(&reactor, || {}).unwrap();

    let mut group = c.benchmark_group("wakeup/raise");
    group.throughput(Throughput::Elements(1));
    group.bench_function("coalesced", |b| {
        b.iter(|| black_box(wakeup.raise()))
    });
    group.finish();

    wakeup.close();
    reactor.run(RunMode::UntilDone).unwrap();
}

criterion_group!(
    benches,
    bench_inline_submit,
    bench_worker_submit,
    bench_runner_exec_sync,
    bench_raise_pending
);
criterion_main!(benches);
