//! Benchmarks

#[macro_use]

extern crate bencher;
extern crate relaq;

use relaq::*;
use self::bencher::Bencher;

fn queue() -> (MultiQueue<usize, usize>, Handle) {
    let mq: MultiQueue<usize, usize> = MultiQueue::new(1);
    let handle = mq.handle();
    (mq, handle)
}

/// Benchmark pushing 100 elements
fn mq_push_100(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    b.iter(|| {
        let n = 100_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    });
}

/// Benchmark pushing 1k elements
fn mq_push_1k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    b.iter(|| {
        let n = 1_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    });
}

/// Benchmark pushing 10k elements
fn mq_push_10k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    b.iter(|| {
        let n = 10_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    });
}

/// Benchmark pushing 100k elements
fn mq_push_100k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    b.iter(|| {
        let n = 100_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    });
}

/// Benchmark pushing 100k elements with preallocated inner heaps
fn mq_push_100k_reserved(b: &mut Bencher) {
    let config = Config {
        reserve_per_queue: 100_000,
        ..Config::default()
    };
    let mq: MultiQueue<usize, usize> = MultiQueue::with_config(1, config);
    let mut handle = mq.handle();
    b.iter(|| {
        let n = 100_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    });
}

/// Benchmark popping 100 elements
fn mq_pop_100(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    let n = 100_usize;
    (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    b.iter(|| {
        (0..n).for_each(|_| {
            mq.try_pop(&mut handle);
        });
    });
}

/// Benchmark popping 1k elements
fn mq_pop_1k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    let n = 1_000_usize;
    (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    b.iter(|| {
        (0..n).for_each(|_| {
            mq.try_pop(&mut handle);
        });
    });
}

/// Benchmark popping 10k elements
fn mq_pop_10k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    let n = 10_000_usize;
    (0..n).for_each(|i| mq.push(&mut handle, i, i * 2));
    b.iter(|| {
        (0..n).for_each(|_| {
            mq.try_pop(&mut handle);
        });
    });
}

/// Benchmark a mixed half-push half-pop cycle
fn mq_mixed_10k(b: &mut Bencher) {
    let (mq, mut handle) = queue();
    b.iter(|| {
        let n = 5_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i));
        (0..n).for_each(|_| {
            mq.try_pop(&mut handle);
        });
    });
}

/// Benchmark the sticky variant of the same mixed cycle
fn mq_mixed_10k_sticky(b: &mut Bencher) {
    let config = Config {
        stickiness: 8,
        ..Config::default()
    };
    let mq: MultiQueue<usize, usize> = MultiQueue::with_config(1, config);
    let mut handle = mq.handle();
    b.iter(|| {
        let n = 5_000_usize;
        (0..n).for_each(|i| mq.push(&mut handle, i, i));
        (0..n).for_each(|_| {
            mq.try_pop(&mut handle);
        });
    });
}

benchmark_group!(
    benches,
    mq_push_100,
    mq_push_1k,
    mq_push_10k,
    mq_push_100k,
    mq_push_100k_reserved,
    mq_pop_100,
    mq_pop_1k,
    mq_pop_10k,
    mq_mixed_10k,
    mq_mixed_10k_sticky,
);
benchmark_main!(benches);
