//! Concurrent first access for lazy-singleton.
//!
//! Demonstrates:
//! - 100 threads racing on the first `get()` of each lazy strategy
//! - Thread-safe strategies running the factory exactly once
//! - The unsynchronized strategy building more than one instance under contention
//! - Observing all of it through the trace callback
//!
//! Run with: `cargo run --example race_visibility`

use lazy_singleton::{clear_trace_callback, set_trace_callback, InitStrategy, Singleton, SingletonEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 100;

struct Counter {
    start: u64,
}

fn slow_counter() -> Counter {
    thread::sleep(Duration::from_millis(10));
    Counter { start: 1000 }
}

fn main() {
    println!("=== lazy-singleton: Concurrent First Access ===\n");

    static DISCARDED: AtomicUsize = AtomicUsize::new(0);
    set_trace_callback(|event| {
        if let SingletonEvent::Discarded { .. } = event {
            DISCARDED.fetch_add(1, Ordering::SeqCst);
        }
    });

    for strategy in InitStrategy::ALL.into_iter().filter(|s| s.is_lazy()) {
        DISCARDED.store(0, Ordering::SeqCst);
        let singleton = Singleton::new("counter", strategy, slow_counter);
        let barrier = Barrier::new(THREADS);

        let instances: Vec<Arc<Counter>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        singleton.get()
                    })
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok().and_then(Result::ok))
                .collect()
        });

        let identical = instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1]));
        println!("{strategy}:");
        println!("   callers served:      {}", instances.len());
        println!("   factory runs:        {}", singleton.constructions());
        println!("   discarded instances: {}", DISCARDED.load(Ordering::SeqCst));
        println!("   one shared instance: {identical}");
        if let Some(first) = instances.first() {
            println!("   counter starts at:   {}", first.start);
        }
        println!();
    }

    clear_trace_callback();
    println!("=== Done ===");
}
