//! Strategy tour for lazy-singleton.
//!
//! Demonstrates:
//! - Declaring the same singleton with each initialization strategy
//! - When construction happens for eager vs lazy strategies
//! - Identity checks between two accesses
//!
//! Run with: `cargo run --example strategy_tour`

use lazy_singleton::{InitStrategy, Singleton};
use std::sync::Arc;

/// Stand-in for an expensive shared resource.
#[derive(Debug)]
struct PrinterSpooler {
    queue_capacity: usize,
}

fn spooler() -> PrinterSpooler {
    println!("   -> constructing PrinterSpooler");
    PrinterSpooler { queue_capacity: 64 }
}

fn main() {
    println!("=== lazy-singleton: Strategy Tour ===\n");

    for (step, strategy) in InitStrategy::ALL.into_iter().enumerate() {
        println!(
            "{}. {strategy} (lazy: {}, thread-safe: {})",
            step + 1,
            strategy.is_lazy(),
            strategy.is_thread_safe()
        );

        let singleton = Singleton::new("spooler", strategy, spooler);
        println!("   state before first access: {}", singleton.state());

        if !strategy.is_lazy() {
            match singleton.get() {
                Ok(_) => println!("   get() before init() unexpectedly succeeded"),
                Err(e) => println!("   get() before init(): {e}"),
            }
            println!("   running start-up init()");
            if let Err(e) = singleton.init() {
                println!("   init failed: {e}");
                continue;
            }
        }

        let instance1 = match singleton.get() {
            Ok(instance) => instance,
            Err(e) => {
                println!("   get failed: {e}");
                continue;
            }
        };
        let instance2 = match singleton.get() {
            Ok(instance) => instance,
            Err(e) => {
                println!("   get failed: {e}");
                continue;
            }
        };

        println!("   instance1 == instance2: {}", Arc::ptr_eq(&instance1, &instance2));
        println!("   queue capacity: {}", instance1.queue_capacity);
        println!(
            "   constructions: {}, state: {}\n",
            singleton.constructions(),
            singleton.state()
        );
    }

    println!("=== Tour Complete ===");
}
