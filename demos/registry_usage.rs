//! Registry usage for lazy-singleton.
//!
//! Demonstrates:
//! - Registering factories per type in the global registry
//! - Factories resolving their own dependencies from the registry
//! - Retrying after a failed construction
//! - An isolated registry declared with `define_registry!`
//!
//! Run with: `cargo run --example registry_usage`

use lazy_singleton::{
    define_registry, get, register, register_fallible, state, FactoryError, InitStrategy,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

define_registry!(plugins);

#[derive(Debug)]
struct Settings {
    cache_dir: String,
}

#[derive(Debug)]
struct Cache {
    dir: String,
}

static DISK_READY: AtomicBool = AtomicBool::new(false);

fn settings() -> Settings {
    Settings {
        cache_dir: "/tmp/cache".to_string(),
    }
}

fn cache() -> Result<Cache, FactoryError> {
    if !DISK_READY.load(Ordering::SeqCst) {
        return Err(FactoryError::new("cache disk not mounted"));
    }
    let settings = get::<Settings>().map_err(|e| FactoryError::from_error(&e))?;
    Ok(Cache {
        dir: settings.cache_dir.clone(),
    })
}

struct Plugin(&'static str);

fn main() {
    println!("=== lazy-singleton: Registry Usage ===\n");

    println!("1. Registering factories...");
    if let Err(e) = register(InitStrategy::Eager, settings) {
        println!("   settings: {e}");
        return;
    }
    if let Err(e) = register_fallible(InitStrategy::DoubleChecked, cache) {
        println!("   cache: {e}");
        return;
    }
    println!("   Settings state: {:?}", state::<Settings>());
    println!("   Cache state:    {:?}", state::<Cache>());

    println!("\n2. First access while the disk is missing...");
    match get::<Cache>() {
        Ok(cache) => println!("   unexpected: {cache:?}"),
        Err(e) => println!("   error: {e} (retryable: {})", e.is_retryable()),
    }
    println!("   Cache state:    {:?}", state::<Cache>());

    println!("\n3. Disk mounted, retrying...");
    DISK_READY.store(true, Ordering::SeqCst);
    match (get::<Cache>(), get::<Cache>()) {
        (Ok(a), Ok(b)) => {
            println!("   cache dir: {}", a.dir);
            println!("   instance1 == instance2: {}", Arc::ptr_eq(&a, &b));
        }
        (Err(e), _) | (_, Err(e)) => println!("   error: {e}"),
    }

    println!("\n4. Isolated plugin registry...");
    if let Err(e) = plugins::register(InitStrategy::RunOnce, || Plugin("spell-check")) {
        println!("   plugin: {e}");
    }
    match plugins::get::<Plugin>() {
        Ok(plugin) => println!("   plugin loaded: {}", plugin.0),
        Err(e) => println!("   plugin error: {e}"),
    }
    println!(
        "   Plugin in global registry: {:?}",
        lazy_singleton::contains::<Plugin>()
    );

    println!("\n=== Done ===");
}
