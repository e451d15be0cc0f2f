//! Integration tests for the process-wide registry.
//!
//! NOTE: All tests use #[serial] because they share the global registry.

use lazy_singleton::{
    clear, contains, get, register, register_fallible, register_singleton, state, FactoryError,
    InitState, InitStrategy, Singleton, SingletonError,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct AppConfig {
    database_url: String,
    max_connections: u32,
}

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgresql://localhost/mydb".to_string(),
        max_connections: 100,
    }
}

#[test]
#[serial]
fn test_configuration_pattern() {
    clear();

    register(InitStrategy::DoubleChecked, app_config).unwrap();

    let a: Arc<AppConfig> = get().unwrap();
    let b: Arc<AppConfig> = get().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.database_url, "postgresql://localhost/mydb");
    assert_eq!(a.max_connections, 100);
}

#[test]
#[serial]
fn test_every_strategy_through_the_registry() {
    for strategy in InitStrategy::ALL {
        clear();

        register(strategy, app_config).unwrap();
        let a: Arc<AppConfig> = get().unwrap();
        let b: Arc<AppConfig> = get().unwrap();

        assert!(Arc::ptr_eq(&a, &b), "{strategy}");
        assert_eq!(state::<AppConfig>().unwrap(), InitState::Ready);
    }
}

#[test]
#[serial]
fn test_concurrent_first_get_constructs_once() {
    clear();

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn counted() -> AppConfig {
        CALLS.fetch_add(1, Ordering::SeqCst);
        app_config()
    }

    register(InitStrategy::Locked, counted).unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| thread::spawn(|| get::<AppConfig>().unwrap()))
        .collect();
    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
#[serial]
fn test_service_wiring_through_factories() {
    clear();

    struct Database {
        url: String,
    }

    struct UserRepository {
        database: Arc<Database>,
    }

    fn database() -> Result<Database, FactoryError> {
        let config = get::<AppConfig>().map_err(|e| FactoryError::from_error(&e))?;
        Ok(Database {
            url: config.database_url.clone(),
        })
    }

    fn repository() -> Result<UserRepository, FactoryError> {
        let database = get::<Database>().map_err(|e| FactoryError::from_error(&e))?;
        Ok(UserRepository { database })
    }

    register_fallible(InitStrategy::RunOnce, repository).unwrap();
    register_fallible(InitStrategy::DoubleChecked, database).unwrap();

    // nothing to build on yet
    assert!(get::<UserRepository>().is_err());
    assert_eq!(state::<Database>().unwrap(), InitState::Uninitialized);

    register(InitStrategy::Eager, app_config).unwrap();

    let repo = get::<UserRepository>().unwrap();
    assert_eq!(repo.database.url, "postgresql://localhost/mydb");
    assert!(Arc::ptr_eq(&repo.database, &get::<Database>().unwrap()));
}

#[test]
#[serial]
fn test_duplicate_registration_keeps_identity() {
    clear();

    register(InitStrategy::DeferredStatic, app_config).unwrap();
    let before: Arc<AppConfig> = get().unwrap();

    let err = register_singleton(Singleton::new("other", InitStrategy::Locked, app_config))
        .unwrap_err();
    assert!(matches!(err, SingletonError::AlreadyRegistered { .. }));

    let after: Arc<AppConfig> = get().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
#[serial]
fn test_contains_reflects_registration() {
    clear();

    assert!(!contains::<AppConfig>().unwrap());
    register(InitStrategy::Locked, app_config).unwrap();
    assert!(contains::<AppConfig>().unwrap());

    clear();
    assert!(!contains::<AppConfig>().unwrap());
}

macro_rules! racing_registrations_construct_once {
    ($test_name:ident, $strategy:expr, $expected_calls:expr) => {
        #[test]
        #[serial]
        fn $test_name() {
            clear();

            const THREADS: usize = 8;
            static CALLS: AtomicUsize = AtomicUsize::new(0);
            fn slow_config() -> AppConfig {
                CALLS.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                app_config()
            }

            let barrier = Barrier::new(THREADS);
            let results: Vec<_> = thread::scope(|s| {
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        s.spawn(|| {
                            barrier.wait();
                            register($strategy, slow_config)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let accepted = results.iter().filter(|r| r.is_ok()).count();
            let rejected = results
                .iter()
                .filter(|r| matches!(r, Err(SingletonError::AlreadyRegistered { .. })))
                .count();
            assert_eq!(accepted, 1);
            assert_eq!(rejected, THREADS - 1);
            assert_eq!(CALLS.load(Ordering::SeqCst), $expected_calls);

            get::<AppConfig>().unwrap();
            get::<AppConfig>().unwrap();
            assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        }
    };
}

racing_registrations_construct_once!(
    racing_eager_registrations_construct_once,
    InitStrategy::Eager,
    1
);
racing_registrations_construct_once!(
    racing_lazy_registrations_construct_nothing,
    InitStrategy::DoubleChecked,
    0
);
