//! Core trait defining registry behavior.
//!
//! This module provides the `RegistryApi` trait with default implementations for
//! type-keyed registration and lazy resolution of singletons.
//!
//! The registry is type-based: each type (`TypeId`) has at most one factory, fixed
//! at registration. The instance itself is built by the type's [`Singleton`] on
//! first `get`, following the strategy it was registered with.

use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::trace::emit_event;
use crate::{FactoryError, InitState, InitStrategy, Singleton, SingletonError, SingletonEvent};

/// Storage behind a registry: one type-erased `Arc<Singleton<T>>` per type.
///
/// Note: the `define_registry!` macro names this alias for its statics.
pub type RegistryStorage = LazyLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>;

// Held from the duplicate check until the insert, across the eager factory.
static REGISTRATION: Mutex<()> = Mutex::new(());

fn insert_singleton<T: Send + Sync + 'static>(
    storage: &'static RegistryStorage,
    singleton: Singleton<T>,
) -> Result<(), SingletonError> {
    let type_name = type_name::<T>();
    let key = TypeId::of::<T>();

    let taken = storage
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(&key);
    if taken {
        return Err(SingletonError::AlreadyRegistered { type_name });
    }

    if !singleton.strategy().is_lazy() {
        singleton.init()?;
    }

    let mut map = storage.lock().unwrap_or_else(PoisonError::into_inner);

    match map.entry(key) {
        Entry::Occupied(_) => Err(SingletonError::AlreadyRegistered { type_name }),
        Entry::Vacant(entry) => {
            entry.insert(Arc::new(singleton));
            Ok(())
        }
    }
}

/// Core trait defining registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// the `storage` accessor to be implemented by the implementor.
pub trait RegistryApi {
    /// Access the storage static.
    fn storage() -> &'static RegistryStorage;

    /// Register an infallible factory for `T`.
    ///
    /// # Errors
    ///
    /// See [`register_singleton`](Self::register_singleton).
    fn register<T: Send + Sync + 'static>(
        &self,
        strategy: InitStrategy,
        factory: fn() -> T,
    ) -> Result<(), SingletonError> {
        self.register_singleton(Singleton::new(type_name::<T>(), strategy, factory))
    }

    /// Register a fallible factory for `T`.
    fn register_fallible<T: Send + Sync + 'static>(
        &self,
        strategy: InitStrategy,
        factory: fn() -> Result<T, FactoryError>,
    ) -> Result<(), SingletonError> {
        self.register_singleton(Singleton::fallible(type_name::<T>(), strategy, factory))
    }

    /// Register a prepared singleton for `T`.
    ///
    /// An eager singleton is initialized here, before it becomes visible. The
    /// storage lock is not held while its factory runs, but registrations are
    /// serialized: two threads registering the same type never both run its
    /// factory. An eager factory may resolve registered types, it must not
    /// register new ones.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if `T` has a factory. The first registration stays,
    ///   so an instance handed out earlier never changes identity.
    /// - `Factory` if an eager factory failed. Nothing is registered.
    fn register_singleton<T: Send + Sync + 'static>(
        &self,
        singleton: Singleton<T>,
    ) -> Result<(), SingletonError> {
        let type_name = type_name::<T>();

        // Guards `()`: a panicking eager factory leaves nothing to repair.
        let _registering = REGISTRATION
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let outcome = insert_singleton(Self::storage(), singleton);

        emit_event(&SingletonEvent::Register {
            type_name,
            registered: outcome.is_ok(),
        });

        outcome
    }

    /// Retrieve the instance for `T`, constructing it on first demand.
    ///
    /// The storage lock is released before the singleton is asked for its
    /// instance, so a factory may itself resolve other registered types.
    ///
    /// # Errors
    ///
    /// - `TypeNotFound` if no factory is registered for `T`
    /// - `RegistryLock` if the storage lock is poisoned
    /// - whatever the singleton's `get` reports
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, SingletonError> {
        let singleton = self.singleton::<T>();

        emit_event(&SingletonEvent::Get {
            type_name: type_name::<T>(),
            found: singleton.is_ok(),
        });

        singleton?.get()
    }

    /// The singleton registered for `T`, without touching its instance.
    fn singleton<T: Send + Sync + 'static>(&self) -> Result<Arc<Singleton<T>>, SingletonError> {
        let map = Self::storage()
            .lock()
            .map_err(|_| SingletonError::RegistryLock)?;

        let any_arc_opt = map.get(&TypeId::of::<T>()).cloned();

        drop(map);

        match any_arc_opt {
            Some(any_arc) => {
                any_arc
                    .downcast::<Singleton<T>>()
                    .map_err(|_| SingletonError::TypeMismatch {
                        type_name: type_name::<T>(),
                    })
            }
            None => Err(SingletonError::TypeNotFound {
                type_name: type_name::<T>(),
            }),
        }
    }

    /// Check if a factory is registered for `T`.
    ///
    /// # Errors
    ///
    /// - Registry lock is poisoned
    fn contains<T: Send + Sync + 'static>(&self) -> Result<bool, SingletonError> {
        let found = Self::storage()
            .lock()
            .map(|m| m.contains_key(&TypeId::of::<T>()))
            .map_err(|_| SingletonError::RegistryLock)?;

        emit_event(&SingletonEvent::Contains {
            type_name: type_name::<T>(),
            found,
        });

        Ok(found)
    }

    /// Lifecycle state of the instance registered for `T`.
    fn state<T: Send + Sync + 'static>(&self) -> Result<InitState, SingletonError> {
        Ok(self.singleton::<T>()?.state())
    }

    /// Remove every factory from the registry.
    ///
    /// This method is primarily intended for testing. Instances already handed
    /// out stay valid; a type registered again gets a brand new singleton.
    #[doc(hidden)]
    fn clear(&self) {
        emit_event(&SingletonEvent::Clear {});

        if let Ok(mut registry) = Self::storage().lock() {
            registry.clear();
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{RegistryApi, RegistryStorage};
    use crate::{FactoryError, InitState, InitStrategy, SingletonError};

    use serial_test::serial;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, LazyLock, Mutex};

    static STORAGE: RegistryStorage = LazyLock::new(|| Mutex::new(HashMap::new()));

    struct Api;

    impl RegistryApi for Api {
        fn storage() -> &'static RegistryStorage {
            &STORAGE
        }
    }

    const API: Api = Api;

    #[derive(Debug, PartialEq)]
    struct Config {
        value: i32,
    }

    fn config() -> Config {
        Config { value: 42 }
    }

    #[test]
    #[serial]
    fn test_register_and_get() -> Result<(), SingletonError> {
        API.clear();

        API.register(InitStrategy::DoubleChecked, config)?;

        let first: Arc<Config> = API.get()?;
        let second = API.get::<Config>()?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.value, 42);

        Ok(())
    }

    #[test]
    #[serial]
    fn test_lazy_registration_does_not_construct() {
        API.clear();

        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn counted() -> Config {
            CALLS.fetch_add(1, Ordering::SeqCst);
            config()
        }

        API.register(InitStrategy::Locked, counted).unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(API.state::<Config>().unwrap(), InitState::Uninitialized);

        API.get::<Config>().unwrap();
        API.get::<Config>().unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(API.state::<Config>().unwrap(), InitState::Ready);
    }

    #[test]
    #[serial]
    fn test_eager_registration_constructs_immediately() {
        API.clear();

        API.register(InitStrategy::Eager, config).unwrap();
        assert_eq!(API.state::<Config>().unwrap(), InitState::Ready);
    }

    #[test]
    #[serial]
    fn test_failed_eager_registration_leaves_nothing() {
        API.clear();

        fn broken() -> Result<Config, FactoryError> {
            Err("disk full".into())
        }

        let err = API.register_fallible(InitStrategy::Eager, broken).unwrap_err();
        assert!(err.is_retryable());
        assert!(!API.contains::<Config>().unwrap());

        API.register(InitStrategy::Eager, config).unwrap();
        assert_eq!(API.get::<Config>().unwrap().value, 42);
    }

    #[test]
    #[serial]
    fn test_get_nonexistent() {
        API.clear();

        let result = API.get::<String>();
        assert_eq!(
            result.unwrap_err(),
            SingletonError::TypeNotFound {
                type_name: "alloc::string::String"
            }
        );
    }

    #[test]
    #[serial]
    fn test_second_registration_is_rejected() {
        API.clear();

        fn other() -> Config {
            Config { value: 7 }
        }

        API.register(InitStrategy::RunOnce, config).unwrap();
        let err = API.register(InitStrategy::RunOnce, other).unwrap_err();
        assert!(matches!(err, SingletonError::AlreadyRegistered { .. }));

        assert_eq!(API.get::<Config>().unwrap().value, 42);
    }

    #[test]
    #[serial]
    fn test_contains() {
        API.clear();
        assert!(!API.contains::<u32>().unwrap());
        API.register(InitStrategy::Locked, || 1u32).unwrap();
        assert!(API.contains::<u32>().unwrap());
    }

    #[test]
    #[serial]
    fn test_factory_may_resolve_other_types() {
        API.clear();

        struct Port(u16);
        struct Endpoint(String);

        fn endpoint() -> Result<Endpoint, FactoryError> {
            let port = API.get::<Port>().map_err(|e| FactoryError::from_error(&e))?;
            Ok(Endpoint(format!("localhost:{}", port.0)))
        }

        API.register(InitStrategy::DoubleChecked, || Port(8080)).unwrap();
        API.register_fallible(InitStrategy::Locked, endpoint).unwrap();

        assert_eq!(API.get::<Endpoint>().unwrap().0, "localhost:8080");
    }

    #[test]
    #[serial]
    fn test_clear_keeps_handed_out_instances() {
        API.clear();

        API.register(InitStrategy::DeferredStatic, config).unwrap();
        let held = API.get::<Config>().unwrap();

        API.clear();
        assert!(API.get::<Config>().is_err());
        assert_eq!(held.value, 42);
    }

    #[test]
    #[serial]
    fn test_thread_safety() {
        API.clear();

        API.register(InitStrategy::DoubleChecked, config).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| API.get::<Config>().unwrap()))
            .collect();
        let instances: Vec<Arc<Config>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        API.clear();
    }
}
