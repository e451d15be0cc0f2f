//! The process-wide default registry.
//!
//! Maps a value *type* to the [`Singleton`] that lazily builds its one instance.
//! Factories are fixed at registration; the instance is built on first `get`
//! following the registered [`InitStrategy`].
//!
//! # Examples
//!
//! ```
//! use lazy_singleton::{get, register, InitStrategy};
//! use std::sync::Arc;
//!
//! struct Greeting(String);
//!
//! register(InitStrategy::DoubleChecked, || Greeting("Hello, World!".to_string())).unwrap();
//!
//! let a: Arc<Greeting> = get().unwrap();
//! let b: Arc<Greeting> = get().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(a.0, "Hello, World!");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use crate::registry_trait::{RegistryApi, RegistryStorage};
use crate::{FactoryError, InitState, InitStrategy, Singleton, SingletonError};

/// Global thread-safe registry storing one singleton per type.
static GLOBAL_REGISTRY: RegistryStorage = LazyLock::new(|| Mutex::new(HashMap::new()));

struct Global;

impl RegistryApi for Global {
    fn storage() -> &'static RegistryStorage {
        &GLOBAL_REGISTRY
    }
}

/// Registers an infallible factory for `T` in the global registry.
///
/// # Errors
///
/// - `AlreadyRegistered` if `T` already has a factory
/// - `Factory` if `strategy` is eager and the factory failed
pub fn register<T: Send + Sync + 'static>(
    strategy: InitStrategy,
    factory: fn() -> T,
) -> Result<(), SingletonError> {
    Global.register(strategy, factory)
}

/// Registers a fallible factory for `T` in the global registry.
///
/// # Examples
///
/// ```
/// use lazy_singleton::{get, register_fallible, FactoryError, InitStrategy};
///
/// struct Token(&'static str);
///
/// fn token() -> Result<Token, FactoryError> {
///     Ok(Token("abc"))
/// }
///
/// register_fallible(InitStrategy::RunOnce, token).unwrap();
/// assert_eq!(get::<Token>().unwrap().0, "abc");
/// ```
pub fn register_fallible<T: Send + Sync + 'static>(
    strategy: InitStrategy,
    factory: fn() -> Result<T, FactoryError>,
) -> Result<(), SingletonError> {
    Global.register_fallible(strategy, factory)
}

/// Registers a prepared singleton for `T` in the global registry.
pub fn register_singleton<T: Send + Sync + 'static>(
    singleton: Singleton<T>,
) -> Result<(), SingletonError> {
    Global.register_singleton(singleton)
}

/// Retrieves the instance of `T` from the global registry, building it on first use.
///
/// # Examples
///
/// ```
/// use lazy_singleton::{get, SingletonError};
///
/// struct Missing;
///
/// let result = get::<Missing>();
/// assert!(matches!(result, Err(SingletonError::TypeNotFound { .. })));
/// ```
pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, SingletonError> {
    Global.get()
}

/// Checks if a factory for `T` is registered in the global registry.
pub fn contains<T: Send + Sync + 'static>() -> Result<bool, SingletonError> {
    Global.contains::<T>()
}

/// Lifecycle state of the instance registered for `T`.
pub fn state<T: Send + Sync + 'static>() -> Result<InitState, SingletonError> {
    Global.state::<T>()
}

#[doc(hidden)]
pub fn clear() {
    Global.clear()
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
