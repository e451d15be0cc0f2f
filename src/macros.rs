//! Macros for declaring singletons and isolated registries.

/// Declares an accessor function backed by a function-local `static` singleton.
///
/// The holder is only reachable through the generated function, so nothing can
/// touch the instance before the first call. Prefix the factory with `fallible`
/// when it returns `Result<T, FactoryError>`.
///
/// `Eager` is rejected: a hidden holder has no start-up hook to run `init()`.
/// Use [`Singleton::eager`](crate::Singleton::eager) or a registry instead.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::define_singleton;
/// use std::sync::Arc;
///
/// pub struct Palette {
///     pub colors: Vec<&'static str>,
/// }
///
/// define_singleton! {
///     /// Shared color palette.
///     pub fn palette() -> Palette = || Palette { colors: vec!["red", "white"] }, DeferredStatic
/// }
///
/// let a = palette().unwrap();
/// let b = palette().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(a.colors.len(), 2);
/// ```
///
/// A fallible factory:
///
/// ```rust
/// use lazy_singleton::{define_singleton, FactoryError};
///
/// fn load_port() -> Result<u16, FactoryError> {
///     "8080".parse().map_err(|e| FactoryError::from_error(&e))
/// }
///
/// define_singleton! {
///     fn port() -> u16 = fallible load_port, RunOnce
/// }
///
/// assert_eq!(*port().unwrap(), 8080);
/// ```
#[macro_export]
macro_rules! define_singleton {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() -> $ty:ty = fallible $factory:expr, Eager $(;)?
    ) => {
        compile_error!("define_singleton! cannot declare an Eager singleton");
    };
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() -> $ty:ty = $factory:expr, Eager $(;)?
    ) => {
        compile_error!("define_singleton! cannot declare an Eager singleton");
    };
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() -> $ty:ty = fallible $factory:expr, $strategy:ident $(;)?
    ) => {
        $(#[$meta])*
        $vis fn $name() -> ::std::result::Result<::std::sync::Arc<$ty>, $crate::SingletonError> {
            static HOLDER: $crate::Singleton<$ty> = $crate::Singleton::fallible(
                concat!(module_path!(), "::", stringify!($name)),
                $crate::InitStrategy::$strategy,
                $factory,
            );
            HOLDER.get()
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident() -> $ty:ty = $factory:expr, $strategy:ident $(;)?
    ) => {
        $(#[$meta])*
        $vis fn $name() -> ::std::result::Result<::std::sync::Arc<$ty>, $crate::SingletonError> {
            static HOLDER: $crate::Singleton<$ty> = $crate::Singleton::new(
                concat!(module_path!(), "::", stringify!($name)),
                $crate::InitStrategy::$strategy,
                $factory,
            );
            HOLDER.get()
        }
    };
}

/// Creates an isolated singleton registry with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden)
/// - An `Api` struct that implements `RegistryApi`
/// - Free functions delegating to it
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::{define_registry, InitStrategy};
/// use std::sync::Arc;
///
/// define_registry!(services);
///
/// struct Clock;
///
/// services::register(InitStrategy::DoubleChecked, || Clock).unwrap();
///
/// let a: Arc<Clock> = services::get().unwrap();
/// let b: Arc<Clock> = services::get().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
///
/// # Multiple Registries
///
/// Each registry is completely isolated:
///
/// ```rust
/// use lazy_singleton::{define_registry, InitStrategy};
///
/// define_registry!(primary);
/// define_registry!(replica);
///
/// primary::register(InitStrategy::Locked, || "primary".to_string()).unwrap();
///
/// assert!(primary::contains::<String>().unwrap());
/// assert!(!replica::contains::<String>().unwrap());
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock, Mutex};
            use std::collections::HashMap;

            // Storage for registered singletons (module-private)
            static STORAGE: $crate::RegistryStorage = LazyLock::new(|| Mutex::new(HashMap::new()));

            /// Zero-sized type that implements the registry API.
            struct Api;

            impl $crate::RegistryApi for Api {
                fn storage() -> &'static $crate::RegistryStorage {
                    &STORAGE
                }
            }

            const API: Api = Api;

            /// Register an infallible factory for `T`.
            pub fn register<T: Send + Sync + 'static>(
                strategy: $crate::InitStrategy,
                factory: fn() -> T,
            ) -> Result<(), $crate::SingletonError> {
                use $crate::RegistryApi;
                API.register(strategy, factory)
            }

            /// Register a fallible factory for `T`.
            pub fn register_fallible<T: Send + Sync + 'static>(
                strategy: $crate::InitStrategy,
                factory: fn() -> Result<T, $crate::FactoryError>,
            ) -> Result<(), $crate::SingletonError> {
                use $crate::RegistryApi;
                API.register_fallible(strategy, factory)
            }

            /// Register a prepared singleton for `T`.
            pub fn register_singleton<T: Send + Sync + 'static>(
                singleton: $crate::Singleton<T>,
            ) -> Result<(), $crate::SingletonError> {
                use $crate::RegistryApi;
                API.register_singleton(singleton)
            }

            /// Retrieve the instance of `T`, building it on first use.
            pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.get()
            }

            /// Check if a factory for `T` is registered.
            pub fn contains<T: Send + Sync + 'static>() -> Result<bool, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.contains::<T>()
            }

            /// Lifecycle state of the instance registered for `T`.
            pub fn state<T: Send + Sync + 'static>() -> Result<$crate::InitState, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.state::<T>()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{FactoryError, InitState, InitStrategy};
    use std::sync::Arc;

    #[test]
    fn test_define_registry_macro() {
        define_registry!(test_reg);

        test_reg::register(InitStrategy::Locked, || 100i32).unwrap();
        assert_eq!(test_reg::state::<i32>().unwrap(), InitState::Uninitialized);

        let value: Arc<i32> = test_reg::get().unwrap();
        assert_eq!(*value, 100);

        assert!(test_reg::contains::<i32>().unwrap());
        assert!(!test_reg::contains::<f64>().unwrap());
    }

    #[test]
    fn test_multiple_registries() {
        define_registry!(reg_a);
        define_registry!(reg_b);

        reg_a::register(InitStrategy::RunOnce, || 1i32).unwrap();
        reg_b::register(InitStrategy::RunOnce, || 2i32).unwrap();

        let a_val: Arc<i32> = reg_a::get().unwrap();
        let b_val: Arc<i32> = reg_b::get().unwrap();

        assert_eq!(*a_val, 1);
        assert_eq!(*b_val, 2);
    }

    #[test]
    fn test_define_singleton_names_holder_after_function() {
        define_singleton! {
            fn broken() -> u8 = fallible || Err(FactoryError::new("nope")), Locked
        }

        let err = broken().unwrap_err();
        assert!(err.to_string().ends_with("::broken` failed: nope"), "{err}");
    }

    #[test]
    fn test_define_singleton_lazy_strategies() {
        define_singleton!(fn naive() -> u8 = || 2, Unsynchronized);
        define_singleton!(fn locked() -> u8 = || 3, Locked);
        define_singleton!(fn checked() -> u8 = || 4, DoubleChecked);
        define_singleton!(fn deferred() -> u8 = || 5, DeferredStatic);
        define_singleton!(fn once() -> u8 = || 6, RunOnce);

        assert_eq!(*naive().unwrap(), 2);
        assert_eq!(*locked().unwrap(), 3);
        assert_eq!(*checked().unwrap(), 4);
        assert_eq!(*deferred().unwrap(), 5);
        assert_eq!(*once().unwrap(), 6);
    }
}
