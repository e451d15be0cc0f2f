//! # Lazy Singleton
//!
//! One thread-safe "construct a value of `T` exactly once, on first demand"
//! primitive, with the initialization strategy as a configuration choice.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_singleton::{InitStrategy, Singleton};
//! use std::sync::Arc;
//!
//! static GREETING: Singleton<String> =
//!     Singleton::new("greeting", InitStrategy::DoubleChecked, || "Hello, World!".to_string());
//!
//! let instance1 = GREETING.get().unwrap();
//! let instance2 = GREETING.get().unwrap();
//! assert!(Arc::ptr_eq(&instance1, &instance2));
//! ```
//!
//! ## Strategies
//!
//! | [`InitStrategy`]   | First access                       | Later access     |
//! |--------------------|------------------------------------|------------------|
//! | `Eager`            | constructed by `init()` beforehand | atomic load      |
//! | `Unsynchronized`   | unguarded, may construct twice     | atomic load      |
//! | `Locked`           | under the lock                     | under the lock   |
//! | `DoubleChecked`    | under the lock, re-checked         | atomic load      |
//! | `DeferredStatic`   | `std::sync::OnceLock` holder       | `OnceLock::get`  |
//! | `RunOnce`          | `once_cell::sync::OnceCell`        | `OnceCell::get`  |
//!
//! A failing (or panicking) factory leaves the singleton uninitialized and the
//! next access tries again.
//!
//! ## Main Items
//!
//! - [`Singleton`] - the primitive itself
//! - [`define_singleton!`] - an accessor function with a hidden holder
//! - [`register`] / [`get`] - a global registry keyed by type
//! - [`define_registry!`] - isolated registries
//! - [`set_trace_callback`] - observe construction and registry events

mod macros;
mod registry;
mod registry_trait;
mod singleton;
mod singleton_error;
mod singleton_event;
mod strategy;
mod trace;

#[doc(hidden)]
pub use registry::clear;
pub use registry::{contains, get, register, register_fallible, register_singleton, state};
pub use registry_trait::{RegistryApi, RegistryStorage};
pub use singleton::Singleton;
pub use singleton_error::{FactoryError, SingletonError};
pub use singleton_event::SingletonEvent;
pub use strategy::{InitState, InitStrategy};
pub use trace::{clear_trace_callback, set_trace_callback, TraceCallback};
