//! Initialization strategies and lifecycle states.
//!
//! A [`Singleton`](crate::Singleton) is one type; *how* it reaches its single
//! instance is picked with an [`InitStrategy`] value when it is declared.

use std::fmt;

/// How a [`Singleton`](crate::Singleton) constructs its instance.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::InitStrategy;
///
/// assert!(InitStrategy::DoubleChecked.is_lazy());
/// assert!(!InitStrategy::Unsynchronized.is_thread_safe());
/// assert_eq!(InitStrategy::RunOnce.to_string(), "run-once");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStrategy {
    /// Constructed up front by `init()` (or `Singleton::eager`), never by `get()`.
    Eager,

    /// Check, then construct, with no lock at all.
    ///
    /// Memory safe, but two threads arriving together may both run the factory.
    /// Only one result is ever published; the other is discarded.
    Unsynchronized,

    /// Every access takes the lock, including reads after construction.
    Locked,

    /// Lock-free read once ready; the lock is only taken on the first access.
    DoubleChecked,

    /// The instance lives in a `std::sync::OnceLock` holder, the same primitive
    /// that backs lazily initialised statics.
    DeferredStatic,

    /// Delegates to `once_cell::sync::OnceCell`.
    RunOnce,
}

impl InitStrategy {
    /// Every strategy, in the order they are usually taught.
    pub const ALL: [InitStrategy; 6] = [
        InitStrategy::Eager,
        InitStrategy::Unsynchronized,
        InitStrategy::Locked,
        InitStrategy::DoubleChecked,
        InitStrategy::DeferredStatic,
        InitStrategy::RunOnce,
    ];

    /// Whether `get()` constructs the instance on first demand.
    pub const fn is_lazy(self) -> bool {
        !matches!(self, InitStrategy::Eager)
    }

    /// Whether concurrent first access is guaranteed to run the factory once.
    pub const fn is_thread_safe(self) -> bool {
        !matches!(self, InitStrategy::Unsynchronized)
    }
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitStrategy::Eager => "eager",
            InitStrategy::Unsynchronized => "unsynchronized",
            InitStrategy::Locked => "locked",
            InitStrategy::DoubleChecked => "double-checked",
            InitStrategy::DeferredStatic => "deferred-static",
            InitStrategy::RunOnce => "run-once",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a singleton's instance.
///
/// `Uninitialized -> Initializing -> Ready`, with `Initializing -> Uninitialized`
/// when the factory fails. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitState::Uninitialized => f.write_str("uninitialized"),
            InitState::Initializing => f.write_str("initializing"),
            InitState::Ready => f.write_str("ready"),
        }
    }
}
