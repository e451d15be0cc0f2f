//! A value constructed at most once, on first demand, shared by every caller.
//!
//! [`Singleton<T>`] is the single primitive behind every strategy in
//! [`InitStrategy`]. The strategy only changes *how* the first construction is
//! coordinated; the contract is the same for all of them:
//!
//! - the first successful access constructs exactly one `T`,
//! - every later access returns the same `Arc<T>` (`Arc::ptr_eq` holds),
//! - a failed or panicking factory caches nothing, so the next access retries.
//!
//! All constructors are `const`, so a singleton is usually a `static`.
//!
//! # Examples
//!
//! ```
//! use lazy_singleton::{InitStrategy, Singleton};
//! use std::sync::Arc;
//!
//! struct Settings {
//!     value: u32,
//! }
//!
//! static SETTINGS: Singleton<Settings> =
//!     Singleton::new("settings", InitStrategy::DoubleChecked, || Settings { value: 42 });
//!
//! let a = SETTINGS.get().unwrap();
//! let b = SETTINGS.get().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(a.value, 42);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use once_cell::sync::OnceCell;

use crate::trace::emit_event;
use crate::{FactoryError, InitState, InitStrategy, SingletonError, SingletonEvent};

enum Factory<T> {
    Infallible(fn() -> T),
    Fallible(fn() -> Result<T, FactoryError>),
}

impl<T> Factory<T> {
    fn call(&self) -> Result<T, FactoryError> {
        match self {
            Factory::Infallible(make) => Ok(make()),
            Factory::Fallible(make) => make(),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Publication slot
// -------------------------------------------------------------------------------------------------

/// An `Arc<T>` published through an atomic pointer.
///
/// The slot owns one strong reference to the published value. Readers clone it
/// out with an acquire load; the single writer publishes with a release CAS.
struct AtomicSlot<T> {
    ptr: AtomicPtr<T>,
    _owned: PhantomData<Arc<T>>,
}

impl<T> AtomicSlot<T> {
    const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            _owned: PhantomData,
        }
    }

    fn is_set(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    fn load(&self) -> Option<Arc<T>> {
        // Acquire pairs with the release in `publish`: seeing the pointer implies
        // seeing every write the factory made to the pointee.
        let raw = self.ptr.load(Ordering::Acquire);
        if raw.is_null() {
            return None;
        }
        // SAFETY: non-null pointers only come from `Arc::into_raw` in `publish`,
        // and the slot keeps that strong reference alive until it is dropped.
        unsafe {
            Arc::increment_strong_count(raw);
            Some(Arc::from_raw(raw))
        }
    }

    /// Publishes `value` if the slot is empty.
    ///
    /// Returns `Ok` with the published value, or `Err` with the value that was
    /// already there (in which case `value` is dropped).
    fn publish(&self, value: Arc<T>) -> Result<Arc<T>, Arc<T>> {
        let raw = Arc::into_raw(Arc::clone(&value)).cast_mut();
        match self
            .ptr
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(value),
            Err(existing) => {
                // SAFETY: `raw` was never stored, this gives back the count it took.
                unsafe { drop(Arc::from_raw(raw)) };
                drop(value);
                // SAFETY: same as in `load`.
                unsafe {
                    Arc::increment_strong_count(existing);
                    Err(Arc::from_raw(existing))
                }
            }
        }
    }
}

impl<T> Drop for AtomicSlot<T> {
    fn drop(&mut self) {
        let raw = *self.ptr.get_mut();
        if !raw.is_null() {
            // SAFETY: the slot is going away, this releases the reference it owned.
            unsafe { drop(Arc::from_raw(raw)) };
        }
    }
}

/// Storage for the instance. The variant *is* the strategy.
enum Slot<T> {
    Eager(AtomicSlot<T>),
    Unsynchronized(AtomicSlot<T>),
    Locked(AtomicSlot<T>),
    DoubleChecked(AtomicSlot<T>),
    DeferredStatic(OnceLock<Arc<T>>),
    RunOnce(OnceCell<Arc<T>>),
}

impl<T> Slot<T> {
    const fn for_strategy(strategy: InitStrategy) -> Self {
        match strategy {
            InitStrategy::Eager => Slot::Eager(AtomicSlot::new()),
            InitStrategy::Unsynchronized => Slot::Unsynchronized(AtomicSlot::new()),
            InitStrategy::Locked => Slot::Locked(AtomicSlot::new()),
            InitStrategy::DoubleChecked => Slot::DoubleChecked(AtomicSlot::new()),
            InitStrategy::DeferredStatic => Slot::DeferredStatic(OnceLock::new()),
            InitStrategy::RunOnce => Slot::RunOnce(OnceCell::new()),
        }
    }

    fn strategy(&self) -> InitStrategy {
        match self {
            Slot::Eager(_) => InitStrategy::Eager,
            Slot::Unsynchronized(_) => InitStrategy::Unsynchronized,
            Slot::Locked(_) => InitStrategy::Locked,
            Slot::DoubleChecked(_) => InitStrategy::DoubleChecked,
            Slot::DeferredStatic(_) => InitStrategy::DeferredStatic,
            Slot::RunOnce(_) => InitStrategy::RunOnce,
        }
    }

    fn is_set(&self) -> bool {
        match self {
            Slot::Eager(slot)
            | Slot::Unsynchronized(slot)
            | Slot::Locked(slot)
            | Slot::DoubleChecked(slot) => slot.is_set(),
            Slot::DeferredStatic(holder) => holder.get().is_some(),
            Slot::RunOnce(cell) => cell.get().is_some(),
        }
    }

    fn peek(&self) -> Option<Arc<T>> {
        match self {
            Slot::Eager(slot)
            | Slot::Unsynchronized(slot)
            | Slot::Locked(slot)
            | Slot::DoubleChecked(slot) => slot.load(),
            Slot::DeferredStatic(holder) => holder.get().cloned(),
            Slot::RunOnce(cell) => cell.get().cloned(),
        }
    }
}

/// Marks a factory run in progress; released on return or unwind.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

// -------------------------------------------------------------------------------------------------
// Singleton
// -------------------------------------------------------------------------------------------------

/// A lazily (or eagerly) constructed, process-wide shared value.
///
/// See the [module documentation](self) for the contract and
/// [`InitStrategy`] for the available strategies.
pub struct Singleton<T> {
    name: &'static str,
    factory: Factory<T>,
    slot: Slot<T>,
    lock: Mutex<()>,
    in_flight: AtomicUsize,
    constructions: AtomicUsize,
}

impl<T> Singleton<T> {
    /// Declares a singleton with an infallible factory.
    ///
    /// `name` only appears in errors, events and logs.
    pub const fn new(name: &'static str, strategy: InitStrategy, factory: fn() -> T) -> Self {
        Self::with_factory(name, strategy, Factory::Infallible(factory))
    }

    /// Declares a singleton whose factory may fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_singleton::{FactoryError, InitStrategy, Singleton};
    ///
    /// fn connect() -> Result<String, FactoryError> {
    ///     Err(FactoryError::new("connection refused"))
    /// }
    ///
    /// static CONNECTION: Singleton<String> =
    ///     Singleton::fallible("connection", InitStrategy::RunOnce, connect);
    ///
    /// let err = CONNECTION.get().unwrap_err();
    /// assert!(err.is_retryable());
    /// assert!(!CONNECTION.is_ready());
    /// ```
    pub const fn fallible(
        name: &'static str,
        strategy: InitStrategy,
        factory: fn() -> Result<T, FactoryError>,
    ) -> Self {
        Self::with_factory(name, strategy, Factory::Fallible(factory))
    }

    const fn with_factory(name: &'static str, strategy: InitStrategy, factory: Factory<T>) -> Self {
        Self {
            name,
            factory,
            slot: Slot::for_strategy(strategy),
            lock: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Builds an [`InitStrategy::Eager`] singleton and constructs its instance now.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_singleton::{InitState, Singleton};
    ///
    /// let pool = Singleton::eager("pool", || vec![0u8; 16]).unwrap();
    /// assert_eq!(pool.state(), InitState::Ready);
    /// ```
    pub fn eager(name: &'static str, factory: fn() -> T) -> Result<Self, SingletonError> {
        let singleton = Self::new(name, InitStrategy::Eager, factory);
        singleton.init()?;
        Ok(singleton)
    }

    /// Returns the shared instance, constructing it first if the strategy allows.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::Factory`] if construction was attempted and failed.
    ///   Nothing is cached, a later call tries again.
    /// - [`SingletonError::NotInitialized`] for an eager singleton whose
    ///   [`init`](Self::init) has not run yet.
    pub fn get(&self) -> Result<Arc<T>, SingletonError> {
        match &self.slot {
            Slot::Eager(slot) => slot
                .load()
                .ok_or(SingletonError::NotInitialized { name: self.name }),
            Slot::Unsynchronized(slot) => match slot.load() {
                Some(instance) => Ok(instance),
                None => self.race_to_publish(slot),
            },
            Slot::Locked(slot) => self.init_locked(slot),
            Slot::DoubleChecked(slot) => match slot.load() {
                Some(instance) => Ok(instance),
                None => self.init_locked(slot),
            },
            Slot::DeferredStatic(holder) => match holder.get() {
                Some(instance) => Ok(Arc::clone(instance)),
                None => self.init_holder(holder),
            },
            Slot::RunOnce(cell) => cell.get_or_try_init(|| self.construct()).map(Arc::clone),
        }
    }

    /// Constructs the instance now if it does not exist yet.
    ///
    /// This is the start-up hook for eager singletons. For lazy strategies it is
    /// the same as [`get`](Self::get).
    pub fn init(&self) -> Result<Arc<T>, SingletonError> {
        match &self.slot {
            Slot::Eager(slot) => self.init_locked(slot),
            _ => self.get(),
        }
    }

    /// Returns the instance if it is ready. Never constructs.
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.slot.peek()
    }

    /// Snapshot of the lifecycle state.
    pub fn state(&self) -> InitState {
        if self.slot.is_set() {
            InitState::Ready
        } else if self.in_flight.load(Ordering::Acquire) > 0 {
            InitState::Initializing
        } else {
            InitState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slot.is_set()
    }

    pub fn strategy(&self) -> InitStrategy {
        self.slot.strategy()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How many times the factory has returned a value.
    ///
    /// Stays at 1 for every thread-safe strategy. An unsynchronized singleton
    /// that lost a race shows more.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    fn init_locked(&self, slot: &AtomicSlot<T>) -> Result<Arc<T>, SingletonError> {
        // The lock guards `()`: a factory panic leaves nothing to repair.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = slot.load() {
            return Ok(instance);
        }
        let instance = self.construct()?;
        match slot.publish(instance) {
            Ok(instance) | Err(instance) => Ok(instance),
        }
    }

    fn race_to_publish(&self, slot: &AtomicSlot<T>) -> Result<Arc<T>, SingletonError> {
        let instance = self.construct()?;
        match slot.publish(instance) {
            Ok(instance) => Ok(instance),
            Err(winner) => {
                tracing::warn!(
                    singleton = self.name,
                    "unsynchronized singleton constructed twice, discarding the loser"
                );
                emit_event(&SingletonEvent::Discarded { name: self.name });
                Ok(winner)
            }
        }
    }

    fn init_holder(&self, holder: &OnceLock<Arc<T>>) -> Result<Arc<T>, SingletonError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = holder.get() {
            return Ok(Arc::clone(instance));
        }
        let instance = self.construct()?;
        Ok(Arc::clone(holder.get_or_init(|| instance)))
    }

    fn construct(&self) -> Result<Arc<T>, SingletonError> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let strategy = self.strategy();

        tracing::debug!(singleton = self.name, %strategy, "constructing instance");
        emit_event(&SingletonEvent::Initializing {
            name: self.name,
            strategy,
        });

        match self.factory.call() {
            Ok(value) => {
                self.constructions.fetch_add(1, Ordering::Relaxed);
                emit_event(&SingletonEvent::Constructed { name: self.name });
                Ok(Arc::new(value))
            }
            Err(source) => {
                tracing::warn!(
                    singleton = self.name,
                    error = %source,
                    "factory failed, instance left uninitialized"
                );
                emit_event(&SingletonEvent::Failed {
                    name: self.name,
                    error: source.to_string(),
                });
                Err(SingletonError::Factory {
                    name: self.name,
                    source,
                })
            }
        }
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("name", &self.name)
            .field("strategy", &self.strategy())
            .field("state", &self.state())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
