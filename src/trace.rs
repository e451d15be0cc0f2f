//! Process-wide trace callback.
//!
//! Every singleton and registry reports through the same callback, so one hook
//! sees the whole construction history of a program.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::SingletonEvent;

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `SingletonEvent` on every construction
/// attempt and registry interaction. It must be thread-safe because singletons
/// are globally shared.
pub type TraceCallback = dyn Fn(&SingletonEvent) + Send + Sync + 'static;

static TRACE_CALLBACK: LazyLock<Mutex<Option<Arc<TraceCallback>>>> =
    LazyLock::new(|| Mutex::new(None));

/// Sets a tracing callback that will be invoked for every emitted event.
///
/// # Safety Restrictions
///
/// Every strategy except `Unsynchronized` emits while it holds its initialization
/// lock (`RunOnce` from inside `OnceCell::get_or_try_init`, `Eager` from `init`).
/// The callback must not access that same singleton.
///
/// # Example
/// ```rust
/// use lazy_singleton::{clear_trace_callback, set_trace_callback};
///
/// set_trace_callback(|event| println!("[singleton-trace] {event}"));
/// clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
    let mut guard = TRACE_CALLBACK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Arc::new(callback));
}

/// Clears the tracing callback.
pub fn clear_trace_callback() {
    let mut guard = TRACE_CALLBACK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = None;
}

/// Emits an event to the current callback, if any.
///
/// The callback is cloned out so it runs without the callback lock held; a
/// callback may therefore replace or clear itself.
pub(crate) fn emit_event(event: &SingletonEvent) {
    let callback = TRACE_CALLBACK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(callback) = callback {
        callback(event);
    }
}
