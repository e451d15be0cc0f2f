use crate::InitStrategy;

/// Events emitted by singletons and registries.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// Singletons only emit on the construction path, so reads of a ready instance
/// stay silent.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton::{InitStrategy, SingletonEvent};
///
/// let event = SingletonEvent::Initializing {
///     name: "config",
///     strategy: InitStrategy::DoubleChecked,
/// };
/// assert_eq!(event.to_string(), "initializing { name: config, strategy: double-checked }");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SingletonEvent {
    /// The factory is about to run.
    Initializing {
        name: &'static str,
        strategy: InitStrategy,
    },

    /// The factory returned a value.
    Constructed { name: &'static str },

    /// The factory failed; the singleton went back to uninitialized.
    Failed { name: &'static str, error: String },

    /// An unsynchronized singleton lost the publication race and dropped its value.
    Discarded { name: &'static str },

    /// A factory registration for a type was attempted.
    Register {
        type_name: &'static str,
        registered: bool,
    },

    /// A registered type was requested.
    Get {
        type_name: &'static str,
        found: bool,
    },

    /// A type existence check was performed.
    Contains {
        type_name: &'static str,
        found: bool,
    },

    /// The registry was cleared.
    Clear {},
}

impl std::fmt::Display for SingletonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SingletonEvent::Initializing { name, strategy } => {
                write!(f, "initializing {{ name: {name}, strategy: {strategy} }}")
            }
            SingletonEvent::Constructed { name } => write!(f, "constructed {{ name: {name} }}"),
            SingletonEvent::Failed { name, error } => {
                write!(f, "failed {{ name: {name}, error: {error} }}")
            }
            SingletonEvent::Discarded { name } => write!(f, "discarded {{ name: {name} }}"),
            SingletonEvent::Register {
                type_name,
                registered,
            } => write!(
                f,
                "register {{ type_name: {type_name}, registered: {registered} }}"
            ),
            SingletonEvent::Get { type_name, found } => {
                write!(f, "get {{ type_name: {type_name}, found: {found} }}")
            }
            SingletonEvent::Contains { type_name, found } => {
                write!(f, "contains {{ type_name: {type_name}, found: {found} }}")
            }
            SingletonEvent::Clear {} => write!(f, "clear {{}}"),
        }
    }
}
