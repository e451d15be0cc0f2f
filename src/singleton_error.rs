use thiserror::Error;

/// Error returned by a fallible singleton factory.
///
/// Factories are plain `fn` pointers so they can sit in a `static`; they report
/// failure with a message rather than a generic error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FactoryError {
    message: String,
}

impl FactoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps any error, keeping its `Display` text.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for FactoryError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for FactoryError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SingletonError {
    /// The factory failed. Nothing was cached; the next access retries.
    #[error("factory for `{name}` failed: {source}")]
    Factory {
        name: &'static str,
        #[source]
        source: FactoryError,
    },

    /// An eager singleton was read before `init()` constructed it.
    #[error("eager singleton `{name}` accessed before initialization")]
    NotInitialized { name: &'static str },

    #[error("failed to acquire registry lock")]
    RegistryLock,

    #[error("type mismatch in registry for type: {type_name}")]
    TypeMismatch { type_name: &'static str },

    #[error("type not found in registry: {type_name}")]
    TypeNotFound { type_name: &'static str },

    #[error("type already registered: {type_name}")]
    AlreadyRegistered { type_name: &'static str },
}

impl SingletonError {
    /// Whether calling again may succeed without any other change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SingletonError::Factory { .. })
    }
}
