use std::any::Any;
use std::fmt;
use std::panic;

use thiserror::Error;

/// A problem with how an experiment was set up. These are returned before any
/// experiment function runs and are never published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Experiments must be constructed with a non-empty name
    #[error("an experiment requires a name")]
    MissingName,

    /// Nothing was registered (or enabled) for the requested run
    #[error("no experiments to run")]
    NoExperiments,

    /// `run_only` was asked for something other than control or candidate
    #[error("invalid run type: {0:?}")]
    InvalidRunType(String),
}

/// The error returned from `run` and `run_only`.
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// The experiment could not be run at all
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The observed experiment function returned this error. It is the exact
    /// value the function produced.
    #[error("experiment failed: {0}")]
    Experiment(E),
}

impl<E> RunError<E> {
    /// The original experiment error, if this was not a configuration problem
    pub fn into_experiment(self) -> Option<E> {
        match self {
            RunError::Experiment(error) => Some(error),
            RunError::Config(_) => None,
        }
    }

    /// The configuration problem, if that is what stopped the run
    pub fn config(&self) -> Option<&ConfigError> {
        match self {
            RunError::Config(error) => Some(error),
            RunError::Experiment(_) => None,
        }
    }
}

/// How an experiment function failed.
pub enum Failure<E> {
    /// The function returned `Err`
    Error(E),

    /// The function panicked. The payload is kept so the panic can be resumed
    /// if this was the path the caller asked to observe.
    Panic(Box<dyn Any + Send + 'static>),
}

impl<E> Failure<E> {
    /// The returned error, if the function did not panic
    pub fn error(&self) -> Option<&E> {
        match self {
            Failure::Error(error) => Some(error),
            Failure::Panic(_) => None,
        }
    }

    /// The panic message, when the payload was a string
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Failure::Panic(payload) => payload
                .downcast_ref::<&'static str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str)),
            Failure::Error(_) => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panic(_))
    }

    /// Hands the failure back to the caller: errors are returned, panics are
    /// resumed with their original payload.
    pub(crate) fn surface(self) -> E {
        match self {
            Failure::Error(error) => error,
            Failure::Panic(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Failure::Panic(_) => f
                .debug_tuple("Panic")
                .field(&self.panic_message().unwrap_or("<non-string payload>"))
                .finish(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Failure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Error(error) => fmt::Display::fmt(error, f),
            Failure::Panic(_) => write!(
                f,
                "panicked: {}",
                self.panic_message().unwrap_or("<non-string payload>")
            ),
        }
    }
}
