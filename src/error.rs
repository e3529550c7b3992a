//! Unified error type.

use std::error::Error as StdError;

/// A type-erased, caller-defined failure.
///
/// The engine never classifies what went wrong inside a middleware; it only
/// carries the failure outward. Whatever error type the application uses is
/// boxed here and recoverable via [`Error::cause`] and downcasting.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The error type returned by strata's fallible operations.
///
/// Handler failures surface as [`Error::Fault`] from `execute`; the caller
/// decides final disposition. [`Error::Cycle`] can only come out of
/// [`hierarchy`](crate::hierarchy), never out of an execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A middleware or terminal continuation failed.
    #[error("middleware fault: {0}")]
    Fault(#[source] BoxError),

    /// A composition refers back into itself.
    #[error("middleware tree contains a cycle")]
    Cycle,
}

impl Error {
    /// Wraps a caller-defined error as a middleware fault.
    pub fn fault(err: impl Into<BoxError>) -> Self {
        Self::Fault(err.into())
    }

    /// A middleware fault from a bare message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into().into())
    }

    /// The caller-defined cause, if this is a fault. Downcast to get the
    /// original error back.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Fault(err) => Some(err.as_ref()),
            Self::Cycle => None,
        }
    }
}
