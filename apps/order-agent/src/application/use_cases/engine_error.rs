//! Engine errors.

use thiserror::Error;

use crate::application::ports::{ExchangeError, SettingsError};
use crate::domain::shared::DomainError;

/// Failure of one engine step, with call-site context.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// An exchange call failed.
    #[error("{context}: {source}")]
    Exchange {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: ExchangeError,
    },

    /// Exchange data could not be interpreted.
    #[error("{context}: {source}")]
    Domain {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: DomainError,
    },

    /// The self-trade recovery loop gave up.
    #[error("Self-trade retries exhausted after {attempts} attempts in {market}")]
    RetriesExhausted {
        /// Market of the re-buy.
        market: String,
        /// Attempts made.
        attempts: u32,
    },

    /// Dynamic settings could not be read.
    #[error("Failed to read settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Attach call-site context to exchange and domain failures.
pub trait Context<T> {
    /// Wrap the error with `context`.
    fn context(self, context: impl Into<String>) -> Result<T, EngineError>;

    /// Wrap the error with a lazily built context.
    fn with_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T, EngineError>;
}

impl<T> Context<T> for Result<T, ExchangeError> {
    fn context(self, context: impl Into<String>) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::Exchange {
            context: context.into(),
            source,
        })
    }

    fn with_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::Exchange {
            context: context().into(),
            source,
        })
    }
}

impl<T> Context<T> for Result<T, DomainError> {
    fn context(self, context: impl Into<String>) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::Domain {
            context: context.into(),
            source,
        })
    }

    fn with_context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T, EngineError> {
        self.map_err(|source| EngineError::Domain {
            context: context().into(),
            source,
        })
    }
}

impl EngineError {
    /// The exchange error behind this failure, if any.
    #[must_use]
    pub const fn exchange_error(&self) -> Option<&ExchangeError> {
        match self {
            Self::Exchange { source, .. } => Some(source),
            _ => None,
        }
    }
}
