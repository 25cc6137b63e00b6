//! Domain errors.

use thiserror::Error;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// A market symbol could not be split into base and quote.
    #[error("Cannot parse market {market}")]
    UnparseableMarket {
        /// The offending symbol.
        market: String,
    },

    /// A timestamp did not match the exchange's fixed format.
    #[error("Cannot parse timestamp '{value}': {message}")]
    InvalidTimestamp {
        /// Raw timestamp text.
        value: String,
        /// Parser message.
        message: String,
    },
}
