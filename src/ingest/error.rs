//! Errors from reading and validating transaction files.

use crate::core::currency::CurrencyCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid header: expected {expected:?}, got {found:?}")]
    Header {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("failed to parse line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("transaction {index} ({transaction_id}) failed validation")]
    Validation {
        /// 1-based position in the batch.
        index: usize,
        transaction_id: String,
        #[source]
        source: ValidationError,
    },
}

/// A record that parsed but cannot enter the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("transaction ID cannot be empty")]
    EmptyId,

    #[error("supplier ID cannot be empty")]
    EmptySupplier,

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),

    #[error("timestamp cannot be in the future: {0}")]
    FutureTimestamp(DateTime<Utc>),
}
