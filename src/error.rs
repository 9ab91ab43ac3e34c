//! Error types for credit file generation.

use thiserror::Error;

/// Result type alias for credit file operations
pub type Result<T> = std::result::Result<T, CreditFileError>;

/// Errors that can occur while building, rendering or archiving a batch.
#[derive(Error, Debug)]
pub enum CreditFileError {
    /// A mandatory record attribute was never assigned
    #[error("Missing mandatory field: {field}")]
    MissingField { field: &'static str },

    /// The last six characters of an account number are not all digits
    #[error("Invalid {field} {value:?}: last six characters must be digits")]
    InvalidAccountNumber { field: &'static str, value: String },

    /// Transaction amount could not be parsed or carries too many fraction digits
    #[error("Invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Checksum, chain, sum or money total left the i64 range
    #[error("Checksum arithmetic overflowed 64-bit range")]
    ChecksumOverflow,

    /// A record's checksum state does not match its position in the batch
    #[error("Cannot render record {row}: {reason}")]
    Render { row: usize, reason: String },

    /// Failed to create or write the raw document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failure inside the archive packaging step
    #[error("Archive error: {0}")]
    Archive(String),

    /// Append attempted on a batch that was already generated in finalize-once mode
    #[error("Batch has already been generated and no longer accepts records")]
    Finalized,

    /// Input row could not be turned into a record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Invalid environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing command line arguments
    #[error("Missing arguments. Usage: credit-file <input.csv> <agency-code> [sequence]")]
    MissingArgument,
}

impl From<zip::result::ZipError> for CreditFileError {
    fn from(err: zip::result::ZipError) -> Self {
        CreditFileError::Archive(err.to_string())
    }
}
