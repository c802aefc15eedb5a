//! Key bit error types.

use viewkey_core::QueryError;

/// Result type for key bit operations.
pub type KeyBitResult<T> = Result<T, KeyBitError>;

/// Key bit errors.
///
/// These signal misconfiguration or store failures. An indeterminate
/// context is never an error: bits fall back to the any-value sentinel.
#[derive(Debug, thiserror::Error)]
pub enum KeyBitError {
    /// Positional selector points past the end of the arguments.
    #[error("argument index {index} out of range for {len} positional arguments")]
    IndexOutOfRange { index: usize, len: usize },

    /// The bit was invoked with params it cannot interpret.
    #[error("{bit} does not accept params {params}")]
    UnsupportedParams { bit: &'static str, params: String },

    /// The view kwargs do not carry a value for the lookup field.
    #[error("lookup field '{field}' missing from view kwargs")]
    MissingLookupValue { field: String },

    /// Data store failure.
    #[error("store error: {0}")]
    Store(#[from] QueryError),

    /// Failed to serialize key data.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KeyBitError {
    fn from(e: serde_json::Error) -> Self {
        KeyBitError::Serialization(e.to_string())
    }
}
