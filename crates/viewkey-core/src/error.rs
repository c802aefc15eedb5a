//! Queryset error types.

use thiserror::Error;

use crate::queryset::FieldKind;

/// Errors that can occur when building or evaluating a queryset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The query can never match any row.
    #[error("Query cannot produce any rows")]
    EmptyResultSet,

    /// A lookup value could not be converted to the field type.
    #[error("Cannot convert {value:?} for field '{field}' to {kind}")]
    Coercion {
        /// Field name.
        field: String,
        /// Raw lookup value.
        value: String,
        /// Expected field kind.
        kind: FieldKind,
    },

    /// The field does not exist on the model.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Backend storage failure.
    #[error("Backend error: {0}")]
    Backend(String),
}
