//! Queryset abstraction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::TypePath;
use crate::error::QueryError;
use crate::value::{Row, Value};

/// Storage type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Real,
    Bool,
    Text,
}

impl FieldKind {
    /// Convert a raw lookup value (as captured from a URL) to a typed value.
    pub fn coerce(&self, field: &str, raw: &str) -> Result<Value, QueryError> {
        let failed = || QueryError::Coercion {
            field: field.to_string(),
            value: raw.to_string(),
            kind: *self,
        };

        match self {
            Self::Integer => raw.trim().parse::<i64>().map(Value::Integer).map_err(|_| failed()),
            Self::Real => raw.trim().parse::<f64>().map(Value::Real).map_err(|_| failed()),
            Self::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(failed()),
            },
            Self::Text => Ok(Value::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
            Self::Bool => write!(f, "bool"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub kind: FieldKind,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A lazily evaluated, filterable query over one model.
///
/// Filtering never mutates the receiver; it returns a new queryset.
pub trait QuerySet: Send + Sync + fmt::Debug {
    /// Model backing this queryset.
    fn model(&self) -> &TypePath;

    /// Whether this queryset is empty by construction (never hits the store).
    fn is_none(&self) -> bool;

    /// Restrict to rows where `field` equals the coerced `raw` value.
    fn filter(&self, field: &str, raw: &str) -> Result<Box<dyn QuerySet>, QueryError>;

    /// Compiled query text.
    ///
    /// Returns `QueryError::EmptyResultSet` when the query cannot match rows.
    fn query_text(&self) -> Result<String, QueryError>;

    /// Number of matching rows.
    fn count(&self) -> Result<usize, QueryError>;

    /// Matching rows with all field values, in store order.
    fn values_list(&self) -> Result<Vec<Row>, QueryError>;
}
