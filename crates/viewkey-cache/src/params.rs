//! Bit parameters and selectors.

use viewkey_core::TypePath;

/// Parameters a key bit is configured or invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Select everything the source offers (`*`).
    All,
    /// Explicit ordered selector names.
    Keys(Vec<String>),
    /// Explicit ordered positions into the positional arguments.
    Indices(Vec<usize>),
    /// Model override for model-identity bits.
    Model(TypePath),
}

impl Params {
    /// Explicit key selector.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Explicit positional selector.
    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Indices(indices.into_iter().collect())
    }

    /// Model override.
    pub fn model(model: TypePath) -> Self {
        Self::Model(model)
    }

    /// Resolve to a key selector, if these params select keys.
    pub fn selector(&self) -> Option<Selector> {
        match self {
            Self::All => Some(Selector::All),
            Self::Keys(keys) => Some(Selector::Explicit(keys.clone())),
            Self::Indices(_) | Self::Model(_) => None,
        }
    }
}

/// Key selection over a dict-like source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every key of the source, in source order.
    All,
    /// These keys, in this order.
    Explicit(Vec<String>),
}
