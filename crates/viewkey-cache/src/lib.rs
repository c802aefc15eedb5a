//! Cache key construction for view handlers.
//!
//! This crate provides:
//! - `KeyBit` / `DictKeyBit` - Facets of the request/view context contributing to a key
//! - `Params` - Bit configuration (wildcard, keys, indices, model override)
//! - Scalar bits - View and method identity, format, language, user
//! - Dict bits - Headers, request metadata, query params, pagination, kwargs
//! - Model bits - Model name, compiled queries and queryset contents
//! - `KeyConstructor` - Named bits composed into a `CacheKey`
//!
//! # Example
//!
//! ```ignore
//! use viewkey_cache::{HeadersKeyBit, KeyConstructor, QueryParamsKeyBit, UserKeyBit};
//!
//! // Vary on language header, the `page` parameter and the user
//! let constructor = KeyConstructor::default_key()
//!     .bit("headers", HeadersKeyBit::new(["Accept-Language"]))
//!     .bit("query", QueryParamsKeyBit::only(["page"]))
//!     .bit("user", UserKeyBit::new())
//!     .memoize_for_request(true);
//!
//! let key = constructor.get_key(Some(&view), Some("list"), Some(&request), &[], &kwargs)?;
//! ```

mod args;
mod bit;
mod constructor;
mod dict;
mod error;
mod fragment;
mod key;
mod model;
mod params;
mod scalar;

#[cfg(test)]
mod testing;

pub use args::*;
pub use bit::{DictKeyBit, KeyBit, KeyContext};
pub use constructor::*;
pub use dict::*;
pub use error::*;
pub use fragment::*;
pub use key::*;
pub use model::*;
pub use params::*;
pub use scalar::*;
