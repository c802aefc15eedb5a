//! Core abstractions consumed by view cache key bits.
//!
//! This crate provides the collaborators a host framework implements:
//! - `Request` / `View` / `Paginator` / `UserIdentity` - Request and view context
//! - `QuerySet` - Filterable data-store query with text and row rendering
//! - `MemoryTable` / `MemoryQuerySet` - In-memory queryset implementation
//! - `KeyBitSettings` - Configuration shared by all key bits
//!
//! # Example
//!
//! ```ignore
//! use viewkey_core::{FieldKind, MemoryTable, RequestContext, TypePath, User};
//!
//! let table = MemoryTable::new(TypePath::new("shop.models", "Product"), "shop_product")
//!     .with_field("id", FieldKind::Integer)
//!     .with_field("name", FieldKind::Text);
//!
//! let request = RequestContext::new()
//!     .with_format("json")
//!     .with_user(User::authenticated("10"))
//!     .with_meta("HTTP_ACCEPT_LANGUAGE", "ru");
//! ```

mod context;
mod error;
mod memory;
mod queryset;
mod settings;
mod value;

pub use context::*;
pub use error::*;
pub use memory::*;
pub use queryset::*;
pub use settings::*;
pub use value::*;
