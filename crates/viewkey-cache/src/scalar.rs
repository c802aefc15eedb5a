//! Bits producing a single text value.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use viewkey_core::UserIdentity;

use crate::bit::{KeyBit, KeyContext};
use crate::error::KeyBitResult;
use crate::fragment::Fragment;
use crate::params::Params;

/// Text of the anonymous user bucket.
pub const ANONYMOUS: &str = "anonymous";

/// Identifies the view type.
///
/// Return example: `"shop.views.ProductViewSet"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueViewIdKeyBit;

impl UniqueViewIdKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for UniqueViewIdKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        Ok(Some(match ctx.view {
            Some(view) => Fragment::text(view.type_path().dotted()),
            None => ctx.any_value(),
        }))
    }
}

/// Identifies the view type and the method handling the request.
///
/// Return example: `"shop.views.ProductViewSet.retrieve"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueMethodIdKeyBit;

impl UniqueMethodIdKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for UniqueMethodIdKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let (Some(view), Some(method)) = (ctx.view, ctx.method) else {
            return Ok(Some(ctx.any_value()));
        };
        Ok(Some(Fragment::text(format!("{}.{}", view.type_path().dotted(), method))))
    }
}

/// Active locale of the request, falling back to the configured language.
///
/// Return example: `"en"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageKeyBit;

impl LanguageKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for LanguageKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let language = ctx
            .request
            .and_then(|request| request.language())
            .unwrap_or(ctx.settings.language_code.as_str());
        Ok(Some(Fragment::text(language)))
    }
}

/// Negotiated response format.
///
/// Return example: `"json"` or `"html"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatKeyBit;

impl FormatKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for FormatKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        match ctx.request.and_then(|request| request.accepted_format()) {
            Some(format) => Ok(Some(Fragment::text(format))),
            None => {
                debug!("no negotiated format, using any value");
                Ok(Some(ctx.any_value()))
            }
        }
    }
}

type UserIdFn = dyn Fn(&dyn UserIdentity) -> String + Send + Sync;

/// Requesting user.
///
/// Return example: `"anonymous"` for unauthenticated users, `"10"` for the
/// user with id 10.
#[derive(Clone, Default)]
pub struct UserKeyBit {
    id_fn: Option<Arc<UserIdFn>>,
}

impl UserKeyBit {
    /// Identify authenticated users by primary key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the user component with a custom function instead of the pk.
    pub fn with_id_fn<F>(mut self, id_fn: F) -> Self
    where
        F: Fn(&dyn UserIdentity) -> String + Send + Sync + 'static,
    {
        self.id_fn = Some(Arc::new(id_fn));
        self
    }

    fn user_id(&self, user: &dyn UserIdentity) -> String {
        match &self.id_fn {
            Some(id_fn) => id_fn(user),
            None => user.pk(),
        }
    }
}

impl fmt::Debug for UserKeyBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKeyBit")
            .field("custom_id_fn", &self.id_fn.is_some())
            .finish()
    }
}

impl KeyBit for UserKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(request) = ctx.request else {
            return Ok(Some(ctx.any_value()));
        };

        Ok(Some(match request.user() {
            Some(user) if user.is_authenticated() => Fragment::text(self.user_id(user)),
            _ => Fragment::text(ANONYMOUS),
        }))
    }
}
