//! Key bit contracts and the invocation context.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use viewkey_core::{KeyBitSettings, Kwargs, Request, View};

use crate::error::{KeyBitError, KeyBitResult};
use crate::fragment::{Fragment, FragmentMap};
use crate::params::{Params, Selector};

static NO_KWARGS: Kwargs = BTreeMap::new();

/// Everything a bit may look at during one invocation.
///
/// View, method and request may be absent (e.g., when keys are computed
/// outside a request for documentation or invalidation).
#[derive(Clone, Copy)]
pub struct KeyContext<'a> {
    /// View handling the request.
    pub view: Option<&'a dyn View>,
    /// Name of the view method handling the request.
    pub method: Option<&'a str>,
    /// Current request.
    pub request: Option<&'a dyn Request>,
    /// Positional arguments of the invocation.
    pub args: &'a [String],
    /// Keyword arguments of the invocation.
    pub kwargs: &'a Kwargs,
    /// Settings in effect.
    pub settings: &'a KeyBitSettings,
}

impl<'a> KeyContext<'a> {
    /// Create a context with no view, method, request or arguments.
    pub fn new(settings: &'a KeyBitSettings) -> Self {
        Self {
            view: None,
            method: None,
            request: None,
            args: &[],
            kwargs: &NO_KWARGS,
            settings,
        }
    }

    /// Set the view.
    pub fn with_view(mut self, view: &'a dyn View) -> Self {
        self.view = Some(view);
        self
    }

    /// Set the view method name.
    pub fn with_method(mut self, method: &'a str) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the request.
    pub fn with_request(mut self, request: &'a dyn Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Set the positional arguments.
    pub fn with_args(mut self, args: &'a [String]) -> Self {
        self.args = args;
        self
    }

    /// Set the keyword arguments.
    pub fn with_kwargs(mut self, kwargs: &'a Kwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// The any-value sentinel as a fragment.
    pub fn any_value(&self) -> Fragment {
        Fragment::text(self.settings.default_cache_any_value.clone())
    }
}

impl fmt::Debug for KeyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyContext")
            .field("view", &self.view.map(|v| v.type_path().dotted()))
            .field("method", &self.method)
            .field("request", &self.request.is_some())
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish()
    }
}

/// A single facet of the request/view context that contributes to a key.
///
/// Bits are immutable configuration shared across requests.
pub trait KeyBit: Send + Sync + fmt::Debug {
    /// Params configured on the bit itself.
    fn params(&self) -> Option<&Params> {
        None
    }

    /// Compute the fragment for this invocation.
    ///
    /// `Ok(None)` means the bit has nothing to contribute and must be left
    /// out of the composed key.
    fn get_data(
        &self,
        params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>>;
}

/// A bit reading selected keys from a dict-like source.
pub trait DictKeyBit: Send + Sync + fmt::Debug {
    /// The source mapping, or `None` when the context cannot provide it.
    fn source_dict<'c>(&self, ctx: &KeyContext<'c>) -> Option<&'c BTreeMap<String, String>>;

    /// Key under which a selected name is looked up in the source.
    fn key_for_retrieval(&self, key: &str) -> String {
        key.to_string()
    }

    /// Key under which a selected name is written to the fragment.
    fn key_for_assignment(&self, key: &str) -> String {
        key.to_string()
    }

    /// Select values from the source into a mapping fragment.
    ///
    /// Missing values are skipped. Absent params select nothing.
    fn dict_data(
        &self,
        params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(params) = params else {
            return Ok(Some(Fragment::Map(FragmentMap::new())));
        };

        let selector = params.selector().ok_or_else(|| KeyBitError::UnsupportedParams {
            bit: std::any::type_name::<Self>(),
            params: format!("{:?}", params),
        })?;

        let Some(source) = self.source_dict(ctx) else {
            debug!(bit = ?self, "no source mapping in context, using any value");
            return Ok(Some(ctx.any_value()));
        };

        let keys: Vec<String> = match selector {
            Selector::All => source.keys().cloned().collect(),
            Selector::Explicit(keys) => keys,
        };

        let mut data = FragmentMap::new();
        for key in &keys {
            if let Some(value) = source.get(&self.key_for_retrieval(key)) {
                data.insert(self.key_for_assignment(key), value.as_str());
            }
        }

        Ok(Some(Fragment::Map(data)))
    }
}

/// Implement `KeyBit` for a `DictKeyBit` carrying a `params` field.
macro_rules! dict_key_bit {
    ($($name:ident),+ $(,)?) => {
        $(
            impl $crate::bit::KeyBit for $name {
                fn params(&self) -> Option<&$crate::params::Params> {
                    self.params.as_ref()
                }

                fn get_data(
                    &self,
                    params: Option<&$crate::params::Params>,
                    ctx: &$crate::bit::KeyContext<'_>,
                ) -> $crate::error::KeyBitResult<Option<$crate::fragment::Fragment>> {
                    $crate::bit::DictKeyBit::dict_data(self, params, ctx)
                }
            }
        )+
    };
}

pub(crate) use dict_key_bit;
