//! Key constructors: named bits composed into one cache key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};
use viewkey_core::{KeyBitSettings, Kwargs, Request, View};

use crate::bit::{KeyBit, KeyContext};
use crate::dict::PaginationKeyBit;
use crate::error::KeyBitResult;
use crate::key::{self, CacheKey, KeyData};
use crate::model::{
    ListModelKeyBit, ListSqlQueryKeyBit, RetrieveModelKeyBit, RetrieveSqlQueryKeyBit,
};
use crate::params::Params;
use crate::scalar::{FormatKeyBit, LanguageKeyBit, UniqueMethodIdKeyBit};

static NEXT_CONSTRUCTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Composes a cache key from an ordered set of named bits.
///
/// # Example
///
/// ```ignore
/// let constructor = KeyConstructor::new()
///     .bit("unique_method_id", UniqueMethodIdKeyBit)
///     .bit("headers", HeadersKeyBit::new(["Accept-Language"]))
///     .bit("user", UserKeyBit::new());
///
/// let key = constructor.get_key(Some(&view), Some("list"), Some(&request), &[], &kwargs)?;
/// ```
#[derive(Debug)]
pub struct KeyConstructor {
    bits: Vec<(String, Box<dyn KeyBit>)>,
    params: HashMap<String, Option<Params>>,
    memoize_for_request: bool,
    settings: KeyBitSettings,
    id: u64,
}

impl Default for KeyConstructor {
    fn default() -> Self {
        let settings = KeyBitSettings::default();
        Self {
            bits: Vec::new(),
            params: HashMap::new(),
            memoize_for_request: settings.memoize_for_request,
            settings,
            id: NEXT_CONSTRUCTOR_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl KeyConstructor {
    /// Create a constructor with no bits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bit under a name. Re-registering a name replaces the bit
    /// in place.
    pub fn bit(mut self, name: impl Into<String>, bit: impl KeyBit + 'static) -> Self {
        let name = name.into();
        let bit: Box<dyn KeyBit> = Box::new(bit);
        match self.bits.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = bit,
            None => self.bits.push((name, bit)),
        }
        self
    }

    /// Override the params of a named bit for this constructor.
    pub fn with_params(mut self, name: impl Into<String>, params: Params) -> Self {
        self.params.insert(name.into(), Some(params));
        self
    }

    /// Evaluate a named bit with no params.
    pub fn without_params(mut self, name: impl Into<String>) -> Self {
        self.params.insert(name.into(), None);
        self
    }

    /// Reuse the first key computed for a request on later calls.
    pub fn memoize_for_request(mut self, enabled: bool) -> Self {
        self.memoize_for_request = enabled;
        self
    }

    /// Replace the settings. Also resets memoization to the settings default.
    pub fn with_settings(mut self, settings: KeyBitSettings) -> Self {
        self.memoize_for_request = settings.memoize_for_request;
        self.settings = settings;
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &KeyBitSettings {
        &self.settings
    }

    /// Registered bit names, in order.
    pub fn bit_names(&self) -> impl Iterator<Item = &str> {
        self.bits.iter().map(|(name, _)| name.as_str())
    }

    /// Params a named bit is evaluated with.
    fn params_for<'s>(&'s self, name: &str, bit: &'s dyn KeyBit) -> Option<&'s Params> {
        match self.params.get(name) {
            Some(params) => params.as_ref(),
            None => bit.params(),
        }
    }

    /// An empty context carrying this constructor's settings.
    pub fn context(&self) -> KeyContext<'_> {
        KeyContext::new(&self.settings)
    }

    /// Evaluate every bit. Bits with nothing to contribute are left out.
    pub fn get_data_from_bits(&self, ctx: &KeyContext<'_>) -> KeyBitResult<KeyData> {
        let mut data = KeyData::new();
        for (name, bit) in &self.bits {
            let params = self.params_for(name, bit.as_ref());
            match bit.get_data(params, ctx)? {
                Some(fragment) => {
                    trace!(bit = %name, fragment = ?fragment, "evaluated key bit");
                    data.insert(name.as_str(), fragment);
                }
                None => trace!(bit = %name, "key bit omitted"),
            }
        }
        Ok(data)
    }

    /// Digest key data into the key string.
    pub fn prepare_key(&self, data: &KeyData) -> KeyBitResult<String> {
        key::prepare_key(data)
    }

    /// Compute the key for one view invocation.
    pub fn get_key(
        &self,
        view: Option<&dyn View>,
        method: Option<&str>,
        request: Option<&dyn Request>,
        args: &[String],
        kwargs: &Kwargs,
    ) -> KeyBitResult<CacheKey> {
        let mut ctx = self.context().with_args(args).with_kwargs(kwargs);
        ctx.view = view;
        ctx.method = method;
        ctx.request = request;
        self.key_for_context(&ctx)
    }

    /// Compute the key for a prepared context.
    pub fn key_for_context(&self, ctx: &KeyContext<'_>) -> KeyBitResult<CacheKey> {
        let memo = if self.memoize_for_request {
            ctx.request.and_then(|request| request.key_memo())
        } else {
            None
        };
        let memo_id = match memo {
            Some(_) => Some(self.memo_id(ctx)?),
            None => None,
        };

        if let (Some(memo), Some(memo_id)) = (memo, memo_id.as_deref()) {
            if let Some(memoized) = memo.get(memo_id) {
                trace!(key = %memoized.key, "memoized cache key");
                return Ok(CacheKey::with_components(memoized.key, memoized.components));
            }
        }

        let data = self.get_data_from_bits(ctx)?;
        let key = self.prepare_key(&data)?;
        let components = data
            .iter()
            .map(|(name, fragment)| {
                Ok(format!("{}={}", name, serde_json::to_string(fragment)?))
            })
            .collect::<KeyBitResult<Vec<_>>>()?;

        if let (Some(memo), Some(memo_id)) = (memo, memo_id) {
            memo.insert(memo_id, key.clone(), components.clone());
        }

        debug!(key = %key, bits = data.len(), "built cache key");
        Ok(CacheKey::with_components(key, components))
    }

    /// Memo slot of this constructor for one invocation within a request.
    fn memo_id(&self, ctx: &KeyContext<'_>) -> KeyBitResult<String> {
        let method_id = match (ctx.view, ctx.method) {
            (Some(view), Some(method)) => format!("{}.{}", view.type_path().dotted(), method),
            _ => String::new(),
        };
        let slot = serde_json::json!({
            "constructor": self.id,
            "unique_method_id": method_id,
            "args": ctx.args,
            "kwargs": ctx.kwargs,
        });
        Ok(serde_json::to_string(&slot)?)
    }

    /// View method, format and language.
    pub fn default_key() -> Self {
        Self::new()
            .bit("unique_method_id", UniqueMethodIdKeyBit)
            .bit("format", FormatKeyBit)
            .bit("language", LanguageKeyBit)
    }

    /// Default key plus the single-object query.
    pub fn default_object() -> Self {
        Self::default_key().bit("retrieve_sql_query", RetrieveSqlQueryKeyBit)
    }

    /// Default key plus the list query and pagination.
    pub fn default_list() -> Self {
        Self::default_key()
            .bit("list_sql_query", ListSqlQueryKeyBit)
            .bit("pagination", PaginationKeyBit::new())
    }

    /// View method, format and the contents of the retrieved object.
    pub fn default_model_instance() -> Self {
        Self::new()
            .bit("unique_method_id", UniqueMethodIdKeyBit)
            .bit("format", FormatKeyBit)
            .bit("instance", RetrieveModelKeyBit)
    }

    /// View method, format, the listed contents and pagination.
    pub fn default_model_list() -> Self {
        Self::new()
            .bit("unique_method_id", UniqueMethodIdKeyBit)
            .bit("format", FormatKeyBit)
            .bit("list", ListModelKeyBit)
            .bit("pagination", PaginationKeyBit::new())
    }
}
