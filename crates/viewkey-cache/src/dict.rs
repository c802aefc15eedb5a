//! Bits selecting entries from dict-like sources.

use std::collections::BTreeMap;

use viewkey_core::meta_header_name;

use crate::bit::{dict_key_bit, DictKeyBit, KeyBit, KeyContext};
use crate::error::KeyBitResult;
use crate::fragment::Fragment;
use crate::params::Params;

/// Selected request headers.
///
/// Return example: `{"accept-language": "ru", "x-geobase-id": "123"}`.
#[derive(Debug, Clone, Default)]
pub struct HeadersKeyBit {
    params: Option<Params>,
}

impl HeadersKeyBit {
    /// Select these headers (e.g., `["Accept-Language"]`).
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: Some(Params::keys(headers)),
        }
    }

    /// Replace the configured params.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

impl DictKeyBit for HeadersKeyBit {
    fn source_dict<'c>(&self, ctx: &KeyContext<'c>) -> Option<&'c BTreeMap<String, String>> {
        ctx.request.map(|request| request.meta())
    }

    // Accept-Language => HTTP_ACCEPT_LANGUAGE
    fn key_for_retrieval(&self, key: &str) -> String {
        meta_header_name(key)
    }

    // Accept-Language => accept-language
    fn key_for_assignment(&self, key: &str) -> String {
        key.to_lowercase()
    }
}

/// Selected raw request metadata.
///
/// Return example: `{"REMOTE_ADDR": "127.0.0.2", "REMOTE_HOST": "example.com"}`.
#[derive(Debug, Clone, Default)]
pub struct RequestMetaKeyBit {
    params: Option<Params>,
}

impl RequestMetaKeyBit {
    /// Select these metadata entries.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: Some(Params::keys(names)),
        }
    }

    /// Replace the configured params.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

impl DictKeyBit for RequestMetaKeyBit {
    fn source_dict<'c>(&self, ctx: &KeyContext<'c>) -> Option<&'c BTreeMap<String, String>> {
        ctx.request.map(|request| request.meta())
    }
}

/// Query string parameters; all of them unless configured otherwise.
///
/// Return example: `{"part": "Londo", "callback": "jquery_callback"}`.
#[derive(Debug, Clone)]
pub struct QueryParamsKeyBit {
    params: Option<Params>,
}

impl Default for QueryParamsKeyBit {
    fn default() -> Self {
        Self {
            params: Some(Params::All),
        }
    }
}

impl QueryParamsKeyBit {
    /// Select every query parameter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select only these query parameters.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: Some(Params::keys(names)),
        }
    }

    /// Replace the configured params.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

impl DictKeyBit for QueryParamsKeyBit {
    fn source_dict<'c>(&self, ctx: &KeyContext<'c>) -> Option<&'c BTreeMap<String, String>> {
        ctx.request.map(|request| request.query_params())
    }
}

/// Query parameters recognized by the view's paginator.
///
/// Configured params are ignored; the selection is rediscovered from the
/// paginator on every call.
///
/// Return example: `{"page": "1", "page_size": "100"}`.
#[derive(Debug, Clone, Default)]
pub struct PaginationKeyBit {
    query_params: QueryParamsKeyBit,
}

impl PaginationKeyBit {
    /// Select the page parameters of the view paginator.
    pub fn new() -> Self {
        Self::default()
    }

    fn paginator_params(ctx: &KeyContext<'_>) -> Params {
        let mut names = Vec::new();
        if let Some(paginator) = ctx.view.and_then(|view| view.paginator()) {
            if let Some(page) = paginator.page_query_param() {
                names.push(page.to_string());
            }
            if let Some(page_size) = paginator.page_size_query_param() {
                names.push(page_size.to_string());
            }
        }
        Params::Keys(names)
    }
}

impl KeyBit for PaginationKeyBit {
    fn params(&self) -> Option<&Params> {
        self.query_params.params.as_ref()
    }

    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let params = Self::paginator_params(ctx);
        self.query_params.dict_data(Some(&params), ctx)
    }
}

/// Keyword arguments of the invocation; all of them unless configured otherwise.
#[derive(Debug, Clone)]
pub struct KwargsKeyBit {
    params: Option<Params>,
}

impl Default for KwargsKeyBit {
    fn default() -> Self {
        Self {
            params: Some(Params::All),
        }
    }
}

impl KwargsKeyBit {
    /// Select every keyword argument.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select only these keyword arguments.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: Some(Params::keys(names)),
        }
    }
}

impl DictKeyBit for KwargsKeyBit {
    fn source_dict<'c>(&self, ctx: &KeyContext<'c>) -> Option<&'c BTreeMap<String, String>> {
        Some(ctx.kwargs)
    }
}

dict_key_bit!(HeadersKeyBit, RequestMetaKeyBit, QueryParamsKeyBit, KwargsKeyBit);
