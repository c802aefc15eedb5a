//! Request and view context seen by key bits.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;

use crate::error::QueryError;
use crate::queryset::QuerySet;

/// Raw request metadata (CGI-style names such as `HTTP_ACCEPT_LANGUAGE`).
pub type Meta = BTreeMap<String, String>;

/// Decoded query string parameters.
pub type QueryParams = BTreeMap<String, String>;

/// Keyword arguments captured by the router for one invocation.
pub type Kwargs = BTreeMap<String, String>;

/// Fully qualified name of a view or model type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePath {
    /// Defining module (e.g., "shop.models").
    pub module: String,
    /// Type name (e.g., "Product").
    pub name: String,
}

impl TypePath {
    /// Create a new type path.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Parse a dotted path; the last segment is the type name.
    pub fn parse(dotted: &str) -> Option<Self> {
        let (module, name) = dotted.rsplit_once('.')?;
        if module.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(module, name))
    }

    /// Get the dotted form, `module.Name`.
    pub fn dotted(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Identity attached to a request.
pub trait UserIdentity: Send + Sync {
    /// Whether the identity is authenticated.
    fn is_authenticated(&self) -> bool;

    /// Primary key of the user.
    fn pk(&self) -> String;
}

/// A request user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum User {
    /// Unauthenticated visitor.
    Anonymous,
    /// Authenticated user with a primary key.
    Authenticated {
        /// User primary key.
        id: String,
    },
}

impl User {
    /// Create an authenticated user.
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self::Authenticated { id: id.into() }
    }
}

impl UserIdentity for User {
    fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    fn pk(&self) -> String {
        match self {
            Self::Anonymous => String::new(),
            Self::Authenticated { id } => id.clone(),
        }
    }
}

/// Per-request storage for computed cache keys.
///
/// Lives as long as the request that owns it. Keys are stored with their
/// component descriptions under the memo id of the constructor that
/// computed them.
#[derive(Debug, Default)]
pub struct KeyMemo {
    keys: Mutex<HashMap<String, MemoizedKey>>,
}

/// A memoized key and its component descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoizedKey {
    /// The key string.
    pub key: String,
    /// Per-bit component descriptions.
    pub components: Vec<String>,
}

impl KeyMemo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a memoized key.
    pub fn get(&self, memo_id: &str) -> Option<MemoizedKey> {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(memo_id)
            .cloned()
    }

    /// Store a key with its components.
    pub fn insert(
        &self,
        memo_id: impl Into<String>,
        key: impl Into<String>,
        components: Vec<String>,
    ) {
        let entry = MemoizedKey {
            key: key.into(),
            components,
        };
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(memo_id.into(), entry);
    }

    /// Number of memoized keys.
    pub fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Check if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request facets consumed by key bits.
pub trait Request: Send + Sync {
    /// Negotiated response format (e.g., "json"), if a renderer was chosen.
    fn accepted_format(&self) -> Option<&str>;

    /// Identity attached to the request, if authentication ran.
    fn user(&self) -> Option<&dyn UserIdentity>;

    /// Raw request metadata.
    fn meta(&self) -> &Meta;

    /// Decoded query string parameters.
    fn query_params(&self) -> &QueryParams;

    /// Active locale for this request.
    fn language(&self) -> Option<&str> {
        None
    }

    /// Memo used by constructors that memoize keys per request.
    fn key_memo(&self) -> Option<&KeyMemo> {
        None
    }
}

/// Paginator capabilities relevant to cache keys.
pub trait Paginator: Send + Sync {
    /// Name of the page number query parameter, if supported.
    fn page_query_param(&self) -> Option<&str> {
        None
    }

    /// Name of the page size query parameter, if supported.
    fn page_size_query_param(&self) -> Option<&str> {
        None
    }
}

/// View facets consumed by key bits.
pub trait View: Send + Sync {
    /// Qualified name of the view type.
    fn type_path(&self) -> TypePath;

    /// Base queryset of the view.
    fn get_queryset(&self) -> Result<Box<dyn QuerySet>, QueryError>;

    /// Apply the view's filter backends.
    fn filter_queryset(
        &self,
        queryset: Box<dyn QuerySet>,
    ) -> Result<Box<dyn QuerySet>, QueryError> {
        Ok(queryset)
    }

    /// Field used to look up single objects.
    fn lookup_field(&self) -> &str {
        "pk"
    }

    /// Keyword arguments of the current invocation.
    fn kwargs(&self) -> &Kwargs;

    /// Paginator, if the view paginates.
    fn paginator(&self) -> Option<&dyn Paginator> {
        None
    }
}

/// Paginator configured with fixed parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    /// Page number parameter name.
    pub page: Option<String>,
    /// Page size parameter name.
    pub page_size: Option<String>,
}

impl PageParams {
    /// Paginator recognizing only a page number parameter.
    pub fn page(name: impl Into<String>) -> Self {
        Self {
            page: Some(name.into()),
            page_size: None,
        }
    }

    /// Also recognize a page size parameter.
    pub fn with_page_size(mut self, name: impl Into<String>) -> Self {
        self.page_size = Some(name.into());
        self
    }
}

impl Paginator for PageParams {
    fn page_query_param(&self) -> Option<&str> {
        self.page.as_deref()
    }

    fn page_size_query_param(&self) -> Option<&str> {
        self.page_size.as_deref()
    }
}

/// Typed request context.
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Negotiated response format.
    pub format: Option<String>,
    /// Request user.
    pub user: Option<User>,
    /// Raw request metadata.
    pub meta: Meta,
    /// Query string parameters.
    pub query: QueryParams,
    /// Active locale.
    pub language: Option<String>,
    /// Per-request key memo.
    pub memo: KeyMemo,
}

impl RequestContext {
    /// Create an empty request context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the negotiated format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the request user.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(name.into(), value.into());
        self
    }

    /// Add an HTTP header, stored under its metadata name.
    pub fn with_header(self, name: &str, value: impl Into<String>) -> Self {
        let meta_name = meta_header_name(name);
        self.with_meta(meta_name, value)
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Set the active locale.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Request for RequestContext {
    fn accepted_format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn user(&self) -> Option<&dyn UserIdentity> {
        self.user.as_ref().map(|u| u as &dyn UserIdentity)
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn query_params(&self) -> &QueryParams {
        &self.query
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn key_memo(&self) -> Option<&KeyMemo> {
        Some(&self.memo)
    }
}

/// Metadata name of an HTTP header: `Accept-Language` => `HTTP_ACCEPT_LANGUAGE`.
pub fn meta_header_name(header: &str) -> String {
    format!("HTTP_{}", header.to_uppercase().replace('-', "_"))
}
