//! Key constructor tests against a product catalogue view.

use viewkey_cache::{
    ArgsKeyBit, HeadersKeyBit, KeyBit, KeyConstructor, KwargsKeyBit, ModelNameKeyBit, Params,
    QueryParamsKeyBit, UserKeyBit,
};
use viewkey_core::{
    FieldKind, KeyBitSettings, KeyMemo, Kwargs, MemoryTable, Meta, PageParams, Paginator,
    QueryError, QueryParams, QuerySet, Request, RequestContext, TypePath, User, UserIdentity,
    View,
};

fn product_table() -> MemoryTable {
    let table = MemoryTable::new(TypePath::new("shop.models", "Product"), "shop_product")
        .with_field("id", FieldKind::Integer)
        .with_field("name", FieldKind::Text)
        .with_field("published", FieldKind::Bool);
    table.insert(vec![1.into(), "kettle".into(), true.into()]).unwrap();
    table.insert(vec![2.into(), "toaster".into(), true.into()]).unwrap();
    table.insert(vec![3.into(), "blender".into(), false.into()]).unwrap();
    table
}

struct ProductView {
    table: MemoryTable,
    kwargs: Kwargs,
    published_only: bool,
    paginator: PageParams,
}

impl ProductView {
    fn new(table: MemoryTable) -> Self {
        Self {
            table,
            kwargs: Kwargs::new(),
            published_only: false,
            paginator: PageParams::page("page").with_page_size("page_size"),
        }
    }

    fn with_id(mut self, id: &str) -> Self {
        self.kwargs.insert("id".to_string(), id.to_string());
        self
    }
}

impl View for ProductView {
    fn type_path(&self) -> TypePath {
        TypePath::new("shop.views", "ProductViewSet")
    }

    fn get_queryset(&self) -> Result<Box<dyn QuerySet>, QueryError> {
        Ok(self.table.all().boxed())
    }

    fn filter_queryset(
        &self,
        queryset: Box<dyn QuerySet>,
    ) -> Result<Box<dyn QuerySet>, QueryError> {
        if self.published_only {
            queryset.filter("published", "true")
        } else {
            Ok(queryset)
        }
    }

    fn lookup_field(&self) -> &str {
        "id"
    }

    fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    fn paginator(&self) -> Option<&dyn Paginator> {
        Some(&self.paginator)
    }
}

/// A host request that keeps no memo.
struct BareRequest {
    meta: Meta,
    query: QueryParams,
    user: User,
}

impl Request for BareRequest {
    fn accepted_format(&self) -> Option<&str> {
        Some("json")
    }

    fn user(&self) -> Option<&dyn UserIdentity> {
        Some(&self.user)
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn query_params(&self) -> &QueryParams {
        &self.query
    }
}

#[test]
fn test_list_key_follows_filters() {
    let constructor = KeyConstructor::default_list();
    let mut view = ProductView::new(product_table());
    let request = RequestContext::new().with_format("json");
    let kwargs = Kwargs::new();

    let all = constructor
        .get_key(Some(&view), Some("list"), Some(&request), &[], &kwargs)
        .unwrap();
    view.published_only = true;
    let published = constructor
        .get_key(Some(&view), Some("list"), Some(&request), &[], &kwargs)
        .unwrap();

    assert_ne!(all.as_str(), published.as_str());
    assert!(published
        .components()
        .iter()
        .any(|c| c.starts_with("list_sql_query=") && c.contains("\\\"published\\\" = 1")));
}

#[test]
fn test_list_key_ignores_unrelated_query_params() {
    let constructor = KeyConstructor::default_list();
    let view = ProductView::new(product_table());
    let kwargs = Kwargs::new();
    let page = RequestContext::new().with_format("json").with_query("page", "2");
    let tracked = RequestContext::new()
        .with_format("json")
        .with_query("page", "2")
        .with_query("utm_source", "mail");

    let a = constructor.get_key(Some(&view), Some("list"), Some(&page), &[], &kwargs).unwrap();
    let b = constructor.get_key(Some(&view), Some("list"), Some(&tracked), &[], &kwargs).unwrap();
    assert_eq!(a.as_str(), b.as_str());
}

#[test]
fn test_instance_key_tracks_object_changes() {
    let constructor = KeyConstructor::default_model_instance();
    let table = product_table();
    let view = ProductView::new(table.clone()).with_id("2");
    let request = RequestContext::new().with_format("json");
    let kwargs = Kwargs::new();

    let before = constructor
        .get_key(Some(&view), Some("retrieve"), Some(&request), &[], &kwargs)
        .unwrap();

    table.update("id", 1, "name", "electric kettle").unwrap();
    let unrelated = constructor
        .get_key(Some(&view), Some("retrieve"), Some(&request), &[], &kwargs)
        .unwrap();
    assert_eq!(before.as_str(), unrelated.as_str());

    table.update("id", 2, "name", "4-slot toaster").unwrap();
    let changed = constructor
        .get_key(Some(&view), Some("retrieve"), Some(&request), &[], &kwargs)
        .unwrap();
    assert_ne!(before.as_str(), changed.as_str());
}

#[test]
fn test_missing_object_leaves_instance_out() {
    let constructor = KeyConstructor::default_model_instance();
    let view = ProductView::new(product_table()).with_id("99");
    let request = RequestContext::new().with_format("json");
    let key = constructor
        .get_key(Some(&view), Some("retrieve"), Some(&request), &[], &Kwargs::new())
        .unwrap();
    assert_eq!(
        key.components(),
        &[
            "unique_method_id=\"shop.views.ProductViewSet.retrieve\"".to_string(),
            "format=\"json\"".to_string(),
        ]
    );
}

#[test]
fn test_per_user_key() {
    let constructor = KeyConstructor::default_key()
        .bit("headers", HeadersKeyBit::new(["Accept-Language"]))
        .bit("user", UserKeyBit::new());
    let view = ProductView::new(product_table());
    let kwargs = Kwargs::new();

    let request = |user: User| BareRequest {
        meta: [("HTTP_ACCEPT_LANGUAGE".to_string(), "ru".to_string())].into_iter().collect(),
        query: QueryParams::new(),
        user,
    };

    let anonymous = request(User::Anonymous);
    let alice = request(User::authenticated("10"));
    let bob = request(User::authenticated("11"));

    let key = |r: &BareRequest| {
        constructor
            .get_key(Some(&view), Some("list"), Some(r), &[], &kwargs)
            .unwrap()
    };

    let anonymous_key = key(&anonymous);
    assert!(anonymous_key.components().contains(&"user=\"anonymous\"".to_string()));
    assert!(anonymous_key
        .components()
        .contains(&"headers={\"accept-language\":\"ru\"}".to_string()));
    assert_ne!(anonymous_key.as_str(), key(&alice).as_str());
    assert_ne!(key(&alice).as_str(), key(&bob).as_str());
}

#[test]
fn test_memoization_needs_request_memo() {
    let constructor = KeyConstructor::default_key().memoize_for_request(true);
    let bare = BareRequest {
        meta: Meta::new(),
        query: QueryParams::new(),
        user: User::Anonymous,
    };
    assert!(bare.key_memo().is_none());
    let key = constructor
        .get_key(None, Some("list"), Some(&bare), &[], &Kwargs::new())
        .unwrap();
    assert_eq!(key.components().len(), 3);

    let request = RequestContext::new().with_format("json");
    let first = constructor
        .get_key(None, Some("list"), Some(&request), &[], &Kwargs::new())
        .unwrap();
    let memo: &KeyMemo = request.key_memo().unwrap();
    assert_eq!(memo.len(), 1);

    let again = constructor
        .get_key(None, Some("list"), Some(&request), &[], &Kwargs::new())
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(again.components().len(), 3);
}

#[test]
fn test_function_arguments() {
    let constructor = KeyConstructor::new()
        .bit("args", ArgsKeyBit::at([1]))
        .bit("kwargs", KwargsKeyBit::only(["region"]));
    let args = vec!["ignored".to_string(), "42".to_string()];
    let mut kwargs = Kwargs::new();
    kwargs.insert("region".to_string(), "eu".to_string());
    kwargs.insert("trace".to_string(), "abc".to_string());

    let key = constructor.get_key(None, None, None, &args, &kwargs).unwrap();
    assert_eq!(
        key.components(),
        &["args=[\"42\"]".to_string(), "kwargs={\"region\":\"eu\"}".to_string()]
    );
}

#[test]
fn test_invalidation_keys_without_request() {
    let constructor = KeyConstructor::new()
        .bit("model", ModelNameKeyBit::new())
        .with_params("model", Params::model(TypePath::new("shop.models", "Product")))
        .bit("query", QueryParamsKeyBit::new());

    let data = constructor.get_data_from_bits(&constructor.context()).unwrap();
    assert_eq!(data.get("model").and_then(|f| f.as_text()), Some("shop.models.Product"));
    assert_eq!(data.get("query").and_then(|f| f.as_text()), Some("_any_"));
}

#[test]
fn test_custom_any_value() {
    let settings = KeyBitSettings::from_toml("default_cache_any_value = \"*\"").unwrap();
    let constructor = KeyConstructor::default_key().with_settings(settings);
    let key = constructor.get_key(None, None, None, &[], &Kwargs::new()).unwrap();
    assert_eq!(
        key.components(),
        &[
            "unique_method_id=\"*\"".to_string(),
            "format=\"*\"".to_string(),
            "language=\"en-us\"".to_string(),
        ]
    );
}

#[test]
fn test_bits_are_shareable() {
    fn assert_shareable<T: KeyBit + Clone + 'static>(_: &T) {}
    assert_shareable(&HeadersKeyBit::new(["Accept"]));
    assert_shareable(&UserKeyBit::new());

    let constructor = std::sync::Arc::new(KeyConstructor::default_key());
    let handle = {
        let constructor = constructor.clone();
        std::thread::spawn(move || {
            constructor
                .get_key(None, Some("list"), None, &[], &Kwargs::new())
                .map(|key| key.to_string())
                .unwrap()
        })
    };
    let here = constructor
        .get_key(None, Some("list"), None, &[], &Kwargs::new())
        .unwrap();
    assert_eq!(handle.join().unwrap(), here.to_string());
}
