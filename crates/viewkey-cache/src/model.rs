//! Bits derived from the view's model and queryset.
//!
//! The SQL bits render the compiled query text, so keys change when the
//! query shape changes. The model bits render the matching rows
//! themselves, so keys also change when the data behind an unchanged query
//! is modified.

use tracing::debug;
use viewkey_core::{render_rows, QueryError, QuerySet, TypePath, View};

use crate::bit::{KeyBit, KeyContext};
use crate::error::{KeyBitError, KeyBitResult};
use crate::fragment::Fragment;
use crate::params::Params;

/// Model behind the view, as `module.ModelName`.
///
/// A `Params::Model` override targets a model unrelated to any view, e.g.
/// when computing keys to invalidate after a model change.
#[derive(Debug, Clone, Default)]
pub struct ModelNameKeyBit {
    params: Option<Params>,
}

impl ModelNameKeyBit {
    /// Report the model of the view's queryset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always report this model.
    pub fn for_model(model: TypePath) -> Self {
        Self {
            params: Some(Params::Model(model)),
        }
    }
}

impl KeyBit for ModelNameKeyBit {
    fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    fn get_data(
        &self,
        params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        if let Some(Params::Model(model)) = params {
            return Ok(Some(Fragment::text(model.dotted())));
        }

        match ctx.view {
            Some(view) => Ok(Some(Fragment::text(view.get_queryset()?.model().dotted()))),
            None => Ok(Some(ctx.any_value())),
        }
    }
}

fn list_queryset(view: &dyn View) -> KeyBitResult<Box<dyn QuerySet>> {
    Ok(view.filter_queryset(view.get_queryset()?)?)
}

/// The listed queryset narrowed to the object named by the lookup kwarg.
///
/// `None` when the lookup value cannot be converted to the field type.
fn retrieve_queryset(view: &dyn View) -> KeyBitResult<Option<Box<dyn QuerySet>>> {
    let field = view.lookup_field();
    let value = view
        .kwargs()
        .get(field)
        .ok_or_else(|| KeyBitError::MissingLookupValue {
            field: field.to_string(),
        })?;

    match list_queryset(view)?.filter(field, value) {
        Ok(queryset) => Ok(Some(queryset)),
        Err(err @ QueryError::Coercion { .. }) => {
            debug!(error = %err, "malformed lookup value, omitting bit");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn query_string(queryset: &dyn QuerySet) -> KeyBitResult<Option<Fragment>> {
    if queryset.is_none() {
        return Ok(None);
    }
    match queryset.query_text() {
        Ok(sql) => Ok(Some(Fragment::Text(sql))),
        Err(QueryError::EmptyResultSet) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn query_values(queryset: &dyn QuerySet) -> KeyBitResult<Option<Fragment>> {
    if queryset.is_none() {
        return Ok(None);
    }
    let rows = match queryset.count() {
        Ok(0) => return Ok(None),
        Ok(_) => queryset.values_list(),
        Err(err) => Err(err),
    };
    match rows {
        Ok(rows) => Ok(Some(Fragment::Text(render_rows(&rows)))),
        Err(QueryError::EmptyResultSet) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Compiled query of the view's filtered queryset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSqlQueryKeyBit;

impl ListSqlQueryKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for ListSqlQueryKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(view) = ctx.view else {
            return Ok(Some(ctx.any_value()));
        };
        query_string(list_queryset(view)?.as_ref())
    }
}

/// Compiled query of the view's queryset narrowed to one object.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveSqlQueryKeyBit;

impl RetrieveSqlQueryKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for RetrieveSqlQueryKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(view) = ctx.view else {
            return Ok(Some(ctx.any_value()));
        };
        match retrieve_queryset(view)? {
            Some(queryset) => query_string(queryset.as_ref()),
            None => Ok(None),
        }
    }
}

/// Contents of the view's filtered queryset.
///
/// Return example: `"[(1, true), (2, true), (3, false)]"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListModelKeyBit;

impl ListModelKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for ListModelKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(view) = ctx.view else {
            return Ok(Some(ctx.any_value()));
        };
        query_values(list_queryset(view)?.as_ref())
    }
}

/// Contents of the object named by the lookup kwarg.
///
/// Return example: `"[(3, false)]"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveModelKeyBit;

impl RetrieveModelKeyBit {
    /// Create the bit.
    pub fn new() -> Self {
        Self
    }
}

impl KeyBit for RetrieveModelKeyBit {
    fn get_data(
        &self,
        _params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let Some(view) = ctx.view else {
            return Ok(Some(ctx.any_value()));
        };
        match retrieve_queryset(view)? {
            Some(queryset) => query_values(queryset.as_ref()),
            None => Ok(None),
        }
    }
}
