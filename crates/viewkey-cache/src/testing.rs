//! Test fixtures: a widget table and a view over it.

use viewkey_core::{
    FieldKind, Kwargs, MemoryTable, PageParams, Paginator, QueryError, QuerySet, TypePath, View,
};

pub(crate) fn widget_table() -> MemoryTable {
    let table = MemoryTable::new(TypePath::new("app.models", "Widget"), "app_widget")
        .with_field("id", FieldKind::Integer)
        .with_field("active", FieldKind::Bool);
    table.insert(vec![1.into(), true.into()]).unwrap();
    table.insert(vec![2.into(), true.into()]).unwrap();
    table.insert(vec![3.into(), false.into()]).unwrap();
    table
}

#[derive(Debug, Clone)]
pub(crate) struct WidgetView {
    pub table: MemoryTable,
    pub kwargs: Kwargs,
    pub paginator: Option<PageParams>,
    pub lookup_field: String,
    pub empty: bool,
    pub unsatisfiable: bool,
}

impl WidgetView {
    pub fn with_kwarg(mut self, name: &str, value: &str) -> Self {
        self.kwargs.insert(name.to_string(), value.to_string());
        self
    }
}

pub(crate) fn widget_view() -> WidgetView {
    WidgetView {
        table: widget_table(),
        kwargs: Kwargs::new(),
        paginator: None,
        lookup_field: "id".to_string(),
        empty: false,
        unsatisfiable: false,
    }
}

impl View for WidgetView {
    fn type_path(&self) -> TypePath {
        TypePath::new("app.views", "WidgetViewSet")
    }

    fn get_queryset(&self) -> Result<Box<dyn QuerySet>, QueryError> {
        Ok(if self.empty {
            self.table.none().boxed()
        } else {
            self.table.all().boxed()
        })
    }

    fn filter_queryset(
        &self,
        queryset: Box<dyn QuerySet>,
    ) -> Result<Box<dyn QuerySet>, QueryError> {
        if self.unsatisfiable {
            Ok(self.table.all().filter_in("id", &[])?.boxed())
        } else {
            Ok(queryset)
        }
    }

    fn lookup_field(&self) -> &str {
        &self.lookup_field
    }

    fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    fn paginator(&self) -> Option<&dyn Paginator> {
        self.paginator.as_ref().map(|p| p as &dyn Paginator)
    }
}
