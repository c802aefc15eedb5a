//! In-memory table and queryset.
//!
//! Useful for hosts without a relational store and for exercising key bits
//! against live data: rows written through a `MemoryTable` handle are seen by
//! every queryset created from it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::context::TypePath;
use crate::error::QueryError;
use crate::queryset::{Field, FieldKind, QuerySet};
use crate::value::{Row, Value};

/// Filter condition on a single field.
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Condition {
    fn field(&self) -> &str {
        match self {
            Self::Eq(field, _) | Self::In(field, _) => field,
        }
    }

    fn to_sql(&self, table: &str) -> String {
        match self {
            Self::Eq(field, Value::Null) => format!("\"{}\".\"{}\" IS NULL", table, field),
            Self::Eq(field, value) => {
                format!("\"{}\".\"{}\" = {}", table, field, value.to_sql_literal())
            }
            Self::In(field, values) => {
                let literals: Vec<String> = values.iter().map(Value::to_sql_literal).collect();
                format!("\"{}\".\"{}\" IN ({})", table, field, literals.join(", "))
            }
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Eq(_, expected) => value == expected,
            Self::In(_, expected) => expected.contains(value),
        }
    }
}

/// Shared in-memory table for one model.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    model: TypePath,
    table: String,
    fields: Vec<Field>,
    rows: Arc<RwLock<Vec<Vec<Value>>>>,
}

impl MemoryTable {
    /// Create an empty table with no fields.
    pub fn new(model: TypePath, table: impl Into<String>) -> Self {
        Self {
            model,
            table: table.into(),
            fields: Vec::new(),
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(Field::new(name, kind));
        self
    }

    /// Get the fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Get the model.
    pub fn model(&self) -> &TypePath {
        &self.model
    }

    /// Insert a row; values follow field order.
    pub fn insert(&self, values: Vec<Value>) -> Result<(), QueryError> {
        if values.len() != self.fields.len() {
            return Err(QueryError::Backend(format!(
                "expected {} values for {}, got {}",
                self.fields.len(),
                self.table,
                values.len()
            )));
        }
        self.write()?.push(values);
        Ok(())
    }

    /// Set `column` to `value` on every row where `field` equals `key`.
    ///
    /// Returns the number of updated rows.
    pub fn update(
        &self,
        field: &str,
        key: impl Into<Value>,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<usize, QueryError> {
        let key_index = self.field_index(field)?;
        let column_index = self.field_index(column)?;
        let key = key.into();
        let value = value.into();

        let mut rows = self.write()?;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|row| row[key_index] == key) {
            row[column_index] = value.clone();
            updated += 1;
        }
        Ok(updated)
    }

    /// Delete every row where `field` equals `key`.
    pub fn delete(&self, field: &str, key: impl Into<Value>) -> Result<usize, QueryError> {
        let index = self.field_index(field)?;
        let key = key.into();

        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|row| row[index] != key);
        Ok(before - rows.len())
    }

    /// Queryset over all rows.
    pub fn all(&self) -> MemoryQuerySet {
        MemoryQuerySet {
            table: self.clone(),
            conditions: Vec::new(),
            none: false,
        }
    }

    /// Queryset that is empty by construction.
    pub fn none(&self) -> MemoryQuerySet {
        MemoryQuerySet {
            table: self.clone(),
            conditions: Vec::new(),
            none: true,
        }
    }

    fn field(&self, name: &str) -> Result<&Field, QueryError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| QueryError::UnknownField(name.to_string()))
    }

    fn field_index(&self, name: &str) -> Result<usize, QueryError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| QueryError::UnknownField(name.to_string()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Vec<Value>>>, QueryError> {
        self.rows
            .read()
            .map_err(|_| QueryError::Backend(format!("table {} lock poisoned", self.table)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Vec<Value>>>, QueryError> {
        self.rows
            .write()
            .map_err(|_| QueryError::Backend(format!("table {} lock poisoned", self.table)))
    }
}

/// Queryset over a `MemoryTable`.
#[derive(Debug, Clone)]
pub struct MemoryQuerySet {
    table: MemoryTable,
    conditions: Vec<Condition>,
    none: bool,
}

impl MemoryQuerySet {
    /// Restrict to rows where `field` equals the coerced value.
    pub fn filter_eq(&self, field: &str, raw: &str) -> Result<Self, QueryError> {
        let value = self.table.field(field)?.kind.coerce(field, raw)?;
        Ok(self.with_condition(Condition::Eq(field.to_string(), value)))
    }

    /// Restrict to rows where `field` is one of the coerced values.
    ///
    /// An empty value list produces a query that cannot match any row.
    pub fn filter_in(&self, field: &str, raws: &[&str]) -> Result<Self, QueryError> {
        let kind = self.table.field(field)?.kind;
        let values = raws
            .iter()
            .map(|raw| kind.coerce(field, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_condition(Condition::In(field.to_string(), values)))
    }

    /// Box the queryset for use behind `dyn QuerySet`.
    pub fn boxed(self) -> Box<dyn QuerySet> {
        Box::new(self)
    }

    fn with_condition(&self, condition: Condition) -> Self {
        let mut next = self.clone();
        next.conditions.push(condition);
        next
    }

    fn cannot_match(&self) -> bool {
        self.none
            || self
                .conditions
                .iter()
                .any(|c| matches!(c, Condition::In(_, values) if values.is_empty()))
    }

    fn matching_rows(&self) -> Result<Vec<Vec<Value>>, QueryError> {
        if self.cannot_match() {
            return Ok(Vec::new());
        }

        let indexed = self
            .conditions
            .iter()
            .map(|c| Ok((self.table.field_index(c.field())?, c)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        let rows = self.table.read()?;
        Ok(rows
            .iter()
            .filter(|row| indexed.iter().all(|(i, c)| c.matches(&row[*i])))
            .cloned()
            .collect())
    }
}

impl QuerySet for MemoryQuerySet {
    fn model(&self) -> &TypePath {
        &self.table.model
    }

    fn is_none(&self) -> bool {
        self.none
    }

    fn filter(&self, field: &str, raw: &str) -> Result<Box<dyn QuerySet>, QueryError> {
        self.filter_eq(field, raw).map(MemoryQuerySet::boxed)
    }

    fn query_text(&self) -> Result<String, QueryError> {
        if self.cannot_match() {
            return Err(QueryError::EmptyResultSet);
        }

        let table = &self.table.table;
        let columns: Vec<String> = self
            .table
            .fields
            .iter()
            .map(|f| format!("\"{}\".\"{}\"", table, f.name))
            .collect();

        let mut sql = format!("SELECT {} FROM \"{}\"", columns.join(", "), table);

        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self.conditions.iter().map(|c| c.to_sql(table)).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        Ok(sql)
    }

    fn count(&self) -> Result<usize, QueryError> {
        Ok(self.matching_rows()?.len())
    }

    fn values_list(&self) -> Result<Vec<Row>, QueryError> {
        let columns: Vec<String> = self.table.fields.iter().map(|f| f.name.clone()).collect();
        Ok(self
            .matching_rows()?
            .into_iter()
            .map(|values| Row::new(columns.clone(), values))
            .collect())
    }
}
