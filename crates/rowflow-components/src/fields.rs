//! Field-level transforms over JSON object rows.
//!
//! Non-object rows pass through untouched, except in [`FieldFilter`] where
//! they never match.
use crate::str_arg;
use rowflow_core::{ClassRef, Component, Row, Transform};
use serde_json::Value;

/// Keeps rows whose `field` equals `value`; drops the rest.
///
/// Class form: `FieldFilter(field, value)`.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    field: String,
    value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("FieldFilter", |args: &[Value]| {
            let field = str_arg(args, 0, "field")?;
            Ok(Component::transform(FieldFilter::new(field, args[1].clone())))
        })
        .with_arity(2)
    }
}

impl Transform for FieldFilter {
    fn process(&mut self, row: Row) -> anyhow::Result<Option<Row>> {
        let keep = row.get(&self.field) == Some(&self.value);
        Ok(keep.then_some(row))
    }
}

/// Sets `field` to a constant.
///
/// Class form: `SetField(field, value)`.
#[derive(Debug, Clone)]
pub struct SetField {
    field: String,
    value: Value,
}

impl SetField {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("SetField", |args: &[Value]| {
            let field = str_arg(args, 0, "field")?;
            Ok(Component::transform(SetField::new(field, args[1].clone())))
        })
        .with_arity(2)
    }
}

impl Transform for SetField {
    fn process(&mut self, mut row: Row) -> anyhow::Result<Option<Row>> {
        if let Some(object) = row.as_object_mut() {
            object.insert(self.field.clone(), self.value.clone());
        }
        Ok(Some(row))
    }
}

/// Moves `from` to `to`. Rows without `from` are left as they are.
///
/// Class form: `RenameField(from, to)`.
#[derive(Debug, Clone)]
pub struct RenameField {
    from: String,
    to: String,
}

impl RenameField {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("RenameField", |args: &[Value]| {
            let from = str_arg(args, 0, "from")?;
            let to = str_arg(args, 1, "to")?;
            Ok(Component::transform(RenameField::new(from, to)))
        })
        .with_arity(2)
    }
}

impl Transform for RenameField {
    fn process(&mut self, mut row: Row) -> anyhow::Result<Option<Row>> {
        if let Some(object) = row.as_object_mut() {
            if let Some(value) = object.remove(&self.from) {
                object.insert(self.to.clone(), value);
            }
        }
        Ok(Some(row))
    }
}

/// Keeps only the listed fields.
///
/// Class form: `SelectFields(field, ...)`, at least one field.
#[derive(Debug, Clone)]
pub struct SelectFields {
    fields: Vec<String>,
}

impl SelectFields {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn class() -> ClassRef {
        ClassRef::new("SelectFields", |args: &[Value]| {
            let fields = (0..args.len())
                .map(|i| str_arg(args, i, "field").map(str::to_string))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(Component::transform(SelectFields::new(fields)))
        })
        .with_arity_range(1, None)
    }
}

impl Transform for SelectFields {
    fn process(&mut self, mut row: Row) -> anyhow::Result<Option<Row>> {
        if let Some(object) = row.as_object_mut() {
            object.retain(|key, _| self.fields.iter().any(|f| f == key));
        }
        Ok(Some(row))
    }
}
