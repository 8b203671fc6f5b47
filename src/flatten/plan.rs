//! Schema-derived flattening plans
//!
//! The plan is computed once from the schema, so applying it to a record
//! makes no decisions beyond copying values into place.

use super::types::{FlatRow, RecordTransform};
use crate::error::{Error, Result};
use crate::schema::{order_event_schema, FieldValue, InputRecord, PRODUCTS_FIELD};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use std::collections::HashSet;
use std::iter;
use std::sync::Arc;

/// Pre-computed mapping from a nested schema to flat columns
///
/// Output columns are, in order: top-level scalar fields, the children of
/// each top-level struct, then the children of the exploded list's element
/// struct.
#[derive(Debug, Clone)]
pub struct FlattenPlan {
    input_schema: SchemaRef,
    output_schema: SchemaRef,
    /// Positions of top-level scalar fields
    scalar_fields: Vec<usize>,
    /// Positions and widths of top-level struct fields
    struct_fields: Vec<(usize, usize)>,
    /// Position of the exploded list field
    explode_field: usize,
    /// Number of columns contributed by each list element
    element_width: usize,
}

impl FlattenPlan {
    /// Build a plan that explodes `explode_field` into one row per element
    pub fn new(input_schema: SchemaRef, explode_field: &str) -> Result<Self> {
        let mut scalar_columns: Vec<FieldRef> = Vec::new();
        let mut struct_columns: Vec<FieldRef> = Vec::new();
        let mut scalar_fields = Vec::new();
        let mut struct_fields = Vec::new();
        let mut explode = None;

        for (index, field) in input_schema.fields().iter().enumerate() {
            match field.data_type() {
                DataType::List(item) if field.name() == explode_field => {
                    let DataType::Struct(children) = item.data_type() else {
                        return Err(Error::invalid_schema(format!(
                            "exploded field '{explode_field}' must be a list of structs"
                        )));
                    };
                    ensure_scalar_children(field, children.iter())?;
                    explode = Some((index, children.iter().cloned().collect::<Vec<_>>()));
                }
                DataType::List(_) => {
                    return Err(Error::invalid_schema(format!(
                        "list field '{}' cannot be flattened, only '{explode_field}' is exploded",
                        field.name()
                    )));
                }
                DataType::Struct(children) => {
                    ensure_scalar_children(field, children.iter())?;
                    struct_fields.push((index, children.len()));
                    struct_columns.extend(children.iter().map(as_nullable));
                }
                _ => {
                    scalar_fields.push(index);
                    scalar_columns.push(field.clone());
                }
            }
        }

        let Some((explode_field_index, element_columns)) = explode else {
            return Err(Error::invalid_schema(format!(
                "schema has no list field named '{explode_field}'"
            )));
        };

        let element_width = element_columns.len();
        let columns: Vec<FieldRef> = scalar_columns
            .into_iter()
            .chain(struct_columns)
            .chain(element_columns.iter().map(as_nullable))
            .collect();

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name().as_str()) {
                return Err(Error::invalid_schema(format!(
                    "flattened column '{}' appears more than once",
                    column.name()
                )));
            }
        }

        Ok(Self {
            input_schema,
            output_schema: Arc::new(Schema::new(columns)),
            scalar_fields,
            struct_fields,
            explode_field: explode_field_index,
            element_width,
        })
    }

    /// Plan for the built-in order event schema, exploding `products`
    pub fn for_orders() -> Result<Self> {
        Self::new(order_event_schema(), PRODUCTS_FIELD)
    }

    /// Schema of the nested input records
    pub fn input_schema(&self) -> &SchemaRef {
        &self.input_schema
    }

    /// Schema of the flat output rows
    pub fn output_schema(&self) -> &SchemaRef {
        &self.output_schema
    }

    /// Check whether a record was validated against this plan's input schema
    pub fn accepts(&self, record: &InputRecord) -> bool {
        Arc::ptr_eq(record.schema(), &self.input_schema)
            || record.schema().fields() == self.input_schema.fields()
    }

    /// Flatten one record
    ///
    /// Emits one row per element of the exploded list, in list order. An
    /// empty or null list emits nothing. A null element yields a row whose
    /// element columns are all null. A record the plan does not accept
    /// (see [`FlattenPlan::accepts`]) emits nothing.
    pub fn apply(&self, record: &InputRecord) -> Vec<FlatRow> {
        if !self.accepts(record) {
            return Vec::new();
        }
        let Some(FieldValue::List(elements)) = record.value(self.explode_field) else {
            return Vec::new();
        };
        if elements.is_empty() {
            return Vec::new();
        }

        let width = self.output_schema.fields().len();
        let mut prefix = Vec::with_capacity(width);

        prefix.extend(
            self.scalar_fields
                .iter()
                .map(|&i| record.value(i).cloned().unwrap_or(FieldValue::Null)),
        );
        for &(index, struct_width) in &self.struct_fields {
            match record.value(index) {
                Some(FieldValue::Struct(children)) => prefix.extend(children.iter().cloned()),
                _ => prefix.extend(iter::repeat(FieldValue::Null).take(struct_width)),
            }
        }

        elements
            .iter()
            .map(|element| {
                let mut row = Vec::with_capacity(width);
                row.extend(prefix.iter().cloned());
                match element {
                    FieldValue::Struct(children) => row.extend(children.iter().cloned()),
                    _ => row.extend(iter::repeat(FieldValue::Null).take(self.element_width)),
                }
                FlatRow::new(self.output_schema.clone(), row)
            })
            .collect()
    }
}

impl RecordTransform for FlattenPlan {
    fn output_schema(&self) -> SchemaRef {
        self.output_schema.clone()
    }

    fn check(&self, record: &InputRecord) -> Result<()> {
        if self.accepts(record) {
            Ok(())
        } else {
            Err(Error::invalid_schema(
                "record was validated against a different schema than the flatten plan",
            ))
        }
    }

    fn apply(&self, record: &InputRecord) -> Vec<FlatRow> {
        FlattenPlan::apply(self, record)
    }
}

fn ensure_scalar_children<'a>(
    parent: &Field,
    children: impl Iterator<Item = &'a FieldRef>,
) -> Result<()> {
    for child in children {
        if matches!(child.data_type(), DataType::Struct(_) | DataType::List(_)) {
            return Err(Error::invalid_schema(format!(
                "field '{}.{}' is nested more than one level deep",
                parent.name(),
                child.name()
            )));
        }
    }
    Ok(())
}

/// Flattened children are nullable, since their parent may be absent
fn as_nullable(field: &FieldRef) -> FieldRef {
    if field.is_nullable() {
        field.clone()
    } else {
        Arc::new(field.as_ref().clone().with_nullable(true))
    }
}
