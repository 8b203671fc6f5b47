//! Flat rows to Arrow RecordBatches
//!
//! Builds one typed Arrow column per output field from the rows a
//! transform produced.

use crate::error::{Error, Result};
use crate::flatten::FlatRow;
use crate::schema::{type_name, FieldValue};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Convert flat rows into a RecordBatch with the given schema
///
/// Every row must carry one scalar value per schema field. An empty row
/// set yields an empty batch that still carries the schema.
pub fn rows_to_batch(schema: &SchemaRef, rows: &[FlatRow]) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(schema.clone()));
    }

    let width = schema.fields().len();
    if let Some(row) = rows.iter().find(|row| row.values().len() != width) {
        return Err(Error::output(format!(
            "Row has {} values but schema has {width} columns",
            row.values().len()
        )));
    }

    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| build_array(rows, index, field))
        .collect::<Result<Vec<ArrayRef>>>()?;

    RecordBatch::try_new(schema.clone(), columns).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Build an Arrow array from one column of the rows
fn build_array(rows: &[FlatRow], index: usize, field: &Field) -> Result<ArrayRef> {
    match field.data_type() {
        DataType::Utf8 => {
            let values = collect_column(rows, index, field, |v| v.as_str().map(str::to_owned))?;
            Ok(Arc::new(StringArray::from(values)))
        }
        DataType::Int64 => {
            let values = collect_column(rows, index, field, FieldValue::as_i64)?;
            Ok(Arc::new(Int64Array::from(values)))
        }
        DataType::Float64 => {
            let values = collect_column(rows, index, field, FieldValue::as_f64)?;
            Ok(Arc::new(Float64Array::from(values)))
        }
        DataType::Boolean => {
            let values = collect_column(rows, index, field, FieldValue::as_bool)?;
            Ok(Arc::new(BooleanArray::from(values)))
        }
        other => Err(Error::output(format!(
            "Column '{}' has non-scalar type {other}",
            field.name()
        ))),
    }
}

fn collect_column<T>(
    rows: &[FlatRow],
    index: usize,
    field: &Field,
    extract: impl Fn(&FieldValue) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    rows.iter()
        .map(|row| {
            let value = &row.values()[index];
            if value.is_null() {
                return Ok(None);
            }
            extract(value).map(Some).ok_or_else(|| {
                Error::output(format!(
                    "Column '{}' expects {} but got {value:?}",
                    field.name(),
                    type_name(field.data_type())
                ))
            })
        })
        .collect()
}
