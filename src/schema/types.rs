//! Schema types
//!
//! Validated values and records, aligned positionally with an Arrow schema.

use arrow::datatypes::{DataType, SchemaRef};
use serde_json::Value;

/// A value that has been checked against its declared field type
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent or JSON null
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    /// Child values in the order of the struct's declared fields
    Struct(Vec<FieldValue>),
    /// Elements in their original order
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if this value is a leaf (not a struct or list)
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::Struct(_) | FieldValue::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// One event that passed schema validation
///
/// `values[i]` always holds the value of `schema.field(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    schema: SchemaRef,
    values: Vec<FieldValue>,
}

impl InputRecord {
    pub(crate) fn new(schema: SchemaRef, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(schema.fields().len(), values.len());
        Self { schema, values }
    }

    /// The schema this record was validated against
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Values in declared field order
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Value at a field position
    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    /// Look up a top-level field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let (index, _) = self.schema.column_with_name(name)?;
        self.values.get(index)
    }
}

/// Short lowercase type name used in messages and `schema` output
pub fn type_name(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Utf8 => "string",
        DataType::Int64 => "int64",
        DataType::Float64 => "float64",
        DataType::Boolean => "boolean",
        DataType::Struct(_) => "struct",
        DataType::List(_) => "list",
        _ => "unsupported",
    }
}

/// JSON type name of a value, for violation messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "fractional number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
