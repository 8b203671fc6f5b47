//! Record validation against a declared schema

use super::types::{json_type_name, type_name, FieldValue, InputRecord};
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, SchemaRef};
use serde_json::Value;

/// Validates raw JSON records against a fixed schema
///
/// Values are never coerced across incompatible JSON types. The one
/// widening allowed is an integer into a `float64` field.
#[derive(Debug, Clone)]
pub struct RecordValidator {
    schema: SchemaRef,
}

impl RecordValidator {
    /// Create a validator, rejecting schemas with unsupported field types
    pub fn new(schema: SchemaRef) -> Result<Self> {
        for field in schema.fields() {
            check_supported(field, field.name())?;
        }
        Ok(Self { schema })
    }

    /// The schema records are validated against
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Validate one raw record
    ///
    /// `location` identifies the record in error messages, typically
    /// `object_key:position`.
    pub fn validate(&self, raw: &Value, location: &str) -> Result<InputRecord> {
        let Value::Object(obj) = raw else {
            return Err(Error::schema_violation(
                location,
                "<record>",
                "object",
                json_type_name(raw),
            ));
        };

        let values = self
            .schema
            .fields()
            .iter()
            .map(|field| validate_field(obj.get(field.name()), field, field.name(), location))
            .collect::<Result<Vec<_>>>()?;

        Ok(InputRecord::new(self.schema.clone(), values))
    }
}

/// Validate a raw record against a schema
pub fn validate(raw: &Value, schema: &SchemaRef, location: &str) -> Result<InputRecord> {
    RecordValidator::new(schema.clone())?.validate(raw, location)
}

fn check_supported(field: &Field, path: &str) -> Result<()> {
    match field.data_type() {
        DataType::Utf8 | DataType::Int64 | DataType::Float64 | DataType::Boolean => Ok(()),
        DataType::Struct(children) => children
            .iter()
            .try_for_each(|child| check_supported(child, &format!("{path}.{}", child.name()))),
        DataType::List(item) => check_supported(item, &format!("{path}[]")),
        other => Err(Error::invalid_schema(format!(
            "field '{path}' has unsupported type {other}"
        ))),
    }
}

fn validate_field(
    value: Option<&Value>,
    field: &Field,
    path: &str,
    location: &str,
) -> Result<FieldValue> {
    let violation = |found: &str| {
        Error::schema_violation(location, path, type_name(field.data_type()), found)
    };

    let value = match value {
        None | Some(Value::Null) => {
            return if field.is_nullable() {
                Ok(FieldValue::Null)
            } else {
                Err(violation("null"))
            };
        }
        Some(v) => v,
    };

    match (field.data_type(), value) {
        (DataType::Utf8, Value::String(s)) => Ok(FieldValue::Utf8(s.clone())),
        (DataType::Boolean, Value::Bool(b)) => Ok(FieldValue::Boolean(*b)),
        (DataType::Int64, Value::Number(n)) => n
            .as_i64()
            .map(FieldValue::Int64)
            .ok_or_else(|| violation(if n.is_u64() { "out-of-range integer" } else { json_type_name(value) })),
        (DataType::Float64, Value::Number(n)) => n
            .as_f64()
            .map(FieldValue::Float64)
            .ok_or_else(|| violation(json_type_name(value))),
        (DataType::Struct(children), Value::Object(obj)) => children
            .iter()
            .map(|child| {
                validate_field(
                    obj.get(child.name()),
                    child,
                    &format!("{path}.{}", child.name()),
                    location,
                )
            })
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::Struct),
        (DataType::List(item), Value::Array(elements)) => elements
            .iter()
            .enumerate()
            .map(|(i, element)| validate_field(Some(element), item, &format!("{path}[{i}]"), location))
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::List),
        (_, other) => Err(violation(json_type_name(other))),
    }
}
