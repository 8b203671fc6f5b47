//! Flat row type and the transform seam

use crate::error::Result;
use crate::schema::{FieldValue, InputRecord};
use arrow::datatypes::SchemaRef;

/// One wide output row
///
/// All rows produced by the same plan share one schema, so column names
/// and order are identical across a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    schema: SchemaRef,
    values: Vec<FieldValue>,
}

impl FlatRow {
    pub(crate) fn new(schema: SchemaRef, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(schema.fields().len(), values.len());
        Self { schema, values }
    }

    /// Output schema shared by all rows of a plan
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Column names in output order
    pub fn columns(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Values in column order
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Look up a column by name
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        let (index, _) = self.schema.column_with_name(column)?;
        self.values.get(index)
    }
}

/// Per-record mapping applied by a shard writer
///
/// Implementations must be pure: the same record always yields the same
/// rows, and records can be processed on any worker in any order.
pub trait RecordTransform: Send + Sync {
    /// Schema of every row this transform emits
    fn output_schema(&self) -> SchemaRef;

    /// Reject records this transform cannot map
    fn check(&self, _record: &InputRecord) -> Result<()> {
        Ok(())
    }

    /// Map one record to zero or more rows
    fn apply(&self, record: &InputRecord) -> Vec<FlatRow>;
}
