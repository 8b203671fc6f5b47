//! Schema definition module
//!
//! Declares the shape of valid input events and validates raw JSON against it.
//!
//! # Features
//!
//! - **Fixed Schema**: The order event shape, expressed as an Arrow schema
//! - **Strict Validation**: No silent casts across incompatible JSON types
//! - **Positional Records**: Validated values line up with schema fields

mod order;
mod types;
mod validate;

pub use order::{order_event_schema, CUSTOMER_FIELD, PRODUCTS_FIELD};
pub use types::{json_type_name, type_name, FieldValue, InputRecord};
pub use validate::{validate, RecordValidator};

#[cfg(test)]
mod tests;
