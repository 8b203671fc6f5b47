//! Built-in schema for e-commerce order events

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Name of the list field exploded into one row per element
pub const PRODUCTS_FIELD: &str = "products";

/// Name of the nested customer struct
pub const CUSTOMER_FIELD: &str = "customer";

fn customer_fields() -> Vec<Field> {
    vec![
        Field::new("account_age_days", DataType::Int64, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("customer_id", DataType::Int64, true),
        Field::new("email", DataType::Utf8, true),
        Field::new("is_premium", DataType::Boolean, true),
    ]
}

fn product_fields() -> Vec<Field> {
    vec![
        Field::new("category", DataType::Utf8, true),
        Field::new("in_stock", DataType::Boolean, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("price", DataType::Float64, true),
        Field::new("product_id", DataType::Int64, true),
        Field::new("vendor", DataType::Utf8, true),
    ]
}

/// Schema of one order event as it arrives from the order topic logs
///
/// Every field is nullable. Field order here drives the flat column order.
pub fn order_event_schema() -> SchemaRef {
    let product = Field::new_struct("item", product_fields(), true);

    Arc::new(Schema::new(vec![
        Field::new("currency", DataType::Utf8, true),
        Field::new_struct(CUSTOMER_FIELD, customer_fields(), true),
        Field::new("order_id", DataType::Utf8, true),
        Field::new("payment_method", DataType::Utf8, true),
        Field::new_list(PRODUCTS_FIELD, product, true),
        Field::new("shipping_cost", DataType::Float64, true),
        Field::new("shipping_method", DataType::Utf8, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("subtotal", DataType::Float64, true),
        Field::new("tax", DataType::Float64, true),
        Field::new("timestamp", DataType::Utf8, true),
        Field::new("total_amount", DataType::Float64, true),
    ]))
}
