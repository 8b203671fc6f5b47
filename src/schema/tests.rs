//! Schema validation tests

use super::*;
use crate::error::Error;
use arrow::datatypes::{DataType, Field, Schema};
use serde_json::json;
use std::sync::Arc;
use test_case::test_case;

fn validator() -> RecordValidator {
    RecordValidator::new(order_event_schema()).unwrap()
}

#[test]
fn test_order_schema_field_order() {
    let schema = order_event_schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(
        names,
        vec![
            "currency",
            "customer",
            "order_id",
            "payment_method",
            "products",
            "shipping_cost",
            "shipping_method",
            "status",
            "subtotal",
            "tax",
            "timestamp",
            "total_amount",
        ]
    );
    assert!(schema.fields().iter().all(|f| f.is_nullable()));
}

#[test]
fn test_validate_full_record() {
    let raw = json!({
        "currency": "USD",
        "order_id": "O1",
        "subtotal": 20.5,
        "tax": 2,
        "customer": {"customer_id": 9, "email": "a@example.com", "is_premium": true},
        "products": [
            {"product_id": 1, "name": "A", "price": 10.25, "in_stock": true},
            {"product_id": 2, "name": "B", "price": 10.25}
        ]
    });

    let record = validator().validate(&raw, "test:1").unwrap();

    assert_eq!(record.get("order_id").and_then(FieldValue::as_str), Some("O1"));
    assert_eq!(record.get("subtotal").and_then(FieldValue::as_f64), Some(20.5));
    // Integer widened into a float64 field
    assert_eq!(record.get("tax").and_then(FieldValue::as_f64), Some(2.0));
    assert!(record.get("status").unwrap().is_null());

    match record.get("customer").unwrap() {
        FieldValue::Struct(children) => {
            assert_eq!(children.len(), 5);
            assert_eq!(children[2], FieldValue::Int64(9));
            assert_eq!(children[4], FieldValue::Boolean(true));
            assert!(children[0].is_null());
        }
        other => panic!("Expected struct, got {other:?}"),
    }

    match record.get("products").unwrap() {
        FieldValue::List(items) => assert_eq!(items.len(), 2),
        other => panic!("Expected list, got {other:?}"),
    }
}

#[test]
fn test_validate_absent_fields_are_null() {
    let record = validator().validate(&json!({}), "test:1").unwrap();
    assert_eq!(record.values().len(), 12);
    assert!(record.values().iter().all(FieldValue::is_null));
}

#[test]
fn test_validate_ignores_unknown_keys() {
    let record = validator()
        .validate(&json!({"order_id": "O1", "unexpected": [1, 2, 3]}), "test:1")
        .unwrap();
    assert!(record.get("unexpected").is_none());
    assert_eq!(record.get("order_id").and_then(FieldValue::as_str), Some("O1"));
}

#[test_case(json!({"subtotal": "12.50"}), "subtotal", "string" ; "string for float")]
#[test_case(json!({"order_id": 42}), "order_id", "integer" ; "number for string")]
#[test_case(json!({"customer": {"customer_id": 1.5}}), "customer.customer_id", "fractional number" ; "fraction for int")]
#[test_case(json!({"customer": {"is_premium": "yes"}}), "customer.is_premium", "string" ; "string for bool")]
#[test_case(json!({"products": [{"price": 1.0}, {"price": "free"}]}), "products[1].price", "string" ; "nested list element")]
#[test_case(json!({"products": {"name": "A"}}), "products", "object" ; "object for list")]
#[test_case(json!({"customer": "bob"}), "customer", "string" ; "string for struct")]
fn test_validate_rejects_type_mismatch(raw: serde_json::Value, field: &str, found: &str) {
    let err = validator().validate(&raw, "logs/a.json:7").unwrap_err();
    match err {
        Error::SchemaViolation {
            location,
            field: actual_field,
            found: actual_found,
            ..
        } => {
            assert_eq!(location, "logs/a.json:7");
            assert_eq!(actual_field, field);
            assert_eq!(actual_found, found);
        }
        other => panic!("Expected SchemaViolation, got {other:?}"),
    }
}

#[test]
fn test_validate_rejects_non_object_record() {
    let err = validator().validate(&json!([1, 2]), "x:1").unwrap_err();
    assert!(err.is_schema_violation());
}

#[test]
fn test_validate_rejects_out_of_range_integer() {
    let err = validator()
        .validate(&json!({"customer": {"customer_id": u64::MAX}}), "x:1")
        .unwrap_err();
    assert!(err.to_string().contains("out-of-range integer"));
}

#[test]
fn test_validate_non_nullable_field() {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    let validator = RecordValidator::new(schema).unwrap();

    assert!(validator.validate(&json!({"id": 1}), "x:1").is_ok());
    assert!(validator.validate(&json!({}), "x:1").unwrap_err().is_schema_violation());
    assert!(validator.validate(&json!({"id": null}), "x:1").unwrap_err().is_schema_violation());
}

#[test]
fn test_unsupported_schema_type() {
    let schema = Arc::new(Schema::new(vec![Field::new("when", DataType::Date32, true)]));
    let err = RecordValidator::new(schema).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema { .. }));
}

#[test]
fn test_free_validate_function() {
    let record = validate(&json!({"status": "shipped"}), &order_event_schema(), "x:1").unwrap();
    assert_eq!(record.get("status").and_then(FieldValue::as_str), Some("shipped"));
}

#[test]
fn test_type_names() {
    assert_eq!(type_name(&DataType::Float64), "float64");
    assert_eq!(json_type_name(&json!(3)), "integer");
    assert_eq!(json_type_name(&json!(3.5)), "fractional number");
    assert_eq!(json_type_name(&json!(null)), "null");
}
