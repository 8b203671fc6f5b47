//! Tests for decoder module

use super::*;
use crate::error::Error;
use crate::types::InputFormat;

// ============================================================================
// JSON Decoder Tests
// ============================================================================

#[test]
fn test_json_decoder_array() {
    let decoder = JsonDecoder::new();
    let body = r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#;

    let records = decoder.decode(body, "a.json").unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].value["id"], 1);
    assert_eq!(records[2].value["id"], 3);
    assert_eq!(records[2].position, 3);
}

#[test]
fn test_json_decoder_object() {
    let decoder = JsonDecoder::new();
    let body = "{\n  \"order_id\": \"O1\",\n  \"products\": []\n}\n";

    let records = decoder.decode(body, "a.json").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value["order_id"], "O1");
}

#[test]
fn test_json_decoder_invalid() {
    let err = JsonDecoder::new().decode("{not json", "bad.json").unwrap_err();
    match err {
        Error::Decode { location, .. } => assert_eq!(location, "bad.json"),
        other => panic!("Expected Decode error, got {other:?}"),
    }
}

#[test]
fn test_json_decoder_empty_body() {
    assert!(JsonDecoder::new().decode("  \n", "e.json").unwrap().is_empty());
}

// ============================================================================
// JSONL Decoder Tests
// ============================================================================

#[test]
fn test_jsonl_decoder() {
    let decoder = JsonlDecoder::new();
    let body = "{\"id\": 1}\n\n{\"id\": 2}\n{\"id\": 3}\n";

    let records = decoder.decode(body, "a.jsonl").unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].value["id"], 2);
    // Blank line still counts toward the line number
    assert_eq!(records[1].position, 3);
}

#[test]
fn test_jsonl_decoder_reports_line() {
    let body = "{\"id\": 1}\n{\"id\": \n";
    let err = JsonlDecoder::new().decode(body, "a.jsonl").unwrap_err();
    assert!(err.to_string().contains("line 2"));
    assert!(err.to_string().contains("a.jsonl"));
}

// ============================================================================
// Auto Decoder Tests
// ============================================================================

#[test]
fn test_auto_decoder_single_document() {
    let body = "{\n  \"id\": 7\n}";
    let records = AutoDecoder::new().decode(body, "x").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value["id"], 7);
}

#[test]
fn test_auto_decoder_falls_back_to_lines() {
    let body = "{\"id\": 1}\n{\"id\": 2}";
    let records = AutoDecoder::new().decode(body, "x").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].position, 2);
}

#[test]
fn test_auto_decoder_line_error() {
    let body = "{\"id\": 1}\n{oops}";
    let err = AutoDecoder::new().decode(body, "x").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_decoder_for_format() {
    let body = "{\"id\": 1}\n{\"id\": 2}";
    assert_eq!(decoder_for(InputFormat::Auto).decode(body, "x").unwrap().len(), 2);
    assert_eq!(decoder_for(InputFormat::Jsonl).decode(body, "x").unwrap().len(), 2);
    assert!(decoder_for(InputFormat::Json).decode(body, "x").is_err());
}
