//! Tests for core value and result types

use super::*;
use pretty_assertions::assert_eq;

fn sample_row() -> Row {
    Row::new(vec![Value::Int64(1005), Value::Float64(7.239726)])
}

#[test]
fn test_value_display() {
    assert_eq!(Value::Null.to_string(), "NULL");
    assert_eq!(Value::Int64(42).to_string(), "42");
    assert_eq!(Value::Float64(0.5).to_string(), "0.5");
    assert_eq!(Value::String("Monthly".into()).to_string(), "Monthly");
    assert_eq!(Value::Bytes(vec![0xff, 0x00]).to_string(), "<2 bytes>");
}

#[test]
fn test_value_numeric_detection() {
    assert!(Value::Int64(1).is_numeric());
    assert!(Value::Float64(1.5).is_numeric());
    assert!(!Value::String("1".into()).is_numeric());
    assert!(!Value::Null.is_numeric());
}

#[test]
fn test_value_null_detection() {
    assert!(Value::Null.is_null());
    assert!(!Value::String(String::new()).is_null());
}

#[test]
fn test_value_to_json() {
    assert_eq!(Value::Int64(30).to_json(), serde_json::json!(30));
    assert_eq!(Value::Float64(0.25).to_json(), serde_json::json!(0.25));
    assert_eq!(Value::Float64(f64::NAN).to_json(), serde_json::Value::Null);
    assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    assert_eq!(Value::String("Yes".into()).to_json(), serde_json::json!("Yes"));
}

#[test]
fn test_row_lookup_by_index() {
    let row = sample_row();

    assert_eq!(row.get(0), Some(&Value::Int64(1005)));
    assert_eq!(row.get(1), Some(&Value::Float64(7.239726)));
    assert_eq!(row.get(2), None);
}

#[test]
fn test_query_result_counts() {
    let mut result = QueryResult::empty();
    assert!(!result.has_rows());

    result.columns = vec![
        ColumnMeta {
            name: "CustomerID".into(),
            data_type: "INTEGER".into(),
            ordinal: 0,
        },
        ColumnMeta {
            name: "LoyaltyScore".into(),
            data_type: "REAL".into(),
            ordinal: 1,
        },
    ];
    result.rows.push(sample_row());

    assert!(result.has_rows());
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_count(), 2);
    assert_eq!(result.column_names(), vec!["CustomerID", "LoyaltyScore"]);
}

#[test]
fn test_engine_error_classification() {
    assert!(crate::CsvqlError::Query("no such column: Foo".into()).is_engine_error());
    assert!(!crate::CsvqlError::Conversion("bad utf-8".into()).is_engine_error());
    assert!(!crate::CsvqlError::Closed.is_engine_error());
}
