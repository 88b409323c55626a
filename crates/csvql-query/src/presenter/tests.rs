use super::*;
use crate::batch::StatementFailure;
use crate::test_helpers::mock_query_result;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn batch_result(sql: &str, outcome: ExecutionOutcome) -> BatchResult {
    BatchResult {
        index: 2,
        sql: sql.to_string(),
        outcome,
        execution_time: Duration::ZERO,
    }
}

fn text(result: &BatchResult) -> String {
    ResultPresenter::new(ReportFormat::Text).render(result)
}

fn data_lines(table: &str) -> Vec<&str> {
    table.lines().filter(|l| !l.trim().is_empty()).collect()
}

mod text_block_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_block_layout() {
        let result = batch_result(
            "SELECT CustomerID, Age FROM customers",
            ExecutionOutcome::Success(mock_query_result(
                vec!["CustomerID", "Age"],
                vec![
                    vec![Value::Int64(1001), Value::Int64(34)],
                    vec![Value::Int64(1002), Value::Int64(45)],
                ],
            )),
        );

        let block = text(&result);

        assert!(
            block.starts_with("\nResults for query:\nSELECT CustomerID, Age FROM customers\n\n"),
            "{:?}",
            block
        );
        assert!(block.ends_with('\n'));
        assert!(!block.contains(NO_RESULTS_SENTINEL));

        let lines = data_lines(&block);
        let header: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(header, vec!["CustomerID", "Age"]);
        let last: Vec<&str> = lines[lines.len() - 1].split_whitespace().collect();
        assert_eq!(last, vec!["1002", "45"]);
    }

    #[test]
    fn test_empty_result_prints_sentinel() {
        let result = batch_result(
            "SELECT * FROM customers WHERE Age > 200",
            ExecutionOutcome::Success(mock_query_result(vec!["CustomerID"], vec![])),
        );

        assert_eq!(
            text(&result),
            "\nResults for query:\nSELECT * FROM customers WHERE Age > 200\n\n\
             No results found for this query.\n"
        );
    }

    #[test]
    fn test_engine_failure_block() {
        let result = batch_result(
            "SELECT Foo FROM customers",
            ExecutionOutcome::Failure(StatementFailure::engine("no such column: Foo")),
        );

        assert_eq!(
            text(&result),
            "\nError executing query: SELECT Foo FROM customers\nno such column: Foo\n"
        );
    }

    #[test]
    fn test_unexpected_failure_block() {
        let result = batch_result(
            "SELECT Notes FROM customers",
            ExecutionOutcome::Failure(StatementFailure::unexpected(
                "Conversion error: column 0 is not valid UTF-8",
            )),
        );

        assert_eq!(
            text(&result),
            "\nAn unexpected error occurred while executing query: SELECT Notes FROM customers\n\
             Conversion error: column 0 is not valid UTF-8\n"
        );
    }
}

mod table_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nulls_and_blobs_render_as_placeholders() {
        let table = render_table(&mock_query_result(
            vec!["Segment", "Payload"],
            vec![
                vec![Value::Null, Value::Bytes(vec![1, 2, 3])],
                vec![Value::String("Gold".into()), Value::Null],
            ],
        ));

        let lines = data_lines(&table);
        assert_eq!(lines[1].split_whitespace().collect::<Vec<_>>(), vec!["NULL", "<3", "bytes>"]);
        assert_eq!(lines[2].split_whitespace().collect::<Vec<_>>(), vec!["Gold", "NULL"]);
    }

    #[test]
    fn test_numeric_column_is_right_aligned() {
        let table = render_table(&mock_query_result(
            vec!["n"],
            vec![vec![Value::Int64(5)], vec![Value::Int64(12345)]],
        ));

        let ends: Vec<usize> = data_lines(&table)
            .iter()
            .map(|l| l.trim_end().len())
            .collect();
        assert_eq!(ends.len(), 3);
        assert!(ends.iter().all(|e| *e == ends[0]), "{:?}", table);
    }

    #[test]
    fn test_text_column_is_left_aligned() {
        let table = render_table(&mock_query_result(
            vec!["label"],
            vec![
                vec![Value::String("a".into())],
                vec![Value::String("abcdefgh".into())],
            ],
        ));

        let starts: Vec<usize> = data_lines(&table)
            .iter()
            .map(|l| l.len() - l.trim_start().len())
            .collect();
        assert!(starts.iter().all(|s| *s == starts[0]), "{:?}", table);
    }

    #[test]
    fn test_lines_have_no_trailing_whitespace() {
        let table = render_table(&mock_query_result(
            vec!["CustomerID", "Churn", "LoyaltyScore"],
            vec![
                vec![Value::Int64(1005), Value::String("No".into()), Value::Float64(7.239726)],
                vec![Value::Int64(7), Value::String("Yes".into()), Value::Null],
            ],
        ));

        assert_eq!(data_lines(&table).len(), 3);
        for line in table.lines() {
            assert_eq!(line, line.trim_end(), "{:?}", table);
        }
        assert!(!table.ends_with('\n'));
    }

    #[test]
    fn test_numeric_column_detection() {
        let (one, two, null) = (Value::Int64(1), Value::Float64(2.5), Value::Null);
        let text = Value::String("x".into());

        assert!(is_numeric_column(&[&one, &null, &two]));
        assert!(!is_numeric_column(&[&one, &text]));
        assert!(!is_numeric_column(&[&null, &null]));
        assert!(!is_numeric_column(&[]));
    }
}

mod float_format_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(values: &[Value]) -> Vec<String> {
        let refs: Vec<&Value> = values.iter().collect();
        format_column(&refs)
    }

    #[test]
    fn test_zero_float_keeps_one_decimal() {
        assert_eq!(format(&[Value::Float64(0.0)]), vec!["0.0"]);
    }

    #[test]
    fn test_six_decimals_when_needed() {
        assert_eq!(
            format(&[Value::Float64(7.239726), Value::Float64(7.2)]),
            vec!["7.239726", "7.200000"]
        );
    }

    #[test]
    fn test_common_trailing_zeros_trimmed() {
        assert_eq!(
            format(&[Value::Float64(1.5), Value::Float64(2.25), Value::Float64(3.0)]),
            vec!["1.50", "2.25", "3.00"]
        );
    }

    #[test]
    fn test_integers_in_float_column_get_decimals() {
        assert_eq!(
            format(&[Value::Int64(1), Value::Float64(0.5)]),
            vec!["1.0", "0.5"]
        );
    }

    #[test]
    fn test_integer_column_untouched() {
        assert_eq!(
            format(&[Value::Int64(30), Value::Int64(7)]),
            vec!["30", "7"]
        );
    }

    #[test]
    fn test_nulls_and_non_finite_values_ignored_for_trimming() {
        assert_eq!(
            format(&[Value::Null, Value::Float64(f64::NAN), Value::Float64(1.5)]),
            vec!["NULL", "NaN", "1.5"]
        );
    }
}

mod json_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn json(result: &BatchResult) -> serde_json::Value {
        let line = ResultPresenter::new(ReportFormat::Json).render(result);
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end().lines().count(), 1);
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_success_object() {
        let result = batch_result(
            "SELECT CustomerID, LoyaltyScore FROM customers",
            ExecutionOutcome::Success(mock_query_result(
                vec!["CustomerID", "LoyaltyScore"],
                vec![vec![Value::Int64(1005), Value::Float64(7.25)]],
            )),
        );

        assert_eq!(
            json(&result),
            serde_json::json!({
                "index": 2,
                "statement": "SELECT CustomerID, LoyaltyScore FROM customers",
                "status": "success",
                "columns": ["CustomerID", "LoyaltyScore"],
                "rows": [[1005, 7.25]],
                "row_count": 1,
                "execution_time_ms": 0,
            })
        );
    }

    #[test]
    fn test_failure_object() {
        let result = batch_result(
            "SELECT Foo FROM customers",
            ExecutionOutcome::Failure(StatementFailure::engine("no such column: Foo")),
        );

        assert_eq!(
            json(&result),
            serde_json::json!({
                "index": 2,
                "statement": "SELECT Foo FROM customers",
                "status": "failure",
                "error_kind": "engine",
                "error": "no such column: Foo",
                "execution_time_ms": 0,
            })
        );
    }

    #[test]
    fn test_execution_time_reported_in_milliseconds() {
        let mut result = batch_result(
            "SELECT COUNT(*) FROM customers",
            ExecutionOutcome::Success(mock_query_result(vec!["n"], vec![vec![Value::Int64(30)]])),
        );
        result.execution_time = Duration::from_micros(42_750);

        assert_eq!(json(&result)["execution_time_ms"], 42);

        result.outcome = ExecutionOutcome::Failure(StatementFailure::unexpected("boom"));
        assert_eq!(json(&result)["execution_time_ms"], 42);
    }
}

#[test]
fn test_report_format_parsing() {
    assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
    assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
    assert!("yaml".parse::<ReportFormat>().is_err());
    assert_eq!(ReportFormat::default(), ReportFormat::Text);
    assert_eq!(ResultPresenter::default().format(), ReportFormat::Text);
}
