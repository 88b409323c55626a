//! Rendering statement outcomes as report blocks

use std::fmt;
use std::str::FromStr;

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use csvql_core::{QueryResult, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::batch::{BatchResult, ExecutionOutcome, FailureKind};

#[cfg(test)]
mod tests;

/// Printed in place of a table when a statement returns no rows
pub const NO_RESULTS_SENTINEL: &str = "No results found for this query.";

const FLOAT_DECIMALS: usize = 6;

/// Output format of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable blocks with borderless tables
    #[default]
    Text,
    /// One JSON object per statement per line
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{}' (expected 'text' or 'json')",
                other
            )),
        }
    }
}

/// Turns each statement's outcome into the block written to the report.
///
/// Rendering never fails; the caller decides where the text goes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultPresenter {
    format: ReportFormat,
}

impl ResultPresenter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn render(&self, result: &BatchResult) -> String {
        match self.format {
            ReportFormat::Text => render_text(&result.sql, &result.outcome),
            ReportFormat::Json => render_json(result),
        }
    }
}

fn render_text(sql: &str, outcome: &ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Success(result) => {
            let body = if result.has_rows() {
                render_table(result)
            } else {
                NO_RESULTS_SENTINEL.to_string()
            };
            format!("\nResults for query:\n{}\n\n{}\n", sql, body)
        }
        ExecutionOutcome::Failure(failure) => match failure.kind {
            FailureKind::Engine => {
                format!("\nError executing query: {}\n{}\n", sql, failure.message)
            }
            FailureKind::Unexpected => format!(
                "\nAn unexpected error occurred while executing query: {}\n{}\n",
                sql, failure.message
            ),
        },
    }
}

fn render_json(result: &BatchResult) -> String {
    let execution_time_ms = result.execution_time.as_millis() as u64;
    let object = match &result.outcome {
        ExecutionOutcome::Success(query) => {
            let rows: Vec<Vec<serde_json::Value>> = query
                .rows
                .iter()
                .map(|row| row.values.iter().map(Value::to_json).collect())
                .collect();
            json!({
                "index": result.index,
                "statement": result.sql,
                "status": "success",
                "columns": query.column_names(),
                "rows": rows,
                "row_count": query.row_count(),
                "execution_time_ms": execution_time_ms,
            })
        }
        ExecutionOutcome::Failure(failure) => json!({
            "index": result.index,
            "statement": result.sql,
            "status": "failure",
            "error_kind": failure.kind,
            "error": failure.message,
            "execution_time_ms": execution_time_ms,
        }),
    };
    format!("{}\n", object)
}

/// Render a result as a borderless table of headers and rows.
///
/// Numeric columns are right-aligned and text columns left-aligned. Columns
/// holding any float are printed with fixed decimals, minus the trailing
/// zeros every value in the column shares.
pub fn render_table(result: &QueryResult) -> String {
    let column_count = result.column_count();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(column_count);
    let mut numeric = Vec::with_capacity(column_count);

    for idx in 0..column_count {
        let values: Vec<&Value> = result
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Value::Null))
            .collect();
        cells.push(format_column(&values));
        numeric.push(is_numeric_column(&values));
    }

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .force_no_tty()
        .set_content_arrangement(ContentArrangement::Disabled);

    table.set_header(
        result
            .columns
            .iter()
            .zip(&numeric)
            .map(|(meta, is_numeric)| Cell::new(&meta.name).set_alignment(alignment(*is_numeric))),
    );

    for row_idx in 0..result.row_count() {
        table.add_row(cells.iter().zip(&numeric).map(|(column, is_numeric)| {
            Cell::new(&column[row_idx]).set_alignment(alignment(*is_numeric))
        }));
    }

    // The preset pads both sides of every cell
    table
        .to_string()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn alignment(numeric: bool) -> CellAlignment {
    if numeric {
        CellAlignment::Right
    } else {
        CellAlignment::Left
    }
}

/// A column is numeric when it has at least one value and every non-NULL
/// value is an integer or float.
fn is_numeric_column(values: &[&Value]) -> bool {
    let mut non_null = values.iter().filter(|v| !v.is_null()).peekable();
    non_null.peek().is_some() && non_null.all(|v| v.is_numeric())
}

fn format_column(values: &[&Value]) -> Vec<String> {
    let has_float = values.iter().any(|v| matches!(v, Value::Float64(_)));
    if !has_float {
        return values.iter().map(|v| v.to_string()).collect();
    }

    let mut formatted: Vec<String> = values
        .iter()
        .map(|v| match v {
            Value::Int64(n) => format!("{:.*}", FLOAT_DECIMALS, *n as f64),
            Value::Float64(f) => format!("{:.*}", FLOAT_DECIMALS, f),
            other => other.to_string(),
        })
        .collect();

    let trim = common_trailing_zeros(values, &formatted);
    if trim > 0 {
        for (text, value) in formatted.iter_mut().zip(values) {
            if has_fixed_decimals(value, text) {
                text.truncate(text.len() - trim);
            }
        }
    }
    formatted
}

/// Trailing zeros shared by every fixed-decimal value, keeping one decimal
fn common_trailing_zeros(values: &[&Value], formatted: &[String]) -> usize {
    formatted
        .iter()
        .zip(values)
        .filter(|(text, value)| has_fixed_decimals(value, text))
        .map(|(text, _)| text.bytes().rev().take_while(|b| *b == b'0').count())
        .min()
        .map(|zeros| zeros.min(FLOAT_DECIMALS - 1))
        .unwrap_or(0)
}

fn has_fixed_decimals(value: &Value, text: &str) -> bool {
    match value {
        Value::Int64(_) => true,
        Value::Float64(f) => f.is_finite() && text.contains('.'),
        _ => false,
    }
}
