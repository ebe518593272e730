//! Result adapter: normalizes worker return values into displayable
//! shapes and turns every failure into a readable message.

use serde_json::Value;

use warden_report::wire::FailureKind;
use warden_report::{Chart, ReportValue, Table};

use crate::execute::ExecutionResult;

/// A normalized, displayable report result.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Table(TableOutput),
    Chart(ChartOutput),
}

/// Row/column output with validated arity.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Chart descriptor ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    pub kind: String,
    pub title: String,
    pub series_names: Vec<String>,
    pub spec: Chart,
}

/// Adapt a worker value into one of the two accepted shapes.
///
/// Any other shape (wrong tag, ragged rows, series length mismatch)
/// is an `UnsupportedResultType` runtime failure, not an engine error.
pub fn adapt_value(value: Value) -> Result<Rendered, ExecutionResult> {
    let parsed: ReportValue = serde_json::from_value(value).map_err(|e| unsupported(&format!(
        "worker returned a value that is neither a table nor a chart: {e}"
    )))?;

    match parsed {
        ReportValue::Table(table) => adapt_table(table),
        ReportValue::Chart(chart) => adapt_chart(chart),
    }
}

fn adapt_table(table: Table) -> Result<Rendered, ExecutionResult> {
    let width = table.columns.len();
    if width == 0 {
        return Err(unsupported("table has no columns"));
    }
    for (index, row) in table.rows.iter().enumerate() {
        if row.len() != width {
            return Err(unsupported(&format!(
                "table row {index} has {} cells, expected {width}",
                row.len()
            )));
        }
    }

    Ok(Rendered::Table(TableOutput {
        columns: table.columns,
        rows: table.rows,
    }))
}

fn adapt_chart(chart: Chart) -> Result<Rendered, ExecutionResult> {
    if chart.series.is_empty() {
        return Err(unsupported("chart has no series"));
    }
    for series in &chart.series {
        if series.x.len() != series.y.len() {
            return Err(unsupported(&format!(
                "chart series '{}' has {} x values but {} y values",
                series.name,
                series.x.len(),
                series.y.len()
            )));
        }
    }

    Ok(Rendered::Chart(ChartOutput {
        kind: format!("{:?}", chart.kind).to_lowercase(),
        title: chart.title.clone(),
        series_names: chart.series.iter().map(|s| s.name.clone()).collect(),
        spec: chart,
    }))
}

fn unsupported(message: &str) -> ExecutionResult {
    ExecutionResult::RuntimeFailure {
        kind: FailureKind::UnsupportedResultType,
        message: message.to_string(),
    }
}

/// Human-readable message for a non-success outcome, preserving the
/// fault category.
pub fn describe_failure(result: &ExecutionResult, deadline_secs: u64) -> String {
    match result {
        ExecutionResult::Success(_) => String::new(),
        ExecutionResult::RuntimeFailure { kind, message } => {
            format!("{kind}: {message}")
        }
        ExecutionResult::Timeout => format!(
            "execution timeout ({deadline_secs}s): the report took too long to generate"
        ),
        ExecutionResult::MissingEntryPoint => {
            "function 'generate_report(db)' not found in the report code".to_string()
        }
        ExecutionResult::NoResultProduced => {
            "no result returned from the report".to_string()
        }
    }
}

/// The guidance block shown to users after a failed run.
pub fn fix_it_guidance(error: &str) -> String {
    format!(
        "error executing report: {error}\n\
         \n\
         To fix this:\n\
         1. Copy the error message above\n\
         2. Paste it back into your AI assistant\n\
         3. Ask: \"Fix the Rust report code with this error: [paste error]\"\n\
         4. Import the corrected code under a new name"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_report::{ChartKind, Series};

    #[test]
    fn table_roundtrip_preserves_rows_and_values() {
        let mut table = Table::new(["region", "units"]);
        for i in 0..7 {
            table
                .push_row(vec![json!(format!("r{i}")), json!(i * 10)])
                .unwrap();
        }
        let value = serde_json::to_value(ReportValue::Table(table)).unwrap();

        match adapt_value(value).unwrap() {
            Rendered::Table(out) => {
                assert_eq!(out.rows.len(), 7);
                assert_eq!(out.columns, vec!["region", "units"]);
                assert_eq!(out.rows[3], vec![json!("r3"), json!(30)]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn chart_is_adapted_with_series_names() {
        let chart = ReportValue::Chart(Chart {
            kind: ChartKind::Line,
            title: "Units over time".to_string(),
            x_label: None,
            y_label: None,
            series: vec![Series {
                name: "units".to_string(),
                x: vec![json!("jan"), json!("feb")],
                y: vec![1.0, 2.0],
            }],
        });
        let value = serde_json::to_value(chart).unwrap();

        match adapt_value(value).unwrap() {
            Rendered::Chart(out) => {
                assert_eq!(out.kind, "line");
                assert_eq!(out.series_names, vec!["units"]);
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn foreign_shape_is_unsupported_result_type() {
        let err = adapt_value(json!({"anything": "else"})).unwrap_err();
        match err {
            ExecutionResult::RuntimeFailure { kind, .. } => {
                assert_eq!(kind, FailureKind::UnsupportedResultType);
            }
            other => panic!("expected runtime failure, got {other:?}"),
        }
    }

    #[test]
    fn ragged_table_is_unsupported() {
        let value = json!({
            "type": "table",
            "columns": ["a", "b"],
            "rows": [[1, 2], [3]],
        });
        let err = adapt_value(value).unwrap_err();
        match err {
            ExecutionResult::RuntimeFailure { kind, message } => {
                assert_eq!(kind, FailureKind::UnsupportedResultType);
                assert!(message.contains("row 1"));
            }
            other => panic!("expected runtime failure, got {other:?}"),
        }
    }

    #[test]
    fn failure_messages_preserve_category() {
        let failure = ExecutionResult::RuntimeFailure {
            kind: FailureKind::DivideByZero,
            message: "attempt to divide by zero".to_string(),
        };
        let message = describe_failure(&failure, 45);
        assert!(message.contains("division"));

        assert!(describe_failure(&ExecutionResult::Timeout, 2).contains("timeout (2s)"));
        assert!(
            describe_failure(&ExecutionResult::MissingEntryPoint, 45)
                .contains("generate_report")
        );
    }
}
