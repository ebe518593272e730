//! Report value model: the two shapes a report may return.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A report's return value: a row/column table or a chart descriptor.
///
/// Serialized as a tagged JSON object (`"type": "table" | "chart"`) so
/// the result adapter on the supervising side can validate the shape
/// without trusting the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportValue {
    Table(Table),
    Chart(Chart),
}

/// Row/column tabular data.
///
/// Cells are JSON values so reports can mix numbers, strings and nulls
/// the same way the schema-flexible `data_json` column does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Arity must match the column count.
    pub fn push_row<I>(&mut self, row: I) -> Result<(), crate::ReportError>
    where
        I: IntoIterator<Item = Value>,
    {
        let row: Vec<Value> = row.into_iter().collect();
        if row.len() != self.columns.len() {
            return Err(crate::ReportError::msg(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Renderable chart descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
}

/// One named data series within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    /// Category or x-axis values.
    pub x: Vec<Value>,
    /// Numeric y-axis values.
    pub y: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_rejects_arity_mismatch() {
        let mut table = Table::new(["a", "b"]);
        table.push_row(vec![json!(1), json!(2)]).unwrap();
        let err = table.push_row(vec![json!(1)]).unwrap_err();
        assert!(err.to_string().contains("2 columns"));
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn value_serializes_tagged() {
        let value = ReportValue::Table(Table::new(["region"]));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "table");
        assert_eq!(json["columns"][0], "region");

        let back: ReportValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn chart_roundtrip() {
        let chart = ReportValue::Chart(Chart {
            kind: ChartKind::Bar,
            title: "Sales by region".to_string(),
            x_label: Some("region".to_string()),
            y_label: None,
            series: vec![Series {
                name: "total".to_string(),
                x: vec![json!("north"), json!("south")],
                y: vec![10.0, 12.5],
            }],
        });

        let json = serde_json::to_string(&chart).unwrap();
        let back: ReportValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chart);
    }
}
