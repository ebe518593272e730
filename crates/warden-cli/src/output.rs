//! Plain-text rendering of adapted report results.

use warden_core::{ChartOutput, TableOutput};

/// Print a table with padded columns.
pub fn print_table(table: &TableOutput) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    let rendered_rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    for row in &rendered_rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(name, width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join("  "));
    println!("{}", "─".repeat(header.join("  ").len()));

    for row in &rendered_rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Print a chart summary; the terminal does not render charts.
pub fn print_chart(chart: &ChartOutput) {
    println!("[{} chart] {}", chart.kind, chart.title);
    for series in &chart.spec.series {
        let points = series
            .x
            .iter()
            .zip(&series.y)
            .map(|(x, y)| format!("{}={}", cell_text(x), y))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {}: {}", series.name, points);
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
