//! Master prompt generation for the external assistant.
//!
//! The prompt embeds the live `data_records` schema so the assistant
//! writes queries against columns that actually exist, and states the
//! policy constraints up front so generated code passes the scanner on
//! the first try.

use std::collections::BTreeMap;

use crate::config::EngineConfig;

/// Build the master prompt from the current store schema.
pub fn master_prompt(schema: &BTreeMap<String, String>, config: &EngineConfig) -> String {
    let schema_lines: String = schema
        .iter()
        .map(|(name, ty)| format!("  {name}: {ty}\n"))
        .collect();

    let allowed: Vec<&str> = config
        .allowed_imports
        .iter()
        .map(String::as_str)
        .collect();

    format!(
        r#"You are an expert Rust data analyst. Write a single Rust function:

    fn generate_report(db: &rusqlite::Connection) -> warden_report::ReportResult

It must query the SQLite database through `db` and return
`Ok(ReportValue::Table(..))` or `Ok(ReportValue::Chart(..))` from the
`warden_report` crate.

CRITICAL: Output ONLY raw, compilable Rust code. No markdown fences, no
explanations, no example usage. The code is compiled and executed as-is.

Database schema (columns of the data_records table):
{schema_lines}
Requirements:
1. The connection is already open READ-ONLY; do not open anything else
2. Query the 'data_records' table; the data_json column holds each row
   as a JSON document (parse it with serde_json)
3. Build results with warden_report::Table / warden_report::Chart
4. Only these crates may be imported: {allowed}
5. Do NOT use: std::fs, std::net, std::process, std::thread, std::env,
   unsafe blocks, or any include! macro
6. Do NOT write any code that modifies the database"#,
        allowed = allowed.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_schema_and_policy() {
        let mut schema = BTreeMap::new();
        schema.insert("region".to_string(), "TEXT".to_string());
        schema.insert("units_sold".to_string(), "INTEGER".to_string());

        let config = EngineConfig::default();
        let prompt = master_prompt(&schema, &config);

        assert!(prompt.contains("region: TEXT"));
        assert!(prompt.contains("units_sold: INTEGER"));
        assert!(prompt.contains("generate_report(db: &rusqlite::Connection)"));
        assert!(prompt.contains("rusqlite"));
        assert!(prompt.contains("READ-ONLY"));
    }
}
