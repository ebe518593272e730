//! Append-only audit logging: one immutable record per execution
//! attempt.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One execution attempt's outcome, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339 timestamp of the attempt.
    pub timestamp: String,
    pub report_name: String,
    pub success: bool,
    /// Truncated error text; `null` on success.
    pub error: Option<String>,
}

/// Appends audit records to a JSONL stream.
///
/// This component only ever appends; rewriting or deleting prior
/// records is not part of its surface.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    path: PathBuf,
    max_error_len: usize,
}

impl AuditLogger {
    pub fn new(path: PathBuf, max_error_len: usize) -> Self {
        Self {
            path,
            max_error_len,
        }
    }

    /// Append one record. `error` is dropped when `success` is true and
    /// truncated to the configured cap otherwise.
    pub fn record(&self, report_name: &str, success: bool, error: Option<&str>) -> Result<()> {
        let record = AuditRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            report_name: report_name.to_string(),
            success,
            error: if success {
                None
            } else {
                error.map(|e| truncate(e, self.max_error_len))
            },
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        serde_json::to_writer(&mut file, &record)?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Read the last `limit` records (display convenience; the stream
    /// itself stays append-only).
    pub fn tail(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(std::fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }

    /// Total number of records in the stream.
    pub fn count(&self) -> Result<usize> {
        Ok(self.tail(usize::MAX)?.len())
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn logger(temp: &TempDir) -> AuditLogger {
        AuditLogger::new(temp.path().join("audit.jsonl"), 500)
    }

    #[test]
    fn one_record_per_attempt_mixed_outcomes() {
        let temp = TempDir::new().unwrap();
        let audit = logger(&temp);

        audit.record("a", true, None).unwrap();
        audit.record("b", false, Some("panic: boom")).unwrap();
        audit.record("c", false, Some("timeout")).unwrap();
        audit.record("a", true, None).unwrap();

        assert_eq!(audit.count().unwrap(), 4);

        let records = audit.tail(10).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].report_name, "a");
        assert_eq!(records[2].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn success_drops_error_text() {
        let temp = TempDir::new().unwrap();
        let audit = logger(&temp);

        audit.record("ok", true, Some("stale message")).unwrap();
        let records = audit.tail(1).unwrap();
        assert!(records[0].success);
        assert_eq!(records[0].error, None);
    }

    #[test]
    fn error_is_truncated_to_cap() {
        let temp = TempDir::new().unwrap();
        let audit = AuditLogger::new(temp.path().join("audit.jsonl"), 10);

        audit.record("big", false, Some(&"e".repeat(100))).unwrap();
        let records = audit.tail(1).unwrap();
        assert_eq!(records[0].error.as_deref(), Some("eeeeeeeeee"));
    }

    #[test]
    fn tail_returns_most_recent() {
        let temp = TempDir::new().unwrap();
        let audit = logger(&temp);

        for i in 0..5 {
            audit.record(&format!("r{i}"), true, None).unwrap();
        }

        let records = audit.tail(2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].report_name, "r3");
        assert_eq!(records[1].report_name, "r4");
    }
}
