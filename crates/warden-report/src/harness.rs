//! Worker-side execution harness.
//!
//! The generated worker binary's `main` is a single call:
//!
//! ```rust,ignore
//! fn main() {
//!     warden_report::harness::drive(generate_report);
//! }
//! ```
//!
//! The harness owns the whole capability surface the report sees: a
//! read-only connection to the data store named by `WARDEN_DB_PATH`,
//! nothing else. The entry runs exactly once behind `catch_unwind`;
//! every fault is converted into a [`WorkerReport::Failure`] frame so
//! nothing escapes the worker as an uncaught panic.

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use rusqlite::{Connection, OpenFlags};

use crate::wire::{self, FailureKind, WorkerReport};
use crate::{ReportError, ReportResult};

/// Environment variable carrying the data store path into the worker.
pub const DB_PATH_ENV: &str = "WARDEN_DB_PATH";

/// Run one report entry point and post the result frame on stdout.
///
/// Never returns control to report code after the single invocation;
/// the exit code only signals whether the frame was delivered.
pub fn drive(entry: fn(&Connection) -> ReportResult) -> ExitCode {
    // The default hook would print the panic to stderr before unwinding
    // reaches catch_unwind; the payload alone carries the message.
    panic::set_hook(Box::new(|_| {}));

    let report = execute(entry);
    let _ = panic::take_hook();

    let mut stdout = std::io::stdout().lock();
    match wire::write_frame(&mut stdout, &report) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn execute(entry: fn(&Connection) -> ReportResult) -> WorkerReport {
    let conn = match open_store() {
        Ok(conn) => conn,
        Err(e) => {
            return WorkerReport::Failure {
                kind: FailureKind::Report,
                message: format!("cannot open data store read-only: {e}"),
            };
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| entry(&conn))) {
        Ok(Ok(value)) => match serde_json::to_value(&value) {
            Ok(value) => WorkerReport::Value { value },
            Err(e) => WorkerReport::Failure {
                kind: FailureKind::Report,
                message: format!("report value not serializable: {e}"),
            },
        },
        Ok(Err(e)) => WorkerReport::Failure {
            kind: FailureKind::Report,
            message: e.to_string(),
        },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            WorkerReport::Failure {
                kind: classify_panic(&message),
                message,
            }
        }
    }
}

fn open_store() -> Result<Connection, ReportError> {
    let path = std::env::var(DB_PATH_ENV)
        .map_err(|_| ReportError::msg(format!("{DB_PATH_ENV} not set")))?;
    Ok(Connection::open_with_flags(
        &path,
        OpenFlags::SQLITE_OPEN_READ_ONLY,
    )?)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

fn classify_panic(message: &str) -> FailureKind {
    if message.contains("divide by zero") || message.contains("division by zero") {
        FailureKind::DivideByZero
    } else {
        FailureKind::Panic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that touch DB_PATH_ENV must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn division_panics_are_classified() {
        assert_eq!(
            classify_panic("attempt to divide by zero"),
            FailureKind::DivideByZero
        );
        assert_eq!(classify_panic("index out of bounds"), FailureKind::Panic);
    }

    #[test]
    fn entry_error_becomes_report_failure() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::remove_var(DB_PATH_ENV) };
        let report = execute(|_| Ok(crate::ReportValue::Table(crate::Table::new(["a"]))));
        match report {
            WorkerReport::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Report);
                assert!(message.contains(DB_PATH_ENV));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn entry_runs_against_read_only_store() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE data_records (id INTEGER, data_json TEXT)", [])
            .unwrap();
        conn.execute(
            "INSERT INTO data_records (id, data_json) VALUES (1, '{}')",
            [],
        )
        .unwrap();
        drop(conn);

        unsafe { std::env::set_var(DB_PATH_ENV, &db_path) };
        let report = execute(|db| {
            // Writes must fail on the read-only handle.
            assert!(db.execute("INSERT INTO data_records (id) VALUES (2)", []).is_err());

            let count: i64 =
                db.query_row("SELECT COUNT(*) FROM data_records", [], |r| r.get(0))?;
            let mut table = crate::Table::new(["count"]);
            table.push_row(vec![serde_json::json!(count)])?;
            Ok(crate::ReportValue::Table(table))
        });
        unsafe { std::env::remove_var(DB_PATH_ENV) };

        match report {
            WorkerReport::Value { value } => {
                assert_eq!(value["rows"][0][0], 1);
            }
            other => panic!("expected value, got {other:?}"),
        }
    }
}
