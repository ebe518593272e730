//! Data store collaborator: schema-flexible SQLite storage for
//! ingested tabular data.
//!
//! Rows live in `data_records` as JSON documents (`data_json`) keyed by
//! a SHA-256 row hash for dedup. Ingestion evolves the table's declared
//! column set (`ALTER TABLE ADD COLUMN`) so the schema surfaced to the
//! master prompt grows with the data; admitted report code reads the
//! documents, not the typed columns.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::paths::DashboardDirs;

/// Result of one ingestion pass over the inbox.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub processed: Vec<ProcessedFile>,
    pub errors: Vec<IngestError>,
}

#[derive(Debug, Serialize)]
pub struct ProcessedFile {
    pub file: String,
    pub imported: usize,
    pub skipped: usize,
    pub archived: String,
}

#[derive(Debug, Serialize)]
pub struct IngestError {
    pub file: String,
    pub error: String,
}

/// Handle to the dashboard's SQLite data store.
///
/// Connections are opened per operation; the worker side gets its own
/// read-only connection through the harness.
#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    /// Open (and initialize, if needed) the store at `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let store = Self { path };
        store.init()?;
        Ok(store)
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-only connection, the shape handed to workers.
    pub fn open_read_only(&self) -> Result<Connection> {
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?)
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS data_files (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 filename TEXT NOT NULL,
                 imported_at TEXT NOT NULL,
                 row_count INTEGER
             );
             CREATE TABLE IF NOT EXISTS data_records (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 file_id INTEGER NOT NULL,
                 row_hash TEXT NOT NULL,
                 data_json TEXT NOT NULL,
                 FOREIGN KEY (file_id) REFERENCES data_files(id),
                 UNIQUE(row_hash)
             );
             CREATE TABLE IF NOT EXISTS reports (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL UNIQUE,
                 code TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Declared columns of `data_records`, name → SQL type.
    pub fn schema(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("PRAGMA table_info(data_records)")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut schema = BTreeMap::new();
        for row in rows {
            let (name, ty) = row?;
            schema.insert(name, ty);
        }
        Ok(schema)
    }

    /// Total number of stored data rows.
    pub fn record_count(&self) -> Result<i64> {
        let conn = self.connect()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM data_records", [], |r| r.get(0))?)
    }

    /// Ingest every CSV file waiting in `data-in/`, then archive it.
    ///
    /// Per-file failures are collected, not fatal: one malformed file
    /// must not block the rest of the inbox.
    pub fn ingest_new_files(&self, dirs: &DashboardDirs) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        let mut entries: Vec<PathBuf> = fs::read_dir(&dirs.data_in)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        entries.sort();

        for path in entries {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.ingest_csv(&path) {
                Ok((imported, skipped)) => {
                    let archived = archive_file(&path, &dirs.archive)?;
                    tracing::info!(
                        file = %file_name,
                        imported,
                        skipped,
                        "ingested data file"
                    );
                    report.processed.push(ProcessedFile {
                        file: file_name,
                        imported,
                        skipped,
                        archived,
                    });
                }
                Err(e) => {
                    tracing::error!(file = %file_name, error = %e, "ingestion failed");
                    report.errors.push(IngestError {
                        file: file_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Ingest one CSV file. Returns (imported, skipped-as-duplicate).
    fn ingest_csv(&self, path: &Path) -> Result<(usize, usize)> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| Error::Ingest {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| Error::Ingest {
                file: path.display().to_string(),
                message: e.to_string(),
            })?
            .iter()
            .map(normalize_column_name)
            .collect();

        let mut rows: Vec<BTreeMap<String, serde_json::Value>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::Ingest {
                file: path.display().to_string(),
                message: e.to_string(),
            })?;
            let mut row = BTreeMap::new();
            for (column, cell) in columns.iter().zip(record.iter()) {
                row.insert(column.clone(), parse_cell(cell));
            }
            rows.push(row);
        }

        let mut conn = self.connect()?;
        self.evolve_schema(&conn, &columns, &rows)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO data_files (filename, imported_at, row_count) VALUES (?1, ?2, ?3)",
            params![
                path.file_name().map(|n| n.to_string_lossy().into_owned()),
                chrono::Utc::now().to_rfc3339(),
                rows.len() as i64
            ],
        )?;
        let file_id = tx.last_insert_rowid();

        let mut imported = 0usize;
        let mut skipped = 0usize;
        for row in &rows {
            let data_json = serde_json::to_string(row)?;
            let row_hash = hash_row(&data_json);
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO data_records (file_id, row_hash, data_json)
                 VALUES (?1, ?2, ?3)",
                params![file_id, row_hash, data_json],
            )?;
            if inserted == 1 {
                imported += 1;
            } else {
                skipped += 1;
            }
        }
        tx.commit()?;

        Ok((imported, skipped))
    }

    /// Add columns the store has not seen before, with inferred types.
    fn evolve_schema(
        &self,
        conn: &Connection,
        columns: &[String],
        rows: &[BTreeMap<String, serde_json::Value>],
    ) -> Result<()> {
        // Bookkeeping columns stay in the set: a CSV header named `id`
        // or `row_hash` is shadowed by them, never re-added. The row
        // data still lands in the JSON document.
        let existing: BTreeSet<String> = {
            let mut stmt = conn.prepare("PRAGMA table_info(data_records)")?;
            let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
            names.collect::<std::result::Result<_, _>>()?
        };

        for column in columns {
            if existing.contains(column) {
                continue;
            }
            let sql_type = infer_sql_type(column, rows);
            conn.execute(
                &format!(r#"ALTER TABLE data_records ADD COLUMN "{column}" {sql_type}"#),
                [],
            )?;
            tracing::info!(column = %column, sql_type, "schema evolution: added column");
        }

        Ok(())
    }
}

/// Lowercase, trimmed, spaces collapsed to underscores.
fn normalize_column_name(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_lowercase()
}

/// Type a CSV cell: integer, then float, else string. Empty → null.
fn parse_cell(cell: &str) -> serde_json::Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return serde_json::Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return serde_json::Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return serde_json::Value::from(f);
    }
    serde_json::Value::from(trimmed)
}

/// SQL type for a column, from the typed cells of this batch.
fn infer_sql_type(column: &str, rows: &[BTreeMap<String, serde_json::Value>]) -> &'static str {
    let mut saw_value = false;
    let mut all_int = true;
    let mut all_num = true;

    for row in rows {
        match row.get(column) {
            Some(serde_json::Value::Null) | None => {}
            Some(value) => {
                saw_value = true;
                if !value.is_i64() {
                    all_int = false;
                }
                if !value.is_number() {
                    all_num = false;
                }
            }
        }
    }

    if !saw_value {
        "TEXT"
    } else if all_int {
        "INTEGER"
    } else if all_num {
        "REAL"
    } else {
        "TEXT"
    }
}

fn hash_row(data_json: &str) -> String {
    let digest = Sha256::digest(data_json.as_bytes());
    format!("{digest:x}")
}

/// Move an ingested file into the archive, renaming on collision.
fn archive_file(path: &Path, archive_dir: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut target = archive_dir.join(path.file_name().unwrap_or_default());
    let mut counter = 1;
    while target.exists() {
        target = archive_dir.join(format!("{stem}_{counter}.{ext}"));
        counter += 1;
    }

    fs::rename(path, &target)?;
    Ok(target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}
