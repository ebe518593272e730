//! Report registry collaborator: named submissions, unique by name.

use std::path::PathBuf;

use rusqlite::{Connection, params};

use crate::error::Result;

/// A unit of externally authored report code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub source: String,
}

/// Registry of imported submissions, backed by the `reports` table of
/// the dashboard's SQLite store.
#[derive(Debug, Clone)]
pub struct ReportRegistry {
    path: PathBuf,
}

impl ReportRegistry {
    /// Attach to the store at `path`. The table is created by
    /// [`DataStore::open`](crate::store::DataStore::open).
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Save a submission. Returns `false` on name collision; the
    /// existing submission is left untouched.
    pub fn save(&self, name: &str, source: &str) -> Result<bool> {
        let conn = self.connect()?;
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO reports (name, code, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, source, now, now],
        )?;
        Ok(inserted == 1)
    }

    /// All submissions, ordered by name.
    pub fn list(&self) -> Result<Vec<Submission>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT name, code FROM reports ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Submission {
                name: row.get(0)?,
                source: row.get(1)?,
            })
        })?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    /// Fetch one submission by name.
    pub fn get(&self, name: &str) -> Result<Option<Submission>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT name, code FROM reports WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(Submission {
                name: row.get(0)?,
                source: row.get(1)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    }
}
