//! Dashboard directory management.
//!
//! Provides the on-disk layout shared by the engine and CLI:
//!
//! ```text
//! <root>/
//! ├── data-in/       # Drop CSV files here
//! ├── data-archive/  # Ingested files, moved out of data-in
//! ├── data/          # warden.db data store
//! ├── logs/          # execution_audit.jsonl
//! └── build/         # Scratch worker projects (transient)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory structure for one Warden dashboard root.
#[derive(Debug, Clone)]
pub struct DashboardDirs {
    /// Inbox for data files awaiting ingestion.
    pub data_in: PathBuf,

    /// Archive of already-ingested files.
    pub archive: PathBuf,

    /// Data store directory.
    pub data: PathBuf,

    /// Log directory (audit stream lives here).
    pub logs: PathBuf,

    /// Transient build directory for scratch worker projects.
    pub build: PathBuf,
}

impl DashboardDirs {
    /// Create the directory structure under `root`, creating any
    /// missing directories.
    pub fn from_root(root: &Path) -> Result<Self> {
        let dirs = Self {
            data_in: root.join("data-in"),
            archive: root.join("data-archive"),
            data: root.join("data"),
            logs: root.join("logs"),
            build: root.join("build"),
        };

        for dir in [
            &dirs.data_in,
            &dirs.archive,
            &dirs.data,
            &dirs.logs,
            &dirs.build,
        ] {
            fs::create_dir_all(dir)?;
        }

        Ok(dirs)
    }

    /// Path of the SQLite data store.
    pub fn db_path(&self) -> PathBuf {
        self.data.join("warden.db")
    }

    /// Path of the append-only audit stream.
    pub fn audit_path(&self) -> PathBuf {
        self.logs.join("execution_audit.jsonl")
    }

    /// Remove all scratch build artifacts and recreate the directory.
    pub fn clean_build(&self) -> Result<()> {
        if self.build.exists() {
            fs::remove_dir_all(&self.build)?;
        }
        fs::create_dir_all(&self.build)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_root_creates_layout() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = DashboardDirs::from_root(temp.path()).expect("dirs");

        assert!(dirs.data_in.exists());
        assert!(dirs.archive.exists());
        assert!(dirs.data.exists());
        assert!(dirs.logs.exists());
        assert!(dirs.build.exists());
        assert!(dirs.db_path().starts_with(temp.path()));
    }

    #[test]
    fn clean_build_recreates_empty_dir() {
        let temp = TempDir::new().expect("temp dir");
        let dirs = DashboardDirs::from_root(temp.path()).expect("dirs");

        let stale = dirs.build.join("stale.txt");
        fs::write(&stale, "x").expect("write");
        assert!(stale.exists());

        dirs.clean_build().expect("clean");
        assert!(!stale.exists());
        assert!(dirs.build.exists());
    }
}
