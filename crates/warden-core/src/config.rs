//! Engine configuration.
//!
//! All policy knobs live in one explicit object constructed at startup
//! and passed to each component; there is no module-level state. The
//! defaults mirror the shipped policy; deployments override them with a
//! JSON file.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration surface for the admission and execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Crate roots a submission may `use`.
    pub allowed_imports: BTreeSet<String>,

    /// Literal substrings that reject a submission outright.
    pub forbidden_patterns: Vec<String>,

    /// Wall-clock budget for one worker, in seconds.
    pub deadline_secs: u64,

    /// Maximum error length persisted to the audit log.
    pub max_error_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_imports: ["std", "core", "alloc", "rusqlite", "serde_json", "warden_report"]
                .into_iter()
                .map(String::from)
                .collect(),
            forbidden_patterns: [
                "std::fs",
                "std::net",
                "std::process",
                "std::thread",
                "std::env",
                "File::open",
                "Command::new",
                "TcpStream",
                "UdpSocket",
                "include!",
                "include_str!",
                "include_bytes!",
                "unsafe",
                "asm!",
                "build.rs",
                "ATTACH",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            deadline_secs: 45,
            max_error_len: 500,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults
    /// for absent fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Execution deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}
